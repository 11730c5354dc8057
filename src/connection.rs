// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connection establishment and teardown.
//!
//! `connect` walks the transport through discovery, link establishment,
//! service resolution, notification subscription, and the capability read,
//! surfacing a distinct error for each step. Partial failures clean up the
//! link before returning; a refused notification subscription degrades the
//! session instead of aborting it.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::{HubError, Result};
use crate::protocol::capabilities::HubCapabilities;
use crate::protocol::codec::Event;
use crate::session::{HubSession, SessionCore};
use crate::transport::{HubTransport, LinkEvent, NotificationReceiver, TransportError};

/// Connect to a hub and return the session handle.
pub async fn connect(transport: &dyn HubTransport, config: SessionConfig) -> Result<HubSession> {
    if !transport.is_supported() {
        return Err(HubError::Unsupported);
    }
    if !transport.is_available().await {
        return Err(HubError::Unavailable);
    }

    let device = match transport.select_device().await {
        Ok(device) => device,
        Err(TransportError::SelectionCancelled) => {
            // The user changed their mind. Not a failure worth logging loudly.
            debug!("device selection cancelled");
            return Err(HubError::Cancelled);
        }
        Err(err) => return Err(err.into()),
    };
    info!(device = %device.name, "connecting to hub");

    let link = transport
        .open_link(&device)
        .await
        .map_err(|err| HubError::Link(err.to_string()))?;

    // Some hub firmware rejects service discovery right after the link comes
    // up; give it a moment.
    tokio::time::sleep(config.link_settle_delay).await;

    if let Err(err) = link.resolve_service().await {
        link.close().await;
        return Err(err.into());
    }

    let notifications = match link.subscribe().await {
        Ok(rx) => Some(rx),
        Err(err) => {
            warn!(
                device = %device.name,
                error = %err,
                "notifications unavailable; session continues without status or output visibility"
            );
            None
        }
    };

    let capabilities = match link.read_capabilities().await {
        Ok(Some(bytes)) => HubCapabilities::parse(&bytes),
        Ok(None) => {
            debug!("hub exposes no capabilities characteristic");
            HubCapabilities::unknown()
        }
        Err(err) => {
            warn!(error = %err, "capability read failed; using conservative defaults");
            HubCapabilities::unknown()
        }
    };
    info!(
        device = %device.name,
        chunk_size = capabilities.chunk_size(),
        "hub session established"
    );

    let session = HubSession::new(device, link, capabilities, config);
    if let Some(rx) = notifications {
        spawn_notification_pump(session.core.clone(), rx);
    }
    Ok(session)
}

/// Decode inbound notifications onto the session bus and invalidate the
/// session when the link drops. This is the disconnect handler: it clears
/// the cached status, resets the queue, and broadcasts `Disconnected`.
fn spawn_notification_pump(core: Arc<SessionCore>, mut rx: NotificationReceiver) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                LinkEvent::Notification(frame) => match Event::decode(&frame) {
                    Ok(Event::Status(status)) => {
                        trace!(?status, "status report");
                        core.bus.publish_status(status);
                    }
                    Ok(Event::Stdout(bytes)) => core.bus.publish_stdout(bytes),
                    Ok(Event::AppData(_)) => {
                        // Application-defined; not ours to interpret and
                        // never surfaced as program output.
                    }
                    Ok(Event::Unknown { event_type }) => {
                        trace!(event_type, "ignoring unknown event type");
                    }
                    Err(err) => warn!(%err, "dropping malformed notification"),
                },
                LinkEvent::Disconnected => break,
            }
        }
        // Either the hub reported a disconnect or the link dropped its
        // sender; both mean this session is over.
        core.invalidate();
    });
}
