// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The live hub session and its facade.
//!
//! `HubSession` is the only object surrounding code touches after
//! [`connect`](crate::connect): upload a program, start/stop it, feed stdin,
//! observe status and output. It is an owned value (no global "current hub");
//! clones share the same underlying session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::error::{HubError, Result};
use crate::events::{EventBus, HubEvent};
use crate::protocol::capabilities::HubCapabilities;
use crate::protocol::codec::Command;
use crate::protocol::status::{HubStatus, RevisionDependent};
use crate::queue::OperationQueue;
use crate::transport::{DeviceInfo, HubLink};
use crate::upload;

/// Shared state behind a session handle. Only the connection layer mutates
/// the connected flag; everything else reads it or submits through the queue.
pub(crate) struct SessionCore {
    pub(crate) device: DeviceInfo,
    pub(crate) link: Arc<dyn HubLink>,
    pub(crate) queue: OperationQueue,
    pub(crate) bus: EventBus,
    pub(crate) capabilities: HubCapabilities,
    pub(crate) config: SessionConfig,
    pub(crate) connected: AtomicBool,
}

impl SessionCore {
    /// Invalidate the session: fail queued/future writes fast, clear the
    /// cached status, tell subscribers. Idempotent.
    pub(crate) fn invalidate(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        info!(device = %self.device.name, "hub session invalidated");
        self.queue.shutdown();
        self.bus.publish_disconnected();
    }
}

/// Handle to a connected hub.
#[derive(Clone)]
pub struct HubSession {
    pub(crate) core: Arc<SessionCore>,
}

impl std::fmt::Debug for HubSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubSession")
            .field("device", &self.core.device.name)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl HubSession {
    pub(crate) fn new(
        device: DeviceInfo,
        link: Arc<dyn HubLink>,
        capabilities: HubCapabilities,
        config: SessionConfig,
    ) -> Self {
        let queue = OperationQueue::start(link.clone(), config.write_pacing);
        Self {
            core: Arc::new(SessionCore {
                device,
                link,
                queue,
                bus: EventBus::new(),
                capabilities,
                config,
                connected: AtomicBool::new(true),
            }),
        }
    }

    /// Advertised name of the connected hub.
    pub fn device_name(&self) -> &str {
        &self.core.device.name
    }

    /// Capability snapshot read at connect time. Immutable for the session.
    pub fn capabilities(&self) -> &HubCapabilities {
        &self.core.capabilities
    }

    pub fn is_connected(&self) -> bool {
        self.core.connected.load(Ordering::SeqCst)
    }

    /// Last known status, if any report has arrived.
    pub fn status(&self) -> Option<HubStatus> {
        self.core.bus.last_status()
    }

    /// Subscribe to status/output/disconnect events.
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.core.bus.subscribe()
    }

    /// Resolve `true` once a status satisfying `predicate` is known, `false`
    /// on timeout (a soft signal, not an error).
    pub async fn wait_for_status<F>(&self, predicate: F, timeout: Duration) -> bool
    where
        F: Fn(&HubStatus) -> bool,
    {
        self.core.bus.wait_for(predicate, timeout).await
    }

    /// Transfer a compiled program into the hub's download region.
    ///
    /// Runs the full pipeline: stop any running program, invalidate the
    /// stored one, write the bytes in contiguous chunks, finalize with the
    /// total size. Errors abort the remaining upload but leave the session
    /// connected, so the caller may retry.
    pub async fn upload_program(&self, program: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        upload::run(&self.core, program).await
    }

    /// Start the program stored in `slot`.
    ///
    /// Firmware revisions disagree on the start-command shape: the versioned
    /// multi-byte form is tried first, and if that specific write fails the
    /// legacy one-byte form is retried once before surfacing an error.
    pub async fn start_program(&self, slot: u8) -> Result<()> {
        self.ensure_connected()?;
        if let RevisionDependent::Reported(slots) = self.core.capabilities.num_slots {
            if slot >= slots {
                warn!(slot, slots, "slot index beyond the hub's reported slot count");
            }
        }
        let versioned = Command::Start { slot };
        let description = versioned.describe();
        match self.core.queue.submit(versioned, description).await {
            Ok(()) => Ok(()),
            Err(HubError::WriteFailed(err)) => {
                warn!(%err, "versioned start rejected; retrying with legacy start");
                let legacy = Command::StartLegacy;
                let description = legacy.describe();
                self.core.queue.submit(legacy, description).await
            }
            Err(other) => Err(other),
        }
    }

    /// Stop the running program.
    pub async fn stop_program(&self) -> Result<()> {
        self.ensure_connected()?;
        self.core.queue.submit(Command::Stop, "stop").await
    }

    /// Feed text to the running program's stdin.
    pub async fn send_input(&self, text: &str) -> Result<()> {
        self.ensure_connected()?;
        let command = Command::WriteStdin {
            payload: text.as_bytes().to_vec(),
        };
        let description = command.describe();
        self.core.queue.submit(command, description).await
    }

    /// Tear the session down. Idempotent: disconnecting an already-dead
    /// session is a no-op.
    pub async fn disconnect(&self) {
        self.core.invalidate();
        self.core.link.close().await;
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(HubError::NoSession)
        }
    }
}
