// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Session event bus.
//!
//! Telemetry flows one way: transport → codec → here → subscribers. The bus
//! caches the last known status in a watch channel (so a report that arrived
//! before anyone was waiting still counts) and fans events out to
//! subscribers over a broadcast channel whose lifecycle is tied to the
//! session.

use std::time::Duration;

use tokio::sync::{broadcast, watch};

use crate::protocol::status::HubStatus;

/// Events a session broadcasts to its subscribers.
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// A decoded status report.
    Status(HubStatus),
    /// Output bytes from the running program. Declared UTF-8 by the hub but
    /// may split a multi-byte sequence across notifications, so the raw
    /// bytes are delivered and conversion is left to the edge.
    Stdout(Vec<u8>),
    /// The session was invalidated (link drop or explicit disconnect).
    Disconnected,
}

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub(crate) struct EventBus {
    status_tx: watch::Sender<Option<HubStatus>>,
    event_tx: broadcast::Sender<HubEvent>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        let (status_tx, _) = watch::channel(None);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { status_tx, event_tx }
    }

    pub(crate) fn publish_status(&self, status: HubStatus) {
        self.status_tx.send_replace(Some(status));
        let _ = self.event_tx.send(HubEvent::Status(status));
    }

    pub(crate) fn publish_stdout(&self, bytes: Vec<u8>) {
        let _ = self.event_tx.send(HubEvent::Stdout(bytes));
    }

    /// Clear the cached status and tell subscribers the session is gone.
    pub(crate) fn publish_disconnected(&self) {
        self.status_tx.send_replace(None);
        let _ = self.event_tx.send(HubEvent::Disconnected);
    }

    pub(crate) fn last_status(&self) -> Option<HubStatus> {
        *self.status_tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.event_tx.subscribe()
    }

    /// Resolve `true` as soon as a status satisfying `predicate` is known,
    /// `false` after `timeout`.
    ///
    /// The cached last-known status is checked first, so a report that
    /// arrived before this call still matches. A timeout is a soft signal
    /// ("unknown, proceed conservatively"), never an error.
    pub(crate) async fn wait_for<F>(&self, predicate: F, timeout: Duration) -> bool
    where
        F: Fn(&HubStatus) -> bool,
    {
        let mut rx = self.status_tx.subscribe();
        tokio::time::timeout(timeout, async move {
            loop {
                let satisfied = {
                    let current = rx.borrow_and_update();
                    current.as_ref().map(&predicate).unwrap_or(false)
                };
                if satisfied {
                    return;
                }
                if rx.changed().await.is_err() {
                    // Session torn down; no further reports will arrive.
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
        .is_ok()
    }
}
