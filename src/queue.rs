// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Serialized control-channel write queue.
//!
//! The transport permits exactly one in-flight write. The queue enforces
//! that by construction: a single worker task services submissions in FIFO
//! order, each chained strictly after the prior write's completion, success
//! or failure. A failed write is reported only to its own submitter and
//! never wedges the chain.
//!
//! After each write the worker pauses for the configured pacing interval.
//! On `shutdown` (disconnect) queued and future entries fail fast with
//! `NoSession` instead of hanging.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{HubError, Result};
use crate::protocol::codec::Command;
use crate::transport::HubLink;

struct QueuedWrite {
    frame: Vec<u8>,
    description: String,
    completion: oneshot::Sender<Result<()>>,
}

#[derive(Clone)]
pub(crate) struct OperationQueue {
    tx: mpsc::UnboundedSender<QueuedWrite>,
    closed: Arc<AtomicBool>,
}

impl OperationQueue {
    /// Spawn the worker task for one session.
    pub(crate) fn start(link: Arc<dyn HubLink>, pacing: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedWrite>();
        let closed = Arc::new(AtomicBool::new(false));
        let worker_closed = closed.clone();
        tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                if worker_closed.load(Ordering::SeqCst) {
                    let _ = op.completion.send(Err(HubError::NoSession));
                    continue;
                }
                debug!(op = %op.description, len = op.frame.len(), "control write");
                let result = link
                    .write_control(&op.frame)
                    .await
                    .map_err(|e| HubError::WriteFailed(format!("{}: {e}", op.description)));
                if let Err(err) = &result {
                    warn!(op = %op.description, %err, "control write failed");
                }
                let _ = op.completion.send(result);
                tokio::time::sleep(pacing).await;
            }
        });
        Self { tx, closed }
    }

    /// Submit one command. Resolves after its write completes, in strict
    /// submission order relative to every other submission on this queue.
    pub(crate) async fn submit(&self, command: Command, description: impl Into<String>) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HubError::NoSession);
        }
        let (done_tx, done_rx) = oneshot::channel();
        let op = QueuedWrite {
            frame: command.encode(),
            description: description.into(),
            completion: done_tx,
        };
        self.tx.send(op).map_err(|_| HubError::NoSession)?;
        done_rx.await.map_err(|_| HubError::NoSession)?
    }

    /// Fail all queued entries and reject future submissions. Called on
    /// disconnect so nothing hangs against a dead link.
    pub(crate) fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
