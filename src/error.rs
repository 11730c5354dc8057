// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for hub sessions.

use crate::transport::TransportError;

/// Result type alias using HubError
pub type Result<T> = std::result::Result<T, HubError>;

/// Errors surfaced by the hub protocol layer.
///
/// Connection-phase variants (`Unsupported` through `NotificationUnavailable`)
/// are terminal for that `connect()` call. Operation-phase variants
/// (`ProgramTooLarge`, `WriteFailed`, `NoSession`) abort the failing operation
/// but leave an established session connected, except `NoSession` which means
/// there is no session left to operate on.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The host does not expose the wireless transport API at all.
    #[error("bluetooth is not supported on this host")]
    Unsupported,

    /// The transport exists but is powered off or disabled.
    #[error("bluetooth is unavailable (adapter powered off or disabled)")]
    Unavailable,

    /// The user declined device selection. Quiet outcome, not a failure.
    #[error("device selection was cancelled")]
    Cancelled,

    /// Link establishment failed after a device was selected.
    #[error("failed to establish link: {0}")]
    Link(String),

    /// The selected peripheral does not expose the hub service.
    #[error("'{device}' does not expose the hub service - it does not look like a compatible hub")]
    IncompatibleDevice { device: String },

    /// The hub refused the notification subscription. The session degrades to
    /// upload/start/stop without status or output visibility.
    #[error("hub refused the notification subscription: {0}")]
    NotificationUnavailable(String),

    /// Program exceeds the hub's reported limit. Raised before any write.
    #[error("program too large: {size} bytes exceeds the hub limit of {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    /// One queued command failed to write. Only that command's caller sees
    /// this; the queue keeps servicing later entries.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// An operation was attempted without an active session.
    #[error("no active hub session")]
    NoSession,

    /// An inbound notification was shorter than its type's minimum length.
    #[error("malformed event frame: {0}")]
    MalformedFrame(String),
}

impl HubError {
    /// Check if the error is worth retrying on the same session (for callers
    /// that re-attempt uploads or starts).
    pub fn is_retryable(&self) -> bool {
        matches!(self, HubError::WriteFailed(_) | HubError::Unavailable)
    }
}

impl From<TransportError> for HubError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NotSupported => HubError::Unsupported,
            TransportError::PoweredOff => HubError::Unavailable,
            TransportError::SelectionCancelled => HubError::Cancelled,
            TransportError::LinkFailed(msg) => HubError::Link(msg),
            TransportError::ServiceNotFound { device } => HubError::IncompatibleDevice { device },
            TransportError::SubscribeRefused(msg) => HubError::NotificationUnavailable(msg),
            TransportError::NotConnected => HubError::NoSession,
            TransportError::Io(msg) => HubError::WriteFailed(msg),
        }
    }
}
