// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport seam between the protocol core and a concrete BLE stack.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Protocol core (queue, pipeline, session)     │
//! └─────────────────┬────────────────────────────┘
//!                   │ uses
//! ┌─────────────────▼────────────────────────────┐
//! │ HubTransport / HubLink traits (THIS FILE)    │
//! │ - select_device() / open_link()              │
//! │ - write_control() / subscribe() / read caps  │
//! └─────────────────┬────────────────────────────┘
//!                   │ implements
//! ┌─────────────────▼────────────────────────────┐
//! │ Adapter                                      │
//! │ - platform BLE stack binding                 │
//! │ - MockTransport (tests)                      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The core depends only on these traits, so tests (and embedders without a
//! radio) can drive everything with the in-memory [`mock`] implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

pub mod mock;

/// Stream of link events handed out by [`HubLink::subscribe`].
pub type NotificationReceiver = mpsc::UnboundedReceiver<LinkEvent>;

/// Errors at the transport seam. One variant per distinct connection-phase
/// failure, so the connection manager never collapses them into a generic
/// message.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("bluetooth stack not present on this host")]
    NotSupported,

    #[error("bluetooth adapter powered off or disabled")]
    PoweredOff,

    #[error("device selection cancelled")]
    SelectionCancelled,

    #[error("link establishment failed: {0}")]
    LinkFailed(String),

    #[error("hub service not found on '{device}'")]
    ServiceNotFound { device: String },

    #[error("notification subscription refused: {0}")]
    SubscribeRefused(String),

    #[error("link is not connected")]
    NotConnected,

    #[error("transport i/o failed: {0}")]
    Io(String),
}

/// Events pushed from a link to its subscriber.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// A notification frame from the control/event characteristic, exactly as
    /// received (type byte first).
    Notification(Vec<u8>),
    /// The underlying link dropped. Terminal for the session.
    Disconnected,
}

/// A device offered by the transport during user selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Transport-specific identifier (address or platform handle id).
    pub id: String,
    /// Advertised name, as shown in the picker and in error messages.
    pub name: String,
}

/// Host-side transport stack: discovery and link establishment.
#[async_trait]
pub trait HubTransport: Send + Sync {
    /// Whether this host exposes the transport API at all.
    fn is_supported(&self) -> bool;

    /// Whether the transport is powered on and ready to scan.
    async fn is_available(&self) -> bool;

    /// Ask the user to pick a hub. Unbounded: resolves only when the user
    /// picks or dismisses the chooser (`SelectionCancelled`).
    async fn select_device(&self) -> Result<DeviceInfo, TransportError>;

    /// Establish a link to the selected device.
    async fn open_link(&self, device: &DeviceInfo) -> Result<Arc<dyn HubLink>, TransportError>;
}

/// An established link to one hub.
///
/// All methods take `&self`; adapters use interior mutability where needed.
/// `close` is idempotent.
#[async_trait]
pub trait HubLink: Send + Sync {
    /// Resolve the hub service and its control/capabilities characteristics.
    /// `ServiceNotFound` means the peripheral is not a compatible hub.
    async fn resolve_service(&self) -> Result<(), TransportError>;

    /// Write one command frame to the control characteristic. The caller (the
    /// operation queue) guarantees at most one write is in flight.
    async fn write_control(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Subscribe to control-characteristic notifications. At most one
    /// subscription per link; resubscribing replaces the previous receiver.
    async fn subscribe(&self) -> Result<NotificationReceiver, TransportError>;

    /// Read the capabilities characteristic. `Ok(None)` when the hub does not
    /// expose it.
    async fn read_capabilities(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Tear the link down. Idempotent; never fails.
    async fn close(&self);
}
