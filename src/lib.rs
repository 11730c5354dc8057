// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Host-side client library for controlling small robotics hubs over BLE.
//!
//! The crate covers the hub communication protocol layer: command framing,
//! asynchronous event decoding, the chunked program-upload state machine,
//! and the write serialization that keeps concurrent callers safe on a
//! transport that permits one in-flight operation at a time.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ HubSession (facade)                                 │
//! │   upload_program / start / stop / send_input        │
//! └──────┬──────────────────────────────────▲───────────┘
//!        │ commands                         │ status, stdout
//! ┌──────▼───────────┐             ┌────────┴───────────┐
//! │ Upload pipeline  │             │ Event bus          │
//! │ Operation queue  │             │ (cache + fan-out)  │
//! └──────┬───────────┘             └────────▲───────────┘
//!        │ frames                           │ frames
//! ┌──────▼───────────────────────────────────────────────┐
//! │ Frame codec (pure)                                   │
//! └──────┬───────────────────────────────────▲───────────┘
//!        │ write_control                     │ notifications
//! ┌──────▼───────────────────────────────────┴───────────┐
//! │ HubTransport / HubLink (adapter or mock)             │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Control flows downward only; telemetry flows upward only. The connection
//! manager ([`connect`]) owns session setup/teardown and is the only code
//! that mutates session state.
//!
//! ## Example
//!
//! ```no_run
//! use hublink::transport::mock::MockTransport;
//! use hublink::SessionConfig;
//!
//! # async fn demo() -> hublink::Result<()> {
//! let transport = MockTransport::new();
//! let session = hublink::connect(&transport, SessionConfig::default()).await?;
//! session.upload_program(&[0x4d, 0x50, 0x01, 0x00]).await?;
//! session.start_program(0).await?;
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod protocol;
pub mod transport;

mod connection;
mod queue;
mod session;
mod upload;

pub use config::SessionConfig;
pub use connection::connect;
pub use error::{HubError, Result};
pub use events::HubEvent;
pub use protocol::capabilities::HubCapabilities;
pub use protocol::codec::{Command, Event};
pub use protocol::status::{HubStatus, RevisionDependent, StatusFlags};
pub use session::HubSession;
pub use transport::{DeviceInfo, HubLink, HubTransport, LinkEvent, TransportError};
