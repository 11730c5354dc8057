// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command and event frame codec.
//!
//! Commands are written to the hub's control characteristic; events arrive as
//! notifications on the same characteristic. All multi-byte integers are
//! little-endian.
//!
//! ## Command frames
//!
//! | Command | Bytes |
//! |---------|-------|
//! | Stop | `[0x00]` |
//! | Start (versioned) | `[0x01, slot]` |
//! | Start (legacy) | `[0x01]` |
//! | WriteProgramMeta | `[0x03, size:u32]` |
//! | WriteRam | `[0x04, offset:u32, payload...]` |
//! | WriteStdin | `[0x06, payload...]` |
//!
//! ## Event frames
//!
//! | Type byte | Event | Payload |
//! |-----------|-------|---------|
//! | 0x00 | StatusReport | `flags:u32`, optional program id, optional slot |
//! | 0x01 | Stdout | UTF-8 bytes |
//! | 0x02 | AppData | application-defined, ignored here |
//!
//! Encoding never fails (fields are pre-validated by callers). Decoding fails
//! only when a frame is shorter than the minimum for its leading type byte;
//! unknown type bytes decode to [`Event::Unknown`] so future hub firmware can
//! add event types without breaking older hosts.

use crate::error::{HubError, Result};
use crate::protocol::status::HubStatus;

/// Byte count of the WriteRam frame header (type byte + u32 offset).
pub const WRITE_RAM_HEADER_LEN: usize = 5;

/// Command type bytes on the control characteristic.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandId {
    Stop = 0x00,
    Start = 0x01,
    WriteProgramMeta = 0x03,
    WriteRam = 0x04,
    WriteStdin = 0x06,
}

/// Event type bytes on inbound notifications.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventId {
    Status = 0x00,
    Stdout = 0x01,
    AppData = 0x02,
}

impl TryFrom<u8> for EventId {
    type Error = ();

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0x00 => Ok(EventId::Status),
            0x01 => Ok(EventId::Stdout),
            0x02 => Ok(EventId::AppData),
            _ => Err(()),
        }
    }
}

/// A command to the hub. Immutable value object; exists only while being
/// encoded and queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stop the running user program.
    Stop,
    /// Start the program stored in `slot` (newer firmware).
    Start { slot: u8 },
    /// One-byte start retained for firmware that predates slots.
    StartLegacy,
    /// Declare the stored program's size. Size 0 invalidates the slot before
    /// an upload; the final non-zero size makes the upload runnable.
    WriteProgramMeta { size: u32 },
    /// Write one chunk of program bytes at `offset` in the download region.
    WriteRam { offset: u32, payload: Vec<u8> },
    /// Feed bytes to the running program's stdin.
    WriteStdin { payload: Vec<u8> },
}

impl Command {
    /// Serialize to the wire frame. Infallible.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::Stop => vec![CommandId::Stop as u8],
            Command::Start { slot } => vec![CommandId::Start as u8, *slot],
            Command::StartLegacy => vec![CommandId::Start as u8],
            Command::WriteProgramMeta { size } => {
                let mut frame = Vec::with_capacity(5);
                frame.push(CommandId::WriteProgramMeta as u8);
                frame.extend_from_slice(&size.to_le_bytes());
                frame
            }
            Command::WriteRam { offset, payload } => {
                let mut frame = Vec::with_capacity(WRITE_RAM_HEADER_LEN + payload.len());
                frame.push(CommandId::WriteRam as u8);
                frame.extend_from_slice(&offset.to_le_bytes());
                frame.extend_from_slice(payload);
                frame
            }
            Command::WriteStdin { payload } => {
                let mut frame = Vec::with_capacity(1 + payload.len());
                frame.push(CommandId::WriteStdin as u8);
                frame.extend_from_slice(payload);
                frame
            }
        }
    }

    /// Human-readable label used in queue diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Command::Stop => "stop".to_string(),
            Command::Start { slot } => format!("start slot {slot}"),
            Command::StartLegacy => "start (legacy)".to_string(),
            Command::WriteProgramMeta { size } => format!("program meta size={size}"),
            Command::WriteRam { offset, payload } => {
                format!("ram write offset={offset} len={}", payload.len())
            }
            Command::WriteStdin { payload } => format!("stdin {} bytes", payload.len()),
        }
    }
}

/// A decoded hub notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Periodic/event-driven hub state report.
    Status(HubStatus),
    /// Output bytes from the running program.
    Stdout(Vec<u8>),
    /// Application-defined payload. Not interpreted by this layer; kept
    /// distinct so it is never misclassified as program output.
    AppData(Vec<u8>),
    /// Unrecognized event type byte. Subscribers ignore these silently.
    Unknown { event_type: u8 },
}

impl Event {
    /// Decode one notification frame.
    pub fn decode(frame: &[u8]) -> Result<Event> {
        let (&event_type, payload) = frame
            .split_first()
            .ok_or_else(|| HubError::MalformedFrame("empty notification".to_string()))?;
        match EventId::try_from(event_type) {
            Ok(EventId::Status) => Ok(Event::Status(HubStatus::parse(payload)?)),
            Ok(EventId::Stdout) => Ok(Event::Stdout(payload.to_vec())),
            Ok(EventId::AppData) => Ok(Event::AppData(payload.to_vec())),
            Err(()) => Ok(Event::Unknown { event_type }),
        }
    }
}
