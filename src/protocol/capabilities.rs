// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Capability snapshot.
//!
//! Read once from the capabilities characteristic right after connecting and
//! immutable for the life of the session. Drives the upload chunk size and
//! the oversize check. Hubs without the characteristic (or with a short
//! payload) leave every field omitted and the chunker falls back to a
//! conservative size.

use serde::{Deserialize, Serialize};

use crate::protocol::codec::WRITE_RAM_HEADER_LEN;
use crate::protocol::status::RevisionDependent;

/// Chunk size used when the hub does not report a max write size.
pub const FALLBACK_CHUNK_SIZE: usize = 100;

/// Upper bound on the chunk size regardless of what the hub reports.
pub const MAX_CHUNK_SIZE: usize = 512;

/// Hub limits as reported by the capabilities characteristic.
///
/// Layout (little-endian, when at least 10 bytes are available): bytes 0-1
/// max write size, 2-5 capability flags, 6-9 max user program size, and an
/// optional byte 10 with the program slot count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubCapabilities {
    pub max_write_size: RevisionDependent<u16>,
    pub flags: RevisionDependent<u32>,
    pub max_user_program_size: RevisionDependent<u32>,
    pub num_slots: RevisionDependent<u8>,
}

impl Default for HubCapabilities {
    fn default() -> Self {
        Self::unknown()
    }
}

impl HubCapabilities {
    /// Snapshot for hubs that expose no capabilities characteristic.
    pub fn unknown() -> Self {
        Self {
            max_write_size: RevisionDependent::Omitted,
            flags: RevisionDependent::Omitted,
            max_user_program_size: RevisionDependent::Omitted,
            num_slots: RevisionDependent::Omitted,
        }
    }

    /// Parse the characteristic value. Payloads shorter than 10 bytes carry
    /// no usable fields and yield an unknown snapshot.
    pub fn parse(bytes: &[u8]) -> Self {
        if bytes.len() < 10 {
            return Self::unknown();
        }
        Self {
            max_write_size: RevisionDependent::Reported(u16::from_le_bytes([bytes[0], bytes[1]])),
            flags: RevisionDependent::Reported(u32::from_le_bytes([
                bytes[2], bytes[3], bytes[4], bytes[5],
            ])),
            max_user_program_size: RevisionDependent::Reported(u32::from_le_bytes([
                bytes[6], bytes[7], bytes[8], bytes[9],
            ])),
            num_slots: bytes.get(10).copied().into(),
        }
    }

    /// Upload chunk size: `min(512, max(1, max_write_size - 5))`, where 5 is
    /// the WriteRam frame header, falling back to a conservative constant
    /// when the hub never reported its limit.
    pub fn chunk_size(&self) -> usize {
        match self.max_write_size {
            RevisionDependent::Reported(max_write) => (max_write as usize)
                .saturating_sub(WRITE_RAM_HEADER_LEN)
                .clamp(1, MAX_CHUNK_SIZE),
            RevisionDependent::Omitted => FALLBACK_CHUNK_SIZE,
        }
    }
}
