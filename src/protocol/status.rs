// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Hub status model.
//!
//! A status report carries a `u32` bitset plus, on newer protocol revisions,
//! a running-program id and a selected slot. Older firmware omits the
//! trailing bytes; the decoder represents those fields as
//! [`RevisionDependent::Omitted`] rather than erroring, so callers cannot
//! mistake "never sent" for a real value.

use serde::{Deserialize, Serialize};

use crate::error::{HubError, Result};

bitflags::bitflags! {
    /// Raw hub status bitset. Unknown bits are retained so reports from
    /// newer firmware survive a decode/inspect round on older hosts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusFlags: u32 {
        const BATTERY_LOW_WARNING = 1 << 0;
        const BATTERY_CRITICAL    = 1 << 1;
        const HIGH_CURRENT        = 1 << 2;
        const ADVERTISING         = 1 << 3;
        const LOW_SIGNAL          = 1 << 4;
        const BUTTON_PRESSED      = 1 << 5;
        const PROGRAM_RUNNING     = 1 << 6;
        const SHUTDOWN            = 1 << 7;
    }
}

/// A field that newer hub firmware reports and older firmware omits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RevisionDependent<T> {
    /// The connected hub predates the protocol revision that added this field.
    #[default]
    Omitted,
    /// The hub reported a value.
    Reported(T),
}

impl<T> RevisionDependent<T> {
    pub fn reported(&self) -> Option<&T> {
        match self {
            RevisionDependent::Omitted => None,
            RevisionDependent::Reported(value) => Some(value),
        }
    }

    pub fn into_reported(self) -> Option<T> {
        match self {
            RevisionDependent::Omitted => None,
            RevisionDependent::Reported(value) => Some(value),
        }
    }

    pub fn is_reported(&self) -> bool {
        matches!(self, RevisionDependent::Reported(_))
    }
}

impl<T> From<Option<T>> for RevisionDependent<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            None => RevisionDependent::Omitted,
            Some(value) => RevisionDependent::Reported(value),
        }
    }
}

/// Decoded hub state from one status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStatus {
    pub flags: StatusFlags,
    pub running_program_id: RevisionDependent<u8>,
    pub selected_slot: RevisionDependent<u8>,
}

impl HubStatus {
    /// Parse the payload of a status report (the bytes after the event type
    /// byte). Needs at least the 4-byte flags word; trailing fields are
    /// optional.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < 4 {
            return Err(HubError::MalformedFrame(format!(
                "status report needs at least 4 payload bytes, got {}",
                payload.len()
            )));
        }
        let flags = StatusFlags::from_bits_retain(u32::from_le_bytes([
            payload[0], payload[1], payload[2], payload[3],
        ]));
        Ok(Self {
            flags,
            running_program_id: payload.get(4).copied().into(),
            selected_slot: payload.get(5).copied().into(),
        })
    }

    pub fn battery_low_warning(&self) -> bool {
        self.flags.contains(StatusFlags::BATTERY_LOW_WARNING)
    }

    pub fn battery_critical(&self) -> bool {
        self.flags.contains(StatusFlags::BATTERY_CRITICAL)
    }

    pub fn high_current(&self) -> bool {
        self.flags.contains(StatusFlags::HIGH_CURRENT)
    }

    pub fn advertising(&self) -> bool {
        self.flags.contains(StatusFlags::ADVERTISING)
    }

    pub fn low_signal(&self) -> bool {
        self.flags.contains(StatusFlags::LOW_SIGNAL)
    }

    pub fn button_pressed(&self) -> bool {
        self.flags.contains(StatusFlags::BUTTON_PRESSED)
    }

    /// The sole authoritative signal that a stop took effect.
    pub fn program_running(&self) -> bool {
        self.flags.contains(StatusFlags::PROGRAM_RUNNING)
    }

    pub fn shutdown(&self) -> bool {
        self.flags.contains(StatusFlags::SHUTDOWN)
    }

    /// Check this status against a caller-supplied predicate.
    pub fn matches<F>(&self, predicate: F) -> bool
    where
        F: Fn(&HubStatus) -> bool,
    {
        predicate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_running_bit_decodes_alone() {
        let status = HubStatus::parse(&0b0100_0000u32.to_le_bytes()).unwrap();
        assert!(status.program_running());
        assert!(!status.battery_low_warning());
        assert!(!status.battery_critical());
        assert!(!status.high_current());
        assert!(!status.advertising());
        assert!(!status.low_signal());
        assert!(!status.button_pressed());
        assert!(!status.shutdown());
    }

    #[test]
    fn test_multiple_flags() {
        let status = HubStatus::parse(&0b1000_0011u32.to_le_bytes()).unwrap();
        assert!(status.battery_low_warning());
        assert!(status.battery_critical());
        assert!(status.shutdown());
        assert!(!status.program_running());
    }

    #[test]
    fn test_short_report_omits_trailing_fields() {
        let status = HubStatus::parse(&[0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(status.running_program_id, RevisionDependent::Omitted);
        assert_eq!(status.selected_slot, RevisionDependent::Omitted);
    }

    #[test]
    fn test_newer_report_carries_trailing_fields() {
        let status = HubStatus::parse(&[0x40, 0x00, 0x00, 0x00, 0x05, 0x01]).unwrap();
        assert_eq!(status.running_program_id, RevisionDependent::Reported(5));
        assert_eq!(status.selected_slot, RevisionDependent::Reported(1));
    }

    #[test]
    fn test_truncated_flags_word_is_rejected() {
        assert!(HubStatus::parse(&[0x40, 0x00]).is_err());
    }

    #[test]
    fn test_matches_predicate() {
        let status = HubStatus::parse(&0b0100_0000u32.to_le_bytes()).unwrap();
        assert!(status.matches(|s| s.program_running()));
        assert!(!status.matches(|s| s.button_pressed()));
    }
}
