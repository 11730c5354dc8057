// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Session timing policy.
//!
//! All delays and timeouts used by the connection manager, the operation
//! queue, and the upload pipeline come from this config rather than being
//! hardcoded at call sites, so tests and embedders can tighten or relax them.

use std::time::Duration;

/// Timing knobs for one hub session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause inserted after every control-channel write. Hub firmware drops
    /// writes that arrive back-to-back; this is a throughput/robustness
    /// tradeoff, not a correctness requirement.
    pub write_pacing: Duration,

    /// Settle time between link establishment and service discovery. Some
    /// hub firmware rejects discovery immediately after the link comes up.
    pub link_settle_delay: Duration,

    /// How long the upload pipeline waits for a status report confirming a
    /// stop took effect.
    pub stop_confirm_timeout: Duration,

    /// Unconditional delay used when stop confirmation times out. Some
    /// firmware does not emit a status report on every stop.
    pub stop_fallback_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            write_pacing: Duration::from_millis(50),
            link_settle_delay: Duration::from_millis(150),
            stop_confirm_timeout: Duration::from_millis(2000),
            stop_fallback_delay: Duration::from_millis(300),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_write_pacing(mut self, pacing: Duration) -> Self {
        self.write_pacing = pacing;
        self
    }

    pub fn with_link_settle_delay(mut self, delay: Duration) -> Self {
        self.link_settle_delay = delay;
        self
    }

    pub fn with_stop_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.stop_confirm_timeout = timeout;
        self
    }

    pub fn with_stop_fallback_delay(mut self, delay: Duration) -> Self {
        self.stop_fallback_delay = delay;
        self
    }
}
