// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Hub GATT service and characteristic UUIDs.
//!
//! The hub exposes one primary service with two characteristics:
//!
//! - **Control/Event** (write + notify): the host writes command frames and
//!   the hub emits status/output notifications on the same characteristic.
//! - **Capabilities** (read): a one-shot descriptor of hub limits. Older
//!   firmware omits it entirely.
//!
//! Transport adapters resolve these during connection; the protocol core
//! never touches UUIDs after that.

use uuid::Uuid;

/// Primary hub service UUID: `c5f50001-8280-46da-89f4-6d8051e4aeef`
pub const HUB_SERVICE_UUID: Uuid = Uuid::from_u128(0xc5f50001_8280_46da_89f4_6d8051e4aeef);

/// Control/Event characteristic UUID: `c5f50002-8280-46da-89f4-6d8051e4aeef`
///
/// Host writes command frames here; hub notifies event frames here.
pub const CONTROL_EVENT_CHAR_UUID: Uuid = Uuid::from_u128(0xc5f50002_8280_46da_89f4_6d8051e4aeef);

/// Capabilities characteristic UUID: `c5f50003-8280-46da-89f4-6d8051e4aeef`
///
/// Read-only; absent on older hubs.
pub const CAPABILITIES_CHAR_UUID: Uuid = Uuid::from_u128(0xc5f50003_8280_46da_89f4_6d8051e4aeef);
