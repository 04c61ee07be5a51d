// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Receipt number generation.
//!
//! Receipts are human-readable and date-scoped: `OUT-20260301-001`,
//! `IN-20260301-002`. The ordinal is the count of receipts already issued
//! for that day plus one. Allocation reads a count and is therefore racy
//! on its own; the ledger serializes allocation behind a mutex and the
//! UNIQUE column catches anything that slips through.

use chrono::NaiveDate;
use shipwright_core::MovementType;

/// Day-scoped receipt prefix, e.g. `OUT-20260301-`.
pub fn day_prefix(movement_type: MovementType, date: NaiveDate) -> String {
    let tag = match movement_type {
        MovementType::Inbound => "IN",
        MovementType::Outbound => "OUT",
    };
    format!("{tag}-{}-", date.format("%Y%m%d"))
}

/// Full receipt number for the given ordinal. Ordinals are zero-padded to
/// three digits and simply widen past 999.
pub fn receipt_number(prefix: &str, ordinal: i64) -> String {
    format!("{prefix}{ordinal:03}")
}
