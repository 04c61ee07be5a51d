// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The static transition table.
//!
//! One lookup serves both validation and the "what can I do next" query,
//! so the two can never disagree. Admin and staff drive orders forward;
//! the system role exists only for automated early cancellation (payment
//! timeout). Terminal states admit nothing.

use shipwright_core::{ActorRole, OrderStatus};

/// Statuses reachable in one step from `current` for the acting role.
pub fn allowed_targets(current: OrderStatus, role: ActorRole) -> &'static [OrderStatus] {
    use ActorRole::*;
    use OrderStatus::*;
    match (current, role) {
        (Pending, Admin | Staff) => &[Confirmed, Processing, Cancelled],
        (Confirmed, Admin | Staff) => &[Processing, Cancelled],
        (Processing, Admin | Staff) => &[Shipping, Cancelled],
        (Shipping, Admin | Staff) => &[Delivered],
        (Pending | Confirmed, System) => &[Cancelled],
        _ => &[],
    }
}

/// Whether `target` is a legal next status for this `(current, role)` pair.
pub fn is_allowed(current: OrderStatus, role: ActorRole, target: OrderStatus) -> bool {
    allowed_targets(current, role).contains(&target)
}
