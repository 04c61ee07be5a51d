// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger port consumed by the order state machine.

use async_trait::async_trait;

use crate::error::ShipwrightError;
use crate::types::{Movement, MovementStatus, OrderSnapshot};

/// Side-effect interface into the inventory movement ledger.
///
/// `create_outbound` is idempotent per order: a second call for an order
/// that already has an outbound movement returns the existing movement
/// unchanged.
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// Create (or return the existing) outbound movement for an order.
    async fn create_outbound(
        &self,
        order: &OrderSnapshot,
        actor: &str,
    ) -> Result<Movement, ShipwrightError>;

    /// Apply a status change to a movement, appending a history entry.
    async fn update_movement_status(
        &self,
        movement_id: &str,
        new_status: MovementStatus,
        actor: &str,
        note: Option<String>,
    ) -> Result<Movement, ShipwrightError>;
}
