// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the fulfillment components.
//!
//! All status enums derive strum `Display`/`EnumString` with snake_case
//! serialization so they round-trip through TEXT columns and JSON payloads
//! with the same spelling. Money is stored as integer cents; only ratios
//! (profit margin, accuracy rate) are floating point.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::history::AuditTrail;

/// Customer-visible order lifecycle states.
///
/// `Delivered` and `Cancelled` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Role of the actor driving a transition.
///
/// `System` is reserved for automated rollbacks (e.g. payment timeout);
/// only `Admin` and `Staff` may move an order forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Staff,
    System,
}

/// A verified actor identity, resolved from a credential by the
/// authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

/// Direction of an inventory movement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Inbound,
    Outbound,
}

/// Movement fulfillment state.
///
/// Lattice: `pending -> approved -> completed`, or any non-terminal state
/// `-> cancelled`. `Completed` and `Cancelled` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

impl MovementStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `target` is reachable from `self` in one step.
    pub fn can_transition_to(self, target: MovementStatus) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Approved)
                | (Self::Approved, Self::Completed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Approved, Self::Cancelled)
        )
    }
}

/// Notification job lifecycle state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    InFlight,
    Completed,
    Failed,
}

/// Templated email type carried by a notification job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    StatusChanged,
}

/// One line item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub sku: String,
    pub quantity: i64,
    /// Customer-facing unit price in cents.
    pub unit_price_cents: i64,
}

/// Read-only projection of an order, owned externally and referenced by the
/// fulfillment core. The contact email resolves shipping-form email over
/// the account email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: String,
    pub status: OrderStatus,
    pub account_email: Option<String>,
    pub shipping_email: Option<String>,
    pub lines: Vec<OrderLine>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub tracking_number: Option<String>,
    /// Back-reference to the outbound movement, once created.
    pub outbound_id: Option<String>,
}

impl OrderSnapshot {
    /// Customer contact for notifications: the shipping-form email takes
    /// precedence over the account email.
    pub fn contact_email(&self) -> Option<&str> {
        self.shipping_email
            .as_deref()
            .or(self.account_email.as_deref())
    }
}

/// One line item on a movement, with stock snapshots taken at creation
/// time and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementItem {
    pub product_id: String,
    pub sku: String,
    pub quantity: i64,
    /// Inventory cost basis per unit, in cents.
    pub unit_cost_cents: i64,
    /// Customer-facing value per unit, in cents.
    pub unit_value_cents: i64,
    pub quantity_before: i64,
    pub quantity_after: i64,
}

impl MovementItem {
    /// Line value: quantity x unit value.
    pub fn total_value_cents(&self) -> i64 {
        self.quantity * self.unit_value_cents
    }

    /// Line cost: quantity x unit cost basis.
    pub fn total_cost_cents(&self) -> i64 {
        self.quantity * self.unit_cost_cents
    }
}

/// A ledger entry representing stock entering or leaving the warehouse.
///
/// Invariant: `total_value_cents` always equals the sum of item values
/// minus discounts plus tax, and `history` is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: String,
    /// Human-readable, date-scoped receipt number (`OUT-YYYYMMDD-NNN`).
    pub receipt_number: String,
    pub movement_type: MovementType,
    /// Origin of the movement, e.g. `online_order` or `manual`.
    pub sub_type: String,
    pub order_id: Option<String>,
    pub status: MovementStatus,
    pub items: Vec<MovementItem>,
    pub total_cost_cents: i64,
    pub total_value_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub profit_cents: i64,
    /// `profit / total_value`, zero when total value is zero.
    pub profit_margin: f64,
    pub history: AuditTrail,
    pub created_at: String,
    pub updated_at: String,
}

/// Everything needed to render a self-contained status-change message,
/// snapshotted at enqueue time so the mail worker never reads the stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub recipient: Option<String>,
    pub order_id: String,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub note: Option<String>,
    pub lines: Vec<OrderLine>,
    pub total_cents: i64,
}
