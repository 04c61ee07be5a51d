// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row structs mirroring the SQLite schema.
//!
//! Statuses are stored as snake_case TEXT and parsed back through the
//! strum `EnumString` impls on the core enums. Timestamps are ISO 8601
//! UTC TEXT.

use serde::{Deserialize, Serialize};

/// A row in `orders`, plus its line items loaded from `order_items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: String,
    pub status: String,
    pub account_email: Option<String>,
    pub shipping_email: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub tracking_number: Option<String>,
    pub outbound_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row in `order_items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRow {
    pub order_id: String,
    pub product_id: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// A row in `movements` (items and history loaded separately).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRow {
    pub id: String,
    pub receipt_number: String,
    pub movement_type: String,
    pub sub_type: String,
    pub order_id: Option<String>,
    pub status: String,
    pub total_cost_cents: i64,
    pub total_value_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub profit_cents: i64,
    pub profit_margin: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// A row in `movement_items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementItemRow {
    pub movement_id: String,
    pub product_id: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub unit_value_cents: i64,
    pub quantity_before: i64,
    pub quantity_after: i64,
}

/// A row in `movement_history` or `order_history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRow {
    pub action: String,
    pub actor: String,
    pub note: Option<String>,
    pub created_at: String,
}

/// A row in `notification_jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRow {
    pub id: String,
    pub kind: String,
    pub payload: String,
    pub state: String,
    pub attempts: i64,
    pub max_attempts: i64,
    pub last_error: Option<String>,
    pub created_at: String,
    pub next_attempt_at: String,
    pub locked_until: Option<String>,
    pub completed_at: Option<String>,
}

/// A row in `stock_levels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevelRow {
    pub sku: String,
    pub product_id: String,
    pub quantity: i64,
    pub cost_cents: i64,
    pub updated_at: String,
}

/// A row in `operator_alerts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorAlertRow {
    pub id: i64,
    pub order_id: Option<String>,
    pub movement_id: Option<String>,
    pub message: String,
    pub created_at: String,
}

/// A row in `stock_checks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCheckRow {
    pub id: String,
    pub scope: String,
    pub status: String,
    pub accuracy_rate: Option<f64>,
    pub discrepancy_value_cents: Option<i64>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// A row in `stock_check_items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCheckItemRow {
    pub check_id: String,
    pub sku: String,
    pub expected_quantity: i64,
    pub counted_quantity: Option<i64>,
    pub unit_cost_cents: i64,
}
