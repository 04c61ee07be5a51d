// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the fulfillment core.
//!
//! One database file holds all three record sets (orders, movements,
//! notification jobs) plus stock levels, operator alerts, and stock
//! checks. All access goes through the single [`Database`] handle, whose
//! tokio-rusqlite connection serializes writes on a background thread.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
