// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stock checks: periodic audits over the live stock levels.
//!
//! A check snapshots expected quantities when opened, is filled in with
//! counted quantities over time, and on completion computes an accuracy
//! rate and the value of the discrepancies. It is a reporting view only
//! and never mutates live stock.

use std::sync::Arc;

use serde::Serialize;
use shipwright_core::ShipwrightError;
use shipwright_storage::Database;
use shipwright_storage::queries::stock;
use uuid::Uuid;

/// One audited SKU.
#[derive(Debug, Clone, Serialize)]
pub struct StockCheckItem {
    pub sku: String,
    pub expected_quantity: i64,
    pub counted_quantity: Option<i64>,
    pub unit_cost_cents: i64,
}

/// A stock audit with its per-SKU lines.
#[derive(Debug, Clone, Serialize)]
pub struct StockCheck {
    pub id: String,
    pub scope: String,
    /// `open` or `completed`.
    pub status: String,
    pub accuracy_rate: Option<f64>,
    pub discrepancy_value_cents: Option<i64>,
    pub items: Vec<StockCheckItem>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// Runs stock checks against the shared database.
pub struct StockChecker {
    db: Arc<Database>,
}

impl StockChecker {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Open a new check, snapshotting expected quantities for every SKU.
    pub async fn open(&self, scope: &str) -> Result<StockCheck, ShipwrightError> {
        let id = Uuid::new_v4().to_string();
        stock::create_check(&self.db, &id, scope).await?;
        self.get(&id).await
    }

    /// Record the physically counted quantity for one SKU.
    pub async fn record_count(
        &self,
        check_id: &str,
        sku: &str,
        counted: i64,
    ) -> Result<(), ShipwrightError> {
        if !stock::record_count(&self.db, check_id, sku, counted).await? {
            return Err(ShipwrightError::NotFound {
                kind: "stock check item",
                id: format!("{check_id}/{sku}"),
            });
        }
        Ok(())
    }

    /// Close the check and compute its accuracy and discrepancy value.
    pub async fn complete(&self, check_id: &str) -> Result<StockCheck, ShipwrightError> {
        if !stock::complete_check(&self.db, check_id).await? {
            return Err(ShipwrightError::NotFound {
                kind: "open stock check",
                id: check_id.to_string(),
            });
        }
        self.get(check_id).await
    }

    pub async fn get(&self, check_id: &str) -> Result<StockCheck, ShipwrightError> {
        let (check, items) = stock::get_check(&self.db, check_id)
            .await?
            .ok_or_else(|| ShipwrightError::NotFound {
                kind: "stock check",
                id: check_id.to_string(),
            })?;
        Ok(StockCheck {
            id: check.id,
            scope: check.scope,
            status: check.status,
            accuracy_rate: check.accuracy_rate,
            discrepancy_value_cents: check.discrepancy_value_cents,
            items: items
                .into_iter()
                .map(|item| StockCheckItem {
                    sku: item.sku,
                    expected_quantity: item.expected_quantity,
                    counted_quantity: item.counted_quantity,
                    unit_cost_cents: item.unit_cost_cents,
                })
                .collect(),
            created_at: check.created_at,
            completed_at: check.completed_at,
        })
    }
}
