// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stock level reads and the stock check tables.
//!
//! Quantity mutations go through the movement insert transaction (see
//! `queries::movements`); this module only seeds, reads, and audits.

use rusqlite::{OptionalExtension, params};
use shipwright_core::ShipwrightError;

use crate::database::{Database, map_tr_err};
use crate::models::{StockCheckItemRow, StockCheckRow, StockLevelRow};

fn row_to_level(row: &rusqlite::Row<'_>) -> Result<StockLevelRow, rusqlite::Error> {
    Ok(StockLevelRow {
        sku: row.get(0)?,
        product_id: row.get(1)?,
        quantity: row.get(2)?,
        cost_cents: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Create or replace a stock level row. Used for seeding and for cost-basis
/// updates on inbound receipt.
pub async fn upsert_level(
    db: &Database,
    sku: &str,
    product_id: &str,
    quantity: i64,
    cost_cents: i64,
) -> Result<(), ShipwrightError> {
    let sku = sku.to_string();
    let product_id = product_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO stock_levels (sku, product_id, quantity, cost_cents) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(sku) DO UPDATE SET quantity = excluded.quantity, \
                 cost_cents = excluded.cost_cents, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![sku, product_id, quantity, cost_cents],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Ensure a level row exists for the SKU (at zero quantity if new) and
/// update its cost basis. Used on inbound receipt, where the latest
/// purchase cost becomes the margin basis for later outbounds.
pub async fn ensure_level(
    db: &Database,
    sku: &str,
    product_id: &str,
    cost_cents: i64,
) -> Result<(), ShipwrightError> {
    let sku = sku.to_string();
    let product_id = product_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO stock_levels (sku, product_id, quantity, cost_cents) \
                 VALUES (?1, ?2, 0, ?3) \
                 ON CONFLICT(sku) DO UPDATE SET cost_cents = excluded.cost_cents, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![sku, product_id, cost_cents],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one stock level.
pub async fn get_level(db: &Database, sku: &str) -> Result<Option<StockLevelRow>, ShipwrightError> {
    let sku = sku.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT sku, product_id, quantity, cost_cents, updated_at \
                 FROM stock_levels WHERE sku = ?1",
                params![sku],
                |row| row_to_level(row),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch levels for a set of SKUs. Missing SKUs are simply absent from the
/// result; the caller decides whether that is an error.
pub async fn get_levels(
    db: &Database,
    skus: &[String],
) -> Result<Vec<StockLevelRow>, ShipwrightError> {
    let skus = skus.to_vec();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT sku, product_id, quantity, cost_cents, updated_at \
                 FROM stock_levels WHERE sku = ?1",
            )?;
            let mut levels = Vec::new();
            for sku in &skus {
                if let Some(level) = stmt
                    .query_row(params![sku], |row| row_to_level(row))
                    .optional()?
                {
                    levels.push(level);
                }
            }
            Ok(levels)
        })
        .await
        .map_err(map_tr_err)
}

/// All stock levels, ordered by SKU.
pub async fn list_levels(db: &Database) -> Result<Vec<StockLevelRow>, ShipwrightError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sku, product_id, quantity, cost_cents, updated_at \
                 FROM stock_levels ORDER BY sku ASC",
            )?;
            let rows = stmt.query_map([], |row| row_to_level(row))?;
            let mut levels = Vec::new();
            for row in rows {
                levels.push(row?);
            }
            Ok(levels)
        })
        .await
        .map_err(map_tr_err)
}

/// Open a stock check, snapshotting expected quantities from the live
/// levels in the same transaction.
pub async fn create_check(db: &Database, id: &str, scope: &str) -> Result<(), ShipwrightError> {
    let id = id.to_string();
    let scope = scope.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO stock_checks (id, scope) VALUES (?1, ?2)",
                params![id, scope],
            )?;
            tx.execute(
                "INSERT INTO stock_check_items (check_id, sku, expected_quantity, unit_cost_cents) \
                 SELECT ?1, sku, quantity, cost_cents FROM stock_levels ORDER BY sku ASC",
                params![id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record a physical count for one SKU of an open check.
pub async fn record_count(
    db: &Database,
    check_id: &str,
    sku: &str,
    counted: i64,
) -> Result<bool, ShipwrightError> {
    let check_id = check_id.to_string();
    let sku = sku.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE stock_check_items SET counted_quantity = ?3 \
                 WHERE check_id = ?1 AND sku = ?2",
                params![check_id, sku, counted],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Close a check, computing its accuracy rate and the absolute value of the
/// discrepancies. Uncounted items count as discrepancies of the full
/// expected quantity.
pub async fn complete_check(db: &Database, id: &str) -> Result<bool, ShipwrightError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let (total, matching, discrepancy_cents): (i64, i64, i64) = tx.query_row(
                "SELECT COUNT(*), \
                 COALESCE(SUM(CASE WHEN counted_quantity = expected_quantity THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(ABS(COALESCE(counted_quantity, 0) - expected_quantity) * unit_cost_cents), 0) \
                 FROM stock_check_items WHERE check_id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
            let accuracy = if total == 0 {
                1.0
            } else {
                matching as f64 / total as f64
            };
            let changed = tx.execute(
                "UPDATE stock_checks SET status = 'completed', accuracy_rate = ?2, \
                 discrepancy_value_cents = ?3, \
                 completed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ?1 AND status = 'open'",
                params![id, accuracy, discrepancy_cents],
            )?;
            tx.commit()?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a check with its items.
pub async fn get_check(
    db: &Database,
    id: &str,
) -> Result<Option<(StockCheckRow, Vec<StockCheckItemRow>)>, ShipwrightError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let check = match conn
                .query_row(
                    "SELECT id, scope, status, accuracy_rate, discrepancy_value_cents, \
                     created_at, completed_at FROM stock_checks WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(StockCheckRow {
                            id: row.get(0)?,
                            scope: row.get(1)?,
                            status: row.get(2)?,
                            accuracy_rate: row.get(3)?,
                            discrepancy_value_cents: row.get(4)?,
                            created_at: row.get(5)?,
                            completed_at: row.get(6)?,
                        })
                    },
                )
                .optional()?
            {
                Some(check) => check,
                None => return Ok(None),
            };

            let mut stmt = conn.prepare(
                "SELECT check_id, sku, expected_quantity, counted_quantity, unit_cost_cents \
                 FROM stock_check_items WHERE check_id = ?1 ORDER BY sku ASC",
            )?;
            let rows = stmt.query_map(params![check.id], |row| {
                Ok(StockCheckItemRow {
                    check_id: row.get(0)?,
                    sku: row.get(1)?,
                    expected_quantity: row.get(2)?,
                    counted_quantity: row.get(3)?,
                    unit_cost_cents: row.get(4)?,
                })
            })?;
            let mut items = Vec::new();
            for row in rows {
                items.push(row?);
            }
            Ok(Some((check, items)))
        })
        .await
        .map_err(map_tr_err)
}
