// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Movement ledger persistence: transactional inserts, guarded status
//! updates, and filtered reads.
//!
//! Receipt numbers carry a UNIQUE constraint; a collision at write time is
//! reported as [`InsertOutcome::ReceiptCollision`] so the allocator can
//! regenerate instead of silently overwriting.

use rusqlite::{OptionalExtension, params};
use shipwright_core::ShipwrightError;

use crate::database::{Database, map_tr_err};
use crate::models::{HistoryRow, MovementItemRow, MovementRow};

/// Result of a movement insert attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The receipt number already exists; the caller must regenerate.
    ReceiptCollision,
    /// A stock delta would have driven the named SKU negative; nothing
    /// was written.
    InsufficientStock { sku: String },
}

fn is_receipt_collision(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(failure, Some(message)) => {
            failure.code == rusqlite::ErrorCode::ConstraintViolation
                && message.contains("receipt_number")
        }
        _ => false,
    }
}

fn row_to_movement(row: &rusqlite::Row<'_>) -> Result<MovementRow, rusqlite::Error> {
    Ok(MovementRow {
        id: row.get(0)?,
        receipt_number: row.get(1)?,
        movement_type: row.get(2)?,
        sub_type: row.get(3)?,
        order_id: row.get(4)?,
        status: row.get(5)?,
        total_cost_cents: row.get(6)?,
        total_value_cents: row.get(7)?,
        discount_cents: row.get(8)?,
        tax_cents: row.get(9)?,
        profit_cents: row.get(10)?,
        profit_margin: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

const MOVEMENT_COLUMNS: &str = "id, receipt_number, movement_type, sub_type, order_id, status, \
     total_cost_cents, total_value_cents, discount_cents, tax_cents, \
     profit_cents, profit_margin, created_at, updated_at";

/// Filter for [`list_movements`].
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    /// "inbound" or "outbound".
    pub movement_type: Option<String>,
    /// Inclusive ISO 8601 lower bound on created_at.
    pub from: Option<String>,
    /// Exclusive ISO 8601 upper bound on created_at.
    pub to: Option<String>,
}

/// Insert a movement with its items, initial history entry, and stock
/// adjustments in one transaction.
///
/// `stock_deltas` are `(sku, signed quantity change)` pairs applied to
/// `stock_levels`. A delta that would drive a quantity negative aborts the
/// whole insert with [`InsertOutcome::InsufficientStock`], so the item
/// snapshots written here always match the post-adjustment live levels.
pub async fn insert_movement(
    db: &Database,
    movement: &MovementRow,
    items: &[MovementItemRow],
    history: &HistoryRow,
    stock_deltas: &[(String, i64)],
) -> Result<InsertOutcome, ShipwrightError> {
    let movement = movement.clone();
    let items = items.to_vec();
    let history = history.clone();
    let stock_deltas = stock_deltas.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO movements (id, receipt_number, movement_type, sub_type, \
                 order_id, status, total_cost_cents, total_value_cents, discount_cents, \
                 tax_cents, profit_cents, profit_margin) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    movement.id,
                    movement.receipt_number,
                    movement.movement_type,
                    movement.sub_type,
                    movement.order_id,
                    movement.status,
                    movement.total_cost_cents,
                    movement.total_value_cents,
                    movement.discount_cents,
                    movement.tax_cents,
                    movement.profit_cents,
                    movement.profit_margin,
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_receipt_collision(&e) => {
                    // Roll back; the allocator regenerates the number.
                    return Ok(InsertOutcome::ReceiptCollision);
                }
                Err(e) => return Err(e),
            }
            for item in &items {
                tx.execute(
                    "INSERT INTO movement_items (movement_id, product_id, sku, quantity, \
                     unit_cost_cents, unit_value_cents, quantity_before, quantity_after) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        movement.id,
                        item.product_id,
                        item.sku,
                        item.quantity,
                        item.unit_cost_cents,
                        item.unit_value_cents,
                        item.quantity_before,
                        item.quantity_after,
                    ],
                )?;
            }
            tx.execute(
                "INSERT INTO movement_history (movement_id, action, actor, note) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![movement.id, history.action, history.actor, history.note],
            )?;
            for (sku, delta) in &stock_deltas {
                let changed = tx.execute(
                    "UPDATE stock_levels SET quantity = quantity + ?2, \
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                     WHERE sku = ?1 AND quantity + ?2 >= 0",
                    params![sku, delta],
                )?;
                if changed == 0 {
                    return Ok(InsertOutcome::InsufficientStock { sku: sku.clone() });
                }
            }
            tx.commit()?;
            Ok(InsertOutcome::Inserted)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a movement with its items and full history.
pub async fn get_movement(
    db: &Database,
    id: &str,
) -> Result<Option<(MovementRow, Vec<MovementItemRow>, Vec<HistoryRow>)>, ShipwrightError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let movement = {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = ?1"
                ))?;
                match stmt.query_row(params![id], |row| row_to_movement(row)) {
                    Ok(movement) => movement,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e),
                }
            };

            let mut items = Vec::new();
            {
                let mut stmt = conn.prepare(
                    "SELECT movement_id, product_id, sku, quantity, unit_cost_cents, \
                     unit_value_cents, quantity_before, quantity_after \
                     FROM movement_items WHERE movement_id = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![movement.id], |row| {
                    Ok(MovementItemRow {
                        movement_id: row.get(0)?,
                        product_id: row.get(1)?,
                        sku: row.get(2)?,
                        quantity: row.get(3)?,
                        unit_cost_cents: row.get(4)?,
                        unit_value_cents: row.get(5)?,
                        quantity_before: row.get(6)?,
                        quantity_after: row.get(7)?,
                    })
                })?;
                for row in rows {
                    items.push(row?);
                }
            }

            let mut history = Vec::new();
            {
                let mut stmt = conn.prepare(
                    "SELECT action, actor, note, created_at FROM movement_history \
                     WHERE movement_id = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![movement.id], |row| {
                    Ok(HistoryRow {
                        action: row.get(0)?,
                        actor: row.get(1)?,
                        note: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?;
                for row in rows {
                    history.push(row?);
                }
            }

            Ok(Some((movement, items, history)))
        })
        .await
        .map_err(map_tr_err)
}

/// Result of a guarded status update attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// The movement was no longer in the expected status.
    StaleStatus,
    /// A stock adjustment would have driven the named SKU negative;
    /// nothing was written.
    InsufficientStock { sku: String },
}

/// Guarded status update: applies only when the movement is still in
/// `expected_status`, appending a history entry and any stock adjustments
/// (cancellation restores) in the same transaction.
///
/// Stock deltas carry the same non-negative guard as [`insert_movement`]:
/// cancelling an inbound whose stock has since been sold must not drive
/// the live level negative.
pub async fn update_status_guarded(
    db: &Database,
    id: &str,
    expected_status: &str,
    new_status: &str,
    actor: &str,
    note: Option<String>,
    stock_deltas: &[(String, i64)],
) -> Result<UpdateOutcome, ShipwrightError> {
    let id = id.to_string();
    let expected = expected_status.to_string();
    let new_status = new_status.to_string();
    let actor = actor.to_string();
    let stock_deltas = stock_deltas.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE movements SET status = ?1, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ?2 AND status = ?3",
                params![new_status, id, expected],
            )?;
            if changed == 0 {
                return Ok(UpdateOutcome::StaleStatus);
            }
            tx.execute(
                "INSERT INTO movement_history (movement_id, action, actor, note) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, format!("status:{new_status}"), actor, note],
            )?;
            for (sku, delta) in &stock_deltas {
                let changed = tx.execute(
                    "UPDATE stock_levels SET quantity = quantity + ?2, \
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                     WHERE sku = ?1 AND quantity + ?2 >= 0",
                    params![sku, delta],
                )?;
                if changed == 0 {
                    return Ok(UpdateOutcome::InsufficientStock { sku: sku.clone() });
                }
            }
            tx.commit()?;
            Ok(UpdateOutcome::Updated)
        })
        .await
        .map_err(map_tr_err)
}

/// List movements matching the filter, newest first.
pub async fn list_movements(
    db: &Database,
    filter: &MovementFilter,
) -> Result<Vec<MovementRow>, ShipwrightError> {
    let filter = filter.clone();
    db.connection()
        .call(move |conn| {
            let mut sql = format!("SELECT {MOVEMENT_COLUMNS} FROM movements WHERE 1=1");
            let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
            if let Some(movement_type) = &filter.movement_type {
                sql.push_str(&format!(" AND movement_type = ?{}", args.len() + 1));
                args.push(Box::new(movement_type.clone()));
            }
            if let Some(from) = &filter.from {
                sql.push_str(&format!(" AND created_at >= ?{}", args.len() + 1));
                args.push(Box::new(from.clone()));
            }
            if let Some(to) = &filter.to {
                sql.push_str(&format!(" AND created_at < ?{}", args.len() + 1));
                args.push(Box::new(to.clone()));
            }
            sql.push_str(" ORDER BY created_at DESC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
                |row| row_to_movement(row),
            )?;
            let mut movements = Vec::new();
            for row in rows {
                movements.push(row?);
            }
            Ok(movements)
        })
        .await
        .map_err(map_tr_err)
}

/// Find the outbound movement for an order, if one exists.
pub async fn find_outbound_for_order(
    db: &Database,
    order_id: &str,
) -> Result<Option<String>, ShipwrightError> {
    let order_id = order_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id FROM movements WHERE order_id = ?1 AND movement_type = 'outbound'",
                params![order_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Count receipts whose number starts with the given day prefix
/// (e.g. `OUT-20260301-`). Feeds the next-ordinal allocation.
pub async fn count_receipts_with_prefix(
    db: &Database,
    prefix: &str,
) -> Result<i64, ShipwrightError> {
    let like = format!("{prefix}%");
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM movements WHERE receipt_number LIKE ?1",
                params![like],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
