// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order reads, status updates, and the outbound-movement claim.
//!
//! Orders are owned by the storefront; the fulfillment core mutates only
//! `status`, `tracking_number`, `outbound_id`, and the append-only
//! `order_history`.

use rusqlite::params;
use shipwright_core::ShipwrightError;

use crate::database::{Database, map_tr_err};
use crate::models::{HistoryRow, OrderItemRow, OrderRow};

fn row_to_order(row: &rusqlite::Row<'_>) -> Result<OrderRow, rusqlite::Error> {
    Ok(OrderRow {
        id: row.get(0)?,
        status: row.get(1)?,
        account_email: row.get(2)?,
        shipping_email: row.get(3)?,
        subtotal_cents: row.get(4)?,
        discount_cents: row.get(5)?,
        tax_cents: row.get(6)?,
        total_cents: row.get(7)?,
        tracking_number: row.get(8)?,
        outbound_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

const ORDER_COLUMNS: &str = "id, status, account_email, shipping_email, subtotal_cents, \
     discount_cents, tax_cents, total_cents, tracking_number, outbound_id, \
     created_at, updated_at";

/// Insert an order with its line items. Used by the storefront boundary
/// and test seeding; the state machine never creates orders.
pub async fn insert_order(
    db: &Database,
    order: &OrderRow,
    items: &[OrderItemRow],
) -> Result<(), ShipwrightError> {
    let order = order.clone();
    let items = items.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO orders (id, status, account_email, shipping_email, \
                 subtotal_cents, discount_cents, tax_cents, total_cents, \
                 tracking_number, outbound_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    order.id,
                    order.status,
                    order.account_email,
                    order.shipping_email,
                    order.subtotal_cents,
                    order.discount_cents,
                    order.tax_cents,
                    order.total_cents,
                    order.tracking_number,
                    order.outbound_id,
                ],
            )?;
            for item in &items {
                tx.execute(
                    "INSERT INTO order_items (order_id, product_id, sku, quantity, unit_price_cents) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        order.id,
                        item.product_id,
                        item.sku,
                        item.quantity,
                        item.unit_price_cents,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get an order by id, with its line items.
pub async fn get_order(
    db: &Database,
    id: &str,
) -> Result<Option<(OrderRow, Vec<OrderItemRow>)>, ShipwrightError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let order = {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
                ))?;
                match stmt.query_row(params![id], |row| row_to_order(row)) {
                    Ok(order) => order,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e),
                }
            };

            let mut stmt = conn.prepare(
                "SELECT order_id, product_id, sku, quantity, unit_price_cents \
                 FROM order_items WHERE order_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![order.id], |row| {
                Ok(OrderItemRow {
                    order_id: row.get(0)?,
                    product_id: row.get(1)?,
                    sku: row.get(2)?,
                    quantity: row.get(3)?,
                    unit_price_cents: row.get(4)?,
                })
            })?;
            let mut items = Vec::new();
            for row in rows {
                items.push(row?);
            }
            Ok(Some((order, items)))
        })
        .await
        .map_err(map_tr_err)
}

/// Re-read the order's current status. Transition validation must use
/// this, never a status passed in by the caller.
pub async fn get_status(db: &Database, id: &str) -> Result<Option<String>, ShipwrightError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            match conn.query_row(
                "SELECT status FROM orders WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            ) {
                Ok(status) => Ok(Some(status)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Durably apply a status change: update the order row and append a
/// history entry in one transaction.
pub async fn update_status(
    db: &Database,
    id: &str,
    status: &str,
    tracking_number: Option<String>,
    actor: &str,
    note: Option<String>,
) -> Result<(), ShipwrightError> {
    let id = id.to_string();
    let status = status.to_string();
    let actor = actor.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE orders SET status = ?1, \
                 tracking_number = COALESCE(?2, tracking_number), \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ?3",
                params![status, tracking_number, id],
            )?;
            tx.execute(
                "INSERT INTO order_history (order_id, action, actor, note) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, format!("status:{status}"), actor, note],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Claim the right to create the order's outbound movement.
///
/// Conditional update: succeeds for exactly one caller when racing, so at
/// most one outbound movement ever exists per order. Returns `true` if
/// this caller won the claim.
pub async fn claim_outbound(
    db: &Database,
    order_id: &str,
    movement_id: &str,
) -> Result<bool, ShipwrightError> {
    let order_id = order_id.to_string();
    let movement_id = movement_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE orders SET outbound_id = ?1 \
                 WHERE id = ?2 AND outbound_id IS NULL",
                params![movement_id, order_id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// The order's outbound movement id, if one has been created.
pub async fn get_outbound_id(
    db: &Database,
    order_id: &str,
) -> Result<Option<String>, ShipwrightError> {
    let order_id = order_id.to_string();
    db.connection()
        .call(move |conn| {
            match conn.query_row(
                "SELECT outbound_id FROM orders WHERE id = ?1",
                params![order_id],
                |row| row.get::<_, Option<String>>(0),
            ) {
                Ok(outbound) => Ok(outbound),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// The order's history entries, oldest first.
pub async fn list_history(db: &Database, order_id: &str) -> Result<Vec<HistoryRow>, ShipwrightError> {
    let order_id = order_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT action, actor, note, created_at FROM order_history \
                 WHERE order_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![order_id], |row| {
                Ok(HistoryRow {
                    action: row.get(0)?,
                    actor: row.get(1)?,
                    note: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}
