// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator alerts: inconsistencies that need a human, recorded when an
//! automated step fails after its primary effect already committed.

use rusqlite::params;
use shipwright_core::ShipwrightError;

use crate::database::{Database, map_tr_err};
use crate::models::OperatorAlertRow;

/// Record an alert. At least one of `order_id` / `movement_id` should be
/// set so the operator can find the affected records.
pub async fn insert_alert(
    db: &Database,
    order_id: Option<&str>,
    movement_id: Option<&str>,
    message: &str,
) -> Result<(), ShipwrightError> {
    let order_id = order_id.map(str::to_string);
    let movement_id = movement_id.map(str::to_string);
    let message = message.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO operator_alerts (order_id, movement_id, message) \
                 VALUES (?1, ?2, ?3)",
                params![order_id, movement_id, message],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// List alerts, newest first.
pub async fn list_alerts(db: &Database, limit: i64) -> Result<Vec<OperatorAlertRow>, ShipwrightError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, order_id, movement_id, message, created_at \
                 FROM operator_alerts ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(OperatorAlertRow {
                    id: row.get(0)?,
                    order_id: row.get(1)?,
                    movement_id: row.get(2)?,
                    message: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            let mut alerts = Vec::new();
            for row in rows {
                alerts.push(row?);
            }
            Ok(alerts)
        })
        .await
        .map_err(map_tr_err)
}
