// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The inventory movement ledger.
//!
//! Movements are append-only: created once, mutated only through the
//! status lattice, never deleted. Cost, profit, and stock snapshots are
//! computed at creation time and never recomputed, so the ledger stays an
//! honest audit trail even when stock is later adjusted by other means.
//!
//! Receipt allocation and the one-outbound-per-order check are serialized
//! behind a single mutex; the UNIQUE receipt column is the last line of
//! defense against duplicates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shipwright_core::{
    AuditTrail, HistoryEntry, LedgerPort, Movement, MovementItem, MovementStatus, MovementType,
    OrderSnapshot, ShipwrightError,
};
use shipwright_storage::Database;
use shipwright_storage::models::{HistoryRow, MovementItemRow, MovementRow};
use shipwright_storage::queries::{movements, stock};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod receipts;
pub mod stock_check;

pub use stock_check::{StockCheck, StockCheckItem, StockChecker};

/// Collision retries before receipt allocation gives up.
const RECEIPT_RETRY_LIMIT: usize = 5;

/// One line of a manually recorded inbound movement.
#[derive(Debug, Clone)]
pub struct InboundLine {
    pub product_id: String,
    pub sku: String,
    pub quantity: i64,
    /// Purchase cost per unit; becomes the new cost basis for the SKU.
    pub unit_cost_cents: i64,
    /// Expected sale value per unit.
    pub unit_value_cents: i64,
}

/// Listing filter for [`MovementLedger::list`].
#[derive(Debug, Clone, Default)]
pub struct MovementQuery {
    pub movement_type: Option<MovementType>,
    /// Inclusive ISO 8601 lower bound on creation time.
    pub from: Option<String>,
    /// Exclusive ISO 8601 upper bound on creation time.
    pub to: Option<String>,
}

/// A movement without its items and history, for listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MovementSummary {
    pub id: String,
    pub receipt_number: String,
    pub movement_type: MovementType,
    pub sub_type: String,
    pub order_id: Option<String>,
    pub status: MovementStatus,
    pub total_cost_cents: i64,
    pub total_value_cents: i64,
    pub profit_cents: i64,
    pub profit_margin: f64,
    pub created_at: String,
}

/// The ledger component. Callers share it behind an `Arc`.
pub struct MovementLedger {
    db: Arc<Database>,
    /// Serializes receipt allocation and the per-order outbound check.
    alloc_lock: Mutex<()>,
}

fn ledger_write_failed(order_id: &str, message: String) -> ShipwrightError {
    ShipwrightError::LedgerWriteFailed {
        order_id: order_id.to_string(),
        source: message.into(),
    }
}

fn parse_movement_type(text: &str) -> Result<MovementType, ShipwrightError> {
    text.parse()
        .map_err(|_| ShipwrightError::Internal(format!("unrecognized movement type: {text}")))
}

fn parse_movement_status(text: &str) -> Result<MovementStatus, ShipwrightError> {
    text.parse()
        .map_err(|_| ShipwrightError::Internal(format!("unrecognized movement status: {text}")))
}

fn movement_from_rows(
    row: MovementRow,
    items: Vec<MovementItemRow>,
    history: Vec<HistoryRow>,
) -> Result<Movement, ShipwrightError> {
    Ok(Movement {
        movement_type: parse_movement_type(&row.movement_type)?,
        status: parse_movement_status(&row.status)?,
        id: row.id,
        receipt_number: row.receipt_number,
        sub_type: row.sub_type,
        order_id: row.order_id,
        items: items
            .into_iter()
            .map(|item| MovementItem {
                product_id: item.product_id,
                sku: item.sku,
                quantity: item.quantity,
                unit_cost_cents: item.unit_cost_cents,
                unit_value_cents: item.unit_value_cents,
                quantity_before: item.quantity_before,
                quantity_after: item.quantity_after,
            })
            .collect(),
        total_cost_cents: row.total_cost_cents,
        total_value_cents: row.total_value_cents,
        discount_cents: row.discount_cents,
        tax_cents: row.tax_cents,
        profit_cents: row.profit_cents,
        profit_margin: row.profit_margin,
        history: AuditTrail::from_entries(
            history
                .into_iter()
                .map(|entry| HistoryEntry {
                    action: entry.action,
                    actor: entry.actor,
                    timestamp: entry.created_at,
                    note: entry.note,
                })
                .collect(),
        ),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl MovementLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            alloc_lock: Mutex::new(()),
        }
    }

    /// Fetch one movement with items and history.
    pub async fn get(&self, id: &str) -> Result<Movement, ShipwrightError> {
        let (row, items, history) = movements::get_movement(&self.db, id)
            .await?
            .ok_or_else(|| ShipwrightError::NotFound {
                kind: "movement",
                id: id.to_string(),
            })?;
        movement_from_rows(row, items, history)
    }

    /// List movements matching the query, newest first.
    pub async fn list(&self, query: &MovementQuery) -> Result<Vec<MovementSummary>, ShipwrightError> {
        let filter = movements::MovementFilter {
            movement_type: query.movement_type.map(|t| t.to_string()),
            from: query.from.clone(),
            to: query.to.clone(),
        };
        let rows = movements::list_movements(&self.db, &filter).await?;
        rows.into_iter()
            .map(|row| {
                Ok(MovementSummary {
                    movement_type: parse_movement_type(&row.movement_type)?,
                    status: parse_movement_status(&row.status)?,
                    id: row.id,
                    receipt_number: row.receipt_number,
                    sub_type: row.sub_type,
                    order_id: row.order_id,
                    total_cost_cents: row.total_cost_cents,
                    total_value_cents: row.total_value_cents,
                    profit_cents: row.profit_cents,
                    profit_margin: row.profit_margin,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    /// Record a manual inbound movement: stock enters the warehouse and the
    /// per-unit purchase cost becomes the SKU's cost basis.
    pub async fn create_inbound(
        &self,
        lines: &[InboundLine],
        sub_type: &str,
        actor: &str,
    ) -> Result<Movement, ShipwrightError> {
        let _guard = self.alloc_lock.lock().await;

        for line in lines {
            stock::ensure_level(&self.db, &line.sku, &line.product_id, line.unit_cost_cents)
                .await?;
        }
        let skus: Vec<String> = lines.iter().map(|l| l.sku.clone()).collect();
        let levels = stock::get_levels(&self.db, &skus).await?;
        let by_sku: HashMap<&str, i64> = levels
            .iter()
            .map(|level| (level.sku.as_str(), level.quantity))
            .collect();

        let movement_id = Uuid::new_v4().to_string();
        let mut items = Vec::with_capacity(lines.len());
        let mut deltas = Vec::with_capacity(lines.len());
        for line in lines {
            let before = by_sku.get(line.sku.as_str()).copied().unwrap_or(0);
            items.push(MovementItemRow {
                movement_id: movement_id.clone(),
                product_id: line.product_id.clone(),
                sku: line.sku.clone(),
                quantity: line.quantity,
                unit_cost_cents: line.unit_cost_cents,
                unit_value_cents: line.unit_value_cents,
                quantity_before: before,
                quantity_after: before + line.quantity,
            });
            deltas.push((line.sku.clone(), line.quantity));
        }

        let total_cost: i64 = lines.iter().map(|l| l.quantity * l.unit_cost_cents).sum();
        let total_value: i64 = lines.iter().map(|l| l.quantity * l.unit_value_cents).sum();
        let profit = total_value - total_cost;
        let margin = if total_value > 0 {
            profit as f64 / total_value as f64
        } else {
            0.0
        };

        let template = MovementRow {
            id: movement_id.clone(),
            receipt_number: String::new(),
            movement_type: MovementType::Inbound.to_string(),
            sub_type: sub_type.to_string(),
            order_id: None,
            status: MovementStatus::Pending.to_string(),
            total_cost_cents: total_cost,
            total_value_cents: total_value,
            discount_cents: 0,
            tax_cents: 0,
            profit_cents: profit,
            profit_margin: margin,
            created_at: String::new(),
            updated_at: String::new(),
        };
        self.insert_with_receipt(MovementType::Inbound, template, &items, &deltas, actor)
            .await?;
        self.get(&movement_id).await
    }

    /// Apply the transactional insert, allocating a receipt number and
    /// regenerating on collision. Caller must hold `alloc_lock`.
    async fn insert_with_receipt(
        &self,
        movement_type: MovementType,
        mut row: MovementRow,
        items: &[MovementItemRow],
        deltas: &[(String, i64)],
        actor: &str,
    ) -> Result<(), ShipwrightError> {
        let order_id = row.order_id.clone().unwrap_or_else(|| row.id.clone());
        let created = HistoryRow {
            action: "created".to_string(),
            actor: actor.to_string(),
            note: None,
            created_at: String::new(),
        };
        for collision in 0..RECEIPT_RETRY_LIMIT {
            let prefix = receipts::day_prefix(movement_type, Utc::now().date_naive());
            let issued = movements::count_receipts_with_prefix(&self.db, &prefix).await?;
            row.receipt_number = receipts::receipt_number(&prefix, issued + 1 + collision as i64);

            match movements::insert_movement(&self.db, &row, items, &created, deltas).await? {
                movements::InsertOutcome::Inserted => {
                    debug!(
                        movement_id = %row.id,
                        receipt = %row.receipt_number,
                        "movement recorded"
                    );
                    return Ok(());
                }
                movements::InsertOutcome::ReceiptCollision => {
                    warn!(receipt = %row.receipt_number, "receipt collision, regenerating");
                    continue;
                }
                movements::InsertOutcome::InsufficientStock { sku } => {
                    return Err(ledger_write_failed(
                        &order_id,
                        format!("insufficient stock for sku {sku}"),
                    ));
                }
            }
        }
        Err(ledger_write_failed(
            &order_id,
            "receipt allocation exhausted retries".to_string(),
        ))
    }
}

#[async_trait]
impl LedgerPort for MovementLedger {
    async fn create_outbound(
        &self,
        order: &OrderSnapshot,
        actor: &str,
    ) -> Result<Movement, ShipwrightError> {
        // Fast path: the caller already knows the outbound.
        if let Some(existing) = &order.outbound_id {
            return self.get(existing).await;
        }

        // The existence re-check must happen under the same lock as the
        // insert, or two concurrent calls would both create one.
        let _guard = self.alloc_lock.lock().await;
        if let Some(existing) = movements::find_outbound_for_order(&self.db, &order.id).await? {
            debug!(order_id = %order.id, movement_id = %existing, "outbound already exists");
            return self.get(&existing).await;
        }

        let skus: Vec<String> = order.lines.iter().map(|l| l.sku.clone()).collect();
        let levels = stock::get_levels(&self.db, &skus).await?;
        let by_sku: HashMap<&str, (i64, i64)> = levels
            .iter()
            .map(|level| (level.sku.as_str(), (level.quantity, level.cost_cents)))
            .collect();

        let movement_id = Uuid::new_v4().to_string();
        let mut items = Vec::with_capacity(order.lines.len());
        let mut deltas = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let (available, cost) =
                by_sku
                    .get(line.sku.as_str())
                    .copied()
                    .ok_or_else(|| {
                        ledger_write_failed(
                            &order.id,
                            format!("no stock record for sku {}", line.sku),
                        )
                    })?;
            if available < line.quantity {
                return Err(ledger_write_failed(
                    &order.id,
                    format!(
                        "insufficient stock for sku {}: {available} available, {} required",
                        line.sku, line.quantity
                    ),
                ));
            }
            items.push(MovementItemRow {
                movement_id: movement_id.clone(),
                product_id: line.product_id.clone(),
                sku: line.sku.clone(),
                quantity: line.quantity,
                unit_cost_cents: cost,
                unit_value_cents: line.unit_price_cents,
                quantity_before: available,
                quantity_after: available - line.quantity,
            });
            deltas.push((line.sku.clone(), -line.quantity));
        }

        let total_cost: i64 = items.iter().map(|i| i.quantity * i.unit_cost_cents).sum();
        let items_value: i64 = items.iter().map(|i| i.quantity * i.unit_value_cents).sum();
        let total_value = items_value - order.discount_cents + order.tax_cents;
        let profit = order.total_cents - total_cost;
        let margin = if order.total_cents > 0 {
            profit as f64 / order.total_cents as f64
        } else {
            0.0
        };

        let template = MovementRow {
            id: movement_id.clone(),
            receipt_number: String::new(),
            movement_type: MovementType::Outbound.to_string(),
            sub_type: "online_order".to_string(),
            order_id: Some(order.id.clone()),
            status: MovementStatus::Pending.to_string(),
            total_cost_cents: total_cost,
            total_value_cents: total_value,
            discount_cents: order.discount_cents,
            tax_cents: order.tax_cents,
            profit_cents: profit,
            profit_margin: margin,
            created_at: String::new(),
            updated_at: String::new(),
        };
        self.insert_with_receipt(MovementType::Outbound, template, &items, &deltas, actor)
            .await?;
        self.get(&movement_id).await
    }

    async fn update_movement_status(
        &self,
        movement_id: &str,
        new_status: MovementStatus,
        actor: &str,
        note: Option<String>,
    ) -> Result<Movement, ShipwrightError> {
        let current = self.get(movement_id).await?;
        if current.status == new_status {
            // Tolerates retried requests without duplicating history.
            return Ok(current);
        }
        if !current.status.can_transition_to(new_status) {
            return Err(ShipwrightError::InvalidMovementTransition {
                from: current.status,
                to: new_status,
            });
        }

        // Cancelling undoes the stock effect recorded at creation.
        let deltas: Vec<(String, i64)> = if new_status == MovementStatus::Cancelled {
            let sign = match current.movement_type {
                MovementType::Outbound => 1,
                MovementType::Inbound => -1,
            };
            current
                .items
                .iter()
                .map(|item| (item.sku.clone(), sign * item.quantity))
                .collect()
        } else {
            Vec::new()
        };

        let outcome = movements::update_status_guarded(
            &self.db,
            movement_id,
            &current.status.to_string(),
            &new_status.to_string(),
            actor,
            note,
            &deltas,
        )
        .await?;
        match outcome {
            movements::UpdateOutcome::Updated => self.get(movement_id).await,
            movements::UpdateOutcome::StaleStatus => {
                // Lost a race: re-read and re-judge against the fresh status.
                let fresh = self.get(movement_id).await?;
                if fresh.status == new_status {
                    return Ok(fresh);
                }
                Err(ShipwrightError::InvalidMovementTransition {
                    from: fresh.status,
                    to: new_status,
                })
            }
            movements::UpdateOutcome::InsufficientStock { sku } => {
                // Undoing the movement would drive live stock negative, so
                // the cancel is refused and the movement stays as it was.
                let order_id = current
                    .order_id
                    .clone()
                    .unwrap_or_else(|| movement_id.to_string());
                Err(ledger_write_failed(
                    &order_id,
                    format!("cancelling would drive stock for sku {sku} negative"),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipwright_core::{OrderLine, OrderStatus};

    async fn setup() -> (Arc<Database>, MovementLedger) {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let ledger = MovementLedger::new(db.clone());
        (db, ledger)
    }

    async fn seed_sku(db: &Database, sku: &str, quantity: i64, cost_cents: i64) {
        stock::upsert_level(db, sku, "p1", quantity, cost_cents)
            .await
            .unwrap();
    }

    fn order(id: &str, sku: &str, quantity: i64, unit_price: i64) -> OrderSnapshot {
        OrderSnapshot {
            id: id.to_string(),
            status: OrderStatus::Pending,
            account_email: Some("buyer@example.com".to_string()),
            shipping_email: None,
            lines: vec![OrderLine {
                product_id: "p1".to_string(),
                sku: sku.to_string(),
                quantity,
                unit_price_cents: unit_price,
            }],
            subtotal_cents: quantity * unit_price,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: quantity * unit_price,
            tracking_number: None,
            outbound_id: None,
        }
    }

    #[tokio::test]
    async fn outbound_computes_costs_and_snapshots() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 10, 400).await;

        let movement = ledger
            .create_outbound(&order("ord-1", "SKU-A", 3, 1000), "admin:1")
            .await
            .unwrap();

        assert!(movement.receipt_number.starts_with("OUT-"));
        assert!(movement.receipt_number.ends_with("-001"));
        assert_eq!(movement.status, MovementStatus::Pending);
        assert_eq!(movement.total_cost_cents, 1200);
        assert_eq!(movement.total_value_cents, 3000);
        assert_eq!(movement.profit_cents, 1800);
        assert!((movement.profit_margin - 0.6).abs() < 1e-9);

        let item = &movement.items[0];
        assert_eq!(item.quantity_before, 10);
        assert_eq!(item.quantity_after, 7);

        // Live stock decremented to match the snapshot.
        let level = stock::get_level(&db, "SKU-A").await.unwrap().unwrap();
        assert_eq!(level.quantity, 7);

        assert_eq!(movement.history.len(), 1);
        assert_eq!(movement.history.last().unwrap().action, "created");
    }

    #[tokio::test]
    async fn total_value_honors_discount_and_tax() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 10, 400).await;

        let mut snapshot = order("ord-1", "SKU-A", 3, 1000);
        snapshot.discount_cents = 500;
        snapshot.tax_cents = 250;
        snapshot.total_cents = 2750;

        let movement = ledger.create_outbound(&snapshot, "admin:1").await.unwrap();
        // Sum of item values minus discounts plus tax.
        assert_eq!(movement.total_value_cents, 3000 - 500 + 250);
        assert_eq!(movement.profit_cents, 2750 - 1200);
    }

    #[tokio::test]
    async fn second_create_returns_existing_movement() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 10, 400).await;
        let snapshot = order("ord-1", "SKU-A", 3, 1000);

        let first = ledger.create_outbound(&snapshot, "admin:1").await.unwrap();
        let second = ledger.create_outbound(&snapshot, "admin:1").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.receipt_number, second.receipt_number);
        // Stock was decremented exactly once.
        let level = stock::get_level(&db, "SKU-A").await.unwrap().unwrap();
        assert_eq!(level.quantity, 7);
    }

    #[tokio::test]
    async fn concurrent_creates_yield_one_movement() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 10, 400).await;
        let ledger = Arc::new(ledger);
        let snapshot = order("ord-1", "SKU-A", 3, 1000);

        let a = {
            let ledger = ledger.clone();
            let snapshot = snapshot.clone();
            tokio::spawn(async move { ledger.create_outbound(&snapshot, "admin:1").await })
        };
        let b = {
            let ledger = ledger.clone();
            let snapshot = snapshot.clone();
            tokio::spawn(async move { ledger.create_outbound(&snapshot, "admin:2").await })
        };
        let first = a.await.unwrap().unwrap();
        let second = b.await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        let all = ledger.list(&MovementQuery::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(
            stock::get_level(&db, "SKU-A").await.unwrap().unwrap().quantity,
            7
        );
    }

    #[tokio::test]
    async fn missing_stock_record_fails_without_a_movement() {
        let (_db, ledger) = setup().await;
        let err = ledger
            .create_outbound(&order("ord-1", "SKU-MISSING", 1, 1000), "admin:1")
            .await
            .unwrap_err();
        assert!(matches!(err, ShipwrightError::LedgerWriteFailed { .. }));
        assert!(ledger.list(&MovementQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insufficient_stock_fails_without_a_movement() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 2, 400).await;

        let err = ledger
            .create_outbound(&order("ord-1", "SKU-A", 3, 1000), "admin:1")
            .await
            .unwrap_err();
        assert!(matches!(err, ShipwrightError::LedgerWriteFailed { .. }));
        assert!(ledger.list(&MovementQuery::default()).await.unwrap().is_empty());
        assert_eq!(
            stock::get_level(&db, "SKU-A").await.unwrap().unwrap().quantity,
            2
        );
    }

    #[tokio::test]
    async fn receipt_ordinals_increment_within_a_day() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 10, 400).await;

        let first = ledger
            .create_outbound(&order("ord-1", "SKU-A", 1, 1000), "admin:1")
            .await
            .unwrap();
        let second = ledger
            .create_outbound(&order("ord-2", "SKU-A", 1, 1000), "admin:1")
            .await
            .unwrap();

        assert!(first.receipt_number.ends_with("-001"));
        assert!(second.receipt_number.ends_with("-002"));
    }

    #[tokio::test]
    async fn status_lattice_is_enforced_with_history() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 10, 400).await;
        let movement = ledger
            .create_outbound(&order("ord-1", "SKU-A", 3, 1000), "admin:1")
            .await
            .unwrap();

        // pending -> completed skips approval.
        let err = ledger
            .update_movement_status(&movement.id, MovementStatus::Completed, "admin:1", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShipwrightError::InvalidMovementTransition { .. }
        ));

        let approved = ledger
            .update_movement_status(&movement.id, MovementStatus::Approved, "admin:1", None)
            .await
            .unwrap();
        assert_eq!(approved.status, MovementStatus::Approved);

        let completed = ledger
            .update_movement_status(
                &movement.id,
                MovementStatus::Completed,
                "admin:1",
                Some("handed to carrier".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(completed.status, MovementStatus::Completed);

        let actions: Vec<_> = completed.history.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["created", "status:approved", "status:completed"]);
        assert_eq!(
            completed.history.last().unwrap().note.as_deref(),
            Some("handed to carrier")
        );

        // Completion does not touch stock again.
        assert_eq!(
            stock::get_level(&db, "SKU-A").await.unwrap().unwrap().quantity,
            7
        );
    }

    #[tokio::test]
    async fn repeated_status_update_is_a_noop() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 10, 400).await;
        let movement = ledger
            .create_outbound(&order("ord-1", "SKU-A", 3, 1000), "admin:1")
            .await
            .unwrap();

        let once = ledger
            .update_movement_status(&movement.id, MovementStatus::Approved, "admin:1", None)
            .await
            .unwrap();
        let twice = ledger
            .update_movement_status(&movement.id, MovementStatus::Approved, "admin:1", None)
            .await
            .unwrap();

        assert_eq!(once.history.len(), 2);
        assert_eq!(twice.history.len(), 2);
    }

    #[tokio::test]
    async fn cancelling_an_outbound_restores_stock() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 10, 400).await;
        let movement = ledger
            .create_outbound(&order("ord-1", "SKU-A", 3, 1000), "admin:1")
            .await
            .unwrap();
        assert_eq!(
            stock::get_level(&db, "SKU-A").await.unwrap().unwrap().quantity,
            7
        );

        let cancelled = ledger
            .update_movement_status(&movement.id, MovementStatus::Cancelled, "system", None)
            .await
            .unwrap();
        assert_eq!(cancelled.status, MovementStatus::Cancelled);
        assert_eq!(
            stock::get_level(&db, "SKU-A").await.unwrap().unwrap().quantity,
            10
        );

        // Snapshots on the cancelled movement are untouched.
        assert_eq!(cancelled.items[0].quantity_after, 7);
    }

    #[tokio::test]
    async fn inbound_adds_stock_and_sets_cost_basis() {
        let (db, ledger) = setup().await;

        let movement = ledger
            .create_inbound(
                &[InboundLine {
                    product_id: "p1".to_string(),
                    sku: "SKU-NEW".to_string(),
                    quantity: 20,
                    unit_cost_cents: 350,
                    unit_value_cents: 900,
                }],
                "manual",
                "staff:7",
            )
            .await
            .unwrap();

        assert!(movement.receipt_number.starts_with("IN-"));
        assert_eq!(movement.movement_type, MovementType::Inbound);
        assert_eq!(movement.items[0].quantity_before, 0);
        assert_eq!(movement.items[0].quantity_after, 20);

        let level = stock::get_level(&db, "SKU-NEW").await.unwrap().unwrap();
        assert_eq!(level.quantity, 20);
        assert_eq!(level.cost_cents, 350);
    }

    #[tokio::test]
    async fn inbound_cancel_is_refused_once_the_stock_was_sold() {
        let (db, ledger) = setup().await;

        let inbound = ledger
            .create_inbound(
                &[InboundLine {
                    product_id: "p1".to_string(),
                    sku: "SKU-A".to_string(),
                    quantity: 20,
                    unit_cost_cents: 350,
                    unit_value_cents: 900,
                }],
                "manual",
                "staff:7",
            )
            .await
            .unwrap();
        ledger
            .create_outbound(&order("ord-1", "SKU-A", 15, 900), "admin:1")
            .await
            .unwrap();

        // Only 5 units remain, so undoing the 20-unit receipt cannot apply.
        let err = ledger
            .update_movement_status(&inbound.id, MovementStatus::Cancelled, "staff:7", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShipwrightError::LedgerWriteFailed { .. }));

        let level = stock::get_level(&db, "SKU-A").await.unwrap().unwrap();
        assert_eq!(level.quantity, 5);
        let fresh = ledger.get(&inbound.id).await.unwrap();
        assert_eq!(fresh.status, MovementStatus::Pending);
    }

    #[tokio::test]
    async fn zero_total_guards_the_margin_division() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 10, 0).await;

        let mut snapshot = order("ord-1", "SKU-A", 1, 0);
        snapshot.total_cents = 0;
        let movement = ledger.create_outbound(&snapshot, "admin:1").await.unwrap();
        assert_eq!(movement.profit_margin, 0.0);
    }

    #[tokio::test]
    async fn list_filters_by_type() {
        let (db, ledger) = setup().await;
        seed_sku(&db, "SKU-A", 10, 400).await;
        ledger
            .create_outbound(&order("ord-1", "SKU-A", 1, 1000), "admin:1")
            .await
            .unwrap();
        ledger
            .create_inbound(
                &[InboundLine {
                    product_id: "p1".to_string(),
                    sku: "SKU-A".to_string(),
                    quantity: 5,
                    unit_cost_cents: 400,
                    unit_value_cents: 1000,
                }],
                "manual",
                "staff:7",
            )
            .await
            .unwrap();

        let outbound = ledger
            .list(&MovementQuery {
                movement_type: Some(MovementType::Outbound),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].movement_type, MovementType::Outbound);

        let all = ledger.list(&MovementQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
