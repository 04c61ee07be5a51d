// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The order state machine.
//!
//! Transitions are validated against the static table in [`transitions`],
//! then applied as an ordered sequence of durable writes: order first,
//! ledger second, notification last. A ledger failure after the order
//! write does not roll the order back; it is logged and surfaced as an
//! operator alert so fulfillment staff can reconcile, while the customer
//! sees their status change succeed.

use std::str::FromStr;
use std::sync::Arc;

use shipwright_core::{
    Actor, HistoryEntry, LedgerPort, MovementStatus, NotificationKind, NotificationPayload,
    OrderLine, OrderSnapshot, OrderStatus, QueuePort, ShipwrightError,
};
use shipwright_storage::Database;
use shipwright_storage::models::{OrderItemRow, OrderRow};
use shipwright_storage::queries::{alerts, orders};
use tracing::{debug, warn};

pub mod transitions;

fn snapshot_from_rows(row: OrderRow, items: Vec<OrderItemRow>) -> Result<OrderSnapshot, ShipwrightError> {
    let status = OrderStatus::from_str(&row.status)
        .map_err(|_| ShipwrightError::Internal(format!("unrecognized order status: {}", row.status)))?;
    Ok(OrderSnapshot {
        id: row.id,
        status,
        account_email: row.account_email,
        shipping_email: row.shipping_email,
        lines: items
            .into_iter()
            .map(|item| OrderLine {
                product_id: item.product_id,
                sku: item.sku,
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
            })
            .collect(),
        subtotal_cents: row.subtotal_cents,
        discount_cents: row.discount_cents,
        tax_cents: row.tax_cents,
        total_cents: row.total_cents,
        tracking_number: row.tracking_number,
        outbound_id: row.outbound_id,
    })
}

/// The state machine component. Depends on the ledger and the queue only
/// through their ports, so both can be faked in tests.
pub struct OrderStateMachine {
    db: Arc<Database>,
    ledger: Arc<dyn LedgerPort>,
    queue: Arc<dyn QueuePort>,
}

impl OrderStateMachine {
    pub fn new(db: Arc<Database>, ledger: Arc<dyn LedgerPort>, queue: Arc<dyn QueuePort>) -> Self {
        Self { db, ledger, queue }
    }

    /// Load an order projection.
    pub async fn get_order(&self, order_id: &str) -> Result<OrderSnapshot, ShipwrightError> {
        let (row, items) = orders::get_order(&self.db, order_id)
            .await?
            .ok_or_else(|| ShipwrightError::NotFound {
                kind: "order",
                id: order_id.to_string(),
            })?;
        snapshot_from_rows(row, items)
    }

    /// The order's role-stamped transition history, oldest first.
    pub async fn history(&self, order_id: &str) -> Result<Vec<HistoryEntry>, ShipwrightError> {
        let entries = orders::list_history(&self.db, order_id).await?;
        Ok(entries
            .into_iter()
            .map(|entry| HistoryEntry {
                action: entry.action,
                actor: entry.actor,
                timestamp: entry.created_at,
                note: entry.note,
            })
            .collect())
    }

    /// Legal next statuses for `(current, role)`. Backed by the same table
    /// as [`Self::request_transition`].
    pub fn available_transitions(current: OrderStatus, role: shipwright_core::ActorRole) -> Vec<OrderStatus> {
        transitions::allowed_targets(current, role).to_vec()
    }

    /// Validate and apply a status transition.
    ///
    /// Requesting the status the order is already in is a no-op success,
    /// so retried client requests are harmless. Validation always runs
    /// against the freshly re-read status, never one supplied by the
    /// caller.
    pub async fn request_transition(
        &self,
        order_id: &str,
        target: OrderStatus,
        actor: &Actor,
        note: Option<String>,
        tracking_number: Option<String>,
    ) -> Result<OrderSnapshot, ShipwrightError> {
        let snapshot = self.get_order(order_id).await?;
        if snapshot.status == target {
            debug!(order_id, status = %target, "transition is a no-op");
            return Ok(snapshot);
        }
        if !transitions::is_allowed(snapshot.status, actor.role, target) {
            return Err(ShipwrightError::InvalidTransition {
                from: snapshot.status,
                to: target,
                role: actor.role,
            });
        }

        let actor_tag = format!("{}:{}", actor.role, actor.id);

        // 1. The order mutation is durable before anything else happens.
        orders::update_status(
            &self.db,
            order_id,
            &target.to_string(),
            tracking_number,
            &actor_tag,
            note.clone(),
        )
        .await?;
        let updated = self.get_order(order_id).await?;

        // 2. Ledger side effect. Failure surfaces to the operator alert
        //    queue instead of rolling back the customer-visible change.
        if let Err(e) = self.apply_ledger_effect(&updated, target, &actor_tag).await {
            warn!(order_id, error = %e, "ledger side effect failed, order transition stands");
            alerts::insert_alert(
                &self.db,
                Some(order_id),
                None,
                &format!("ledger update for status '{target}' failed: {e}"),
            )
            .await?;
        }
        let updated = self.get_order(order_id).await?;

        // 3. Notification, self-contained so the worker never re-reads us.
        let payload = NotificationPayload {
            recipient: updated.contact_email().map(str::to_string),
            order_id: updated.id.clone(),
            status: target,
            tracking_number: updated.tracking_number.clone(),
            note,
            lines: updated.lines.clone(),
            total_cents: updated.total_cents,
        };
        match self.queue.enqueue(NotificationKind::StatusChanged, &payload).await {
            Ok(job_id) => debug!(order_id, job_id, "status notification enqueued"),
            Err(e) => {
                warn!(order_id, error = %e, "notification enqueue failed");
                alerts::insert_alert(
                    &self.db,
                    Some(order_id),
                    None,
                    &format!("notification enqueue for status '{target}' failed: {e}"),
                )
                .await?;
            }
        }

        Ok(updated)
    }

    /// Create the outbound movement on the first forward transition and map
    /// later order statuses onto the movement lattice.
    async fn apply_ledger_effect(
        &self,
        order: &OrderSnapshot,
        target: OrderStatus,
        actor_tag: &str,
    ) -> Result<(), ShipwrightError> {
        let outbound_id = match &order.outbound_id {
            Some(id) => id.clone(),
            None => {
                if target == OrderStatus::Cancelled {
                    // Nothing was ever picked, so there is nothing to undo.
                    return Ok(());
                }
                let movement = self.ledger.create_outbound(order, actor_tag).await?;
                if !orders::claim_outbound(&self.db, &order.id, &movement.id).await? {
                    // Raced with another transition; keep whichever back-
                    // reference won.
                    orders::get_outbound_id(&self.db, &order.id)
                        .await?
                        .unwrap_or_else(|| movement.id.clone())
                } else {
                    movement.id
                }
            }
        };

        let mapped = match target {
            OrderStatus::Processing => Some(MovementStatus::Approved),
            OrderStatus::Delivered => Some(MovementStatus::Completed),
            OrderStatus::Cancelled => Some(MovementStatus::Cancelled),
            _ => None,
        };
        if let Some(status) = mapped {
            self.ledger
                .update_movement_status(&outbound_id, status, actor_tag, None)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shipwright_core::{ActorRole, Movement};
    use shipwright_ledger::MovementLedger;
    use shipwright_storage::queries::stock;
    use tokio::sync::Mutex;

    struct RecordingQueue {
        jobs: Mutex<Vec<(NotificationKind, NotificationPayload)>>,
    }

    impl RecordingQueue {
        fn new() -> Self {
            Self {
                jobs: Mutex::new(Vec::new()),
            }
        }

        async fn enqueued(&self) -> Vec<(NotificationKind, NotificationPayload)> {
            self.jobs.lock().await.clone()
        }
    }

    #[async_trait]
    impl QueuePort for RecordingQueue {
        async fn enqueue(
            &self,
            kind: NotificationKind,
            payload: &NotificationPayload,
        ) -> Result<String, ShipwrightError> {
            let mut jobs = self.jobs.lock().await;
            jobs.push((kind, payload.clone()));
            Ok(format!("job-{}", jobs.len()))
        }
    }

    struct FailingLedger;

    #[async_trait]
    impl LedgerPort for FailingLedger {
        async fn create_outbound(
            &self,
            order: &OrderSnapshot,
            _actor: &str,
        ) -> Result<Movement, ShipwrightError> {
            Err(ShipwrightError::LedgerWriteFailed {
                order_id: order.id.clone(),
                source: "disk full".into(),
            })
        }

        async fn update_movement_status(
            &self,
            movement_id: &str,
            _new_status: MovementStatus,
            _actor: &str,
            _note: Option<String>,
        ) -> Result<Movement, ShipwrightError> {
            Err(ShipwrightError::LedgerWriteFailed {
                order_id: movement_id.to_string(),
                source: "disk full".into(),
            })
        }
    }

    struct Fixture {
        db: Arc<Database>,
        ledger: Arc<MovementLedger>,
        queue: Arc<RecordingQueue>,
        machine: OrderStateMachine,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let ledger = Arc::new(MovementLedger::new(db.clone()));
        let queue = Arc::new(RecordingQueue::new());
        let machine = OrderStateMachine::new(db.clone(), ledger.clone(), queue.clone());
        Fixture {
            db,
            ledger,
            queue,
            machine,
        }
    }

    async fn seed_order(db: &Database, id: &str, status: OrderStatus) {
        orders::insert_order(
            db,
            &OrderRow {
                id: id.to_string(),
                status: status.to_string(),
                account_email: Some("buyer@example.com".to_string()),
                shipping_email: None,
                subtotal_cents: 3000,
                discount_cents: 0,
                tax_cents: 0,
                total_cents: 3000,
                tracking_number: None,
                outbound_id: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
            &[OrderItemRow {
                order_id: id.to_string(),
                product_id: "p1".to_string(),
                sku: "SKU-A".to_string(),
                quantity: 3,
                unit_price_cents: 1000,
            }],
        )
        .await
        .unwrap();
        stock::upsert_level(db, "SKU-A", "p1", 10, 400).await.unwrap();
    }

    fn admin() -> Actor {
        Actor {
            id: "1".to_string(),
            role: ActorRole::Admin,
        }
    }

    fn staff() -> Actor {
        Actor {
            id: "7".to_string(),
            role: ActorRole::Staff,
        }
    }

    #[tokio::test]
    async fn admin_moves_pending_order_to_processing() {
        let f = fixture().await;
        seed_order(&f.db, "ord-1", OrderStatus::Pending).await;

        let updated = f
            .machine
            .request_transition("ord-1", OrderStatus::Processing, &admin(), None, None)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Processing);

        // An outbound movement exists and is approved.
        let outbound_id = updated.outbound_id.expect("outbound claimed on the order");
        let movement = f.ledger.get(&outbound_id).await.unwrap();
        assert_eq!(movement.status, MovementStatus::Approved);
        assert_eq!(movement.order_id.as_deref(), Some("ord-1"));

        // Exactly one status-changed notification was enqueued.
        let jobs = f.queue.enqueued().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].0, NotificationKind::StatusChanged);
        assert_eq!(jobs[0].1.status, OrderStatus::Processing);
        assert_eq!(jobs[0].1.recipient.as_deref(), Some("buyer@example.com"));
        assert_eq!(jobs[0].1.total_cents, 3000);
    }

    #[tokio::test]
    async fn backward_transition_is_rejected_unchanged() {
        let f = fixture().await;
        seed_order(&f.db, "ord-1", OrderStatus::Shipping).await;

        let err = f
            .machine
            .request_transition("ord-1", OrderStatus::Pending, &staff(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShipwrightError::InvalidTransition { .. }));

        let order = f.machine.get_order("ord-1").await.unwrap();
        assert_eq!(order.status, OrderStatus::Shipping);
        assert!(f.machine.history("ord-1").await.unwrap().is_empty());
        assert!(f.queue.enqueued().await.is_empty());
    }

    #[tokio::test]
    async fn repeated_request_is_a_noop_success() {
        let f = fixture().await;
        seed_order(&f.db, "ord-1", OrderStatus::Pending).await;

        f.machine
            .request_transition("ord-1", OrderStatus::Processing, &admin(), None, None)
            .await
            .unwrap();
        let again = f
            .machine
            .request_transition("ord-1", OrderStatus::Processing, &admin(), None, None)
            .await
            .unwrap();
        assert_eq!(again.status, OrderStatus::Processing);

        // One history entry, one notification: the retry added nothing.
        assert_eq!(f.machine.history("ord-1").await.unwrap().len(), 1);
        assert_eq!(f.queue.enqueued().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let f = fixture().await;
        let err = f
            .machine
            .request_transition("missing", OrderStatus::Processing, &admin(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShipwrightError::NotFound { kind: "order", .. }
        ));
    }

    #[tokio::test]
    async fn history_records_role_stamped_actions() {
        let f = fixture().await;
        seed_order(&f.db, "ord-1", OrderStatus::Pending).await;

        f.machine
            .request_transition(
                "ord-1",
                OrderStatus::Confirmed,
                &admin(),
                Some("payment captured".to_string()),
                None,
            )
            .await
            .unwrap();
        f.machine
            .request_transition("ord-1", OrderStatus::Processing, &staff(), None, None)
            .await
            .unwrap();

        let history = f.machine.history("ord-1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, "status:confirmed");
        assert_eq!(history[0].actor, "admin:1");
        assert_eq!(history[0].note.as_deref(), Some("payment captured"));
        assert_eq!(history[1].action, "status:processing");
        assert_eq!(history[1].actor, "staff:7");
    }

    #[tokio::test]
    async fn tracking_number_is_set_and_preserved() {
        let f = fixture().await;
        seed_order(&f.db, "ord-1", OrderStatus::Processing).await;

        let updated = f
            .machine
            .request_transition(
                "ord-1",
                OrderStatus::Shipping,
                &staff(),
                None,
                Some("TRACK-123".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(updated.tracking_number.as_deref(), Some("TRACK-123"));

        // A later transition without a tracking number keeps the old one.
        let delivered = f
            .machine
            .request_transition("ord-1", OrderStatus::Delivered, &staff(), None, None)
            .await
            .unwrap();
        assert_eq!(delivered.tracking_number.as_deref(), Some("TRACK-123"));

        // The notification carried the tracking number.
        let jobs = f.queue.enqueued().await;
        assert_eq!(jobs[0].1.tracking_number.as_deref(), Some("TRACK-123"));
    }

    #[tokio::test]
    async fn full_lifecycle_maps_onto_the_movement_lattice() {
        let f = fixture().await;
        seed_order(&f.db, "ord-1", OrderStatus::Pending).await;
        let actor = admin();

        for target in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipping,
            OrderStatus::Delivered,
        ] {
            f.machine
                .request_transition("ord-1", target, &actor, None, None)
                .await
                .unwrap();
        }

        let order = f.machine.get_order("ord-1").await.unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        let movement = f.ledger.get(order.outbound_id.as_deref().unwrap()).await.unwrap();
        assert_eq!(movement.status, MovementStatus::Completed);
        assert_eq!(f.queue.enqueued().await.len(), 4);
    }

    #[tokio::test]
    async fn cancellation_cancels_the_movement_and_restores_stock() {
        let f = fixture().await;
        seed_order(&f.db, "ord-1", OrderStatus::Pending).await;

        f.machine
            .request_transition("ord-1", OrderStatus::Processing, &admin(), None, None)
            .await
            .unwrap();
        assert_eq!(
            stock::get_level(&f.db, "SKU-A").await.unwrap().unwrap().quantity,
            7
        );

        f.machine
            .request_transition("ord-1", OrderStatus::Cancelled, &admin(), None, None)
            .await
            .unwrap();

        let order = f.machine.get_order("ord-1").await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        let movement = f.ledger.get(order.outbound_id.as_deref().unwrap()).await.unwrap();
        assert_eq!(movement.status, MovementStatus::Cancelled);
        assert_eq!(
            stock::get_level(&f.db, "SKU-A").await.unwrap().unwrap().quantity,
            10
        );
    }

    #[tokio::test]
    async fn system_cancels_pending_but_not_shipping() {
        let f = fixture().await;
        seed_order(&f.db, "ord-1", OrderStatus::Pending).await;
        let system = Actor {
            id: "scheduler".to_string(),
            role: ActorRole::System,
        };

        let updated = f
            .machine
            .request_transition("ord-1", OrderStatus::Cancelled, &system, None, None)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Cancelled);
        // No outbound ever existed, so none was created to cancel.
        assert!(updated.outbound_id.is_none());

        seed_order(&f.db, "ord-2", OrderStatus::Shipping).await;
        let err = f
            .machine
            .request_transition("ord-2", OrderStatus::Cancelled, &system, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShipwrightError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn ledger_failure_alerts_but_does_not_block() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let queue = Arc::new(RecordingQueue::new());
        let machine = OrderStateMachine::new(db.clone(), Arc::new(FailingLedger), queue.clone());
        seed_order(&db, "ord-1", OrderStatus::Pending).await;

        let updated = machine
            .request_transition("ord-1", OrderStatus::Processing, &admin(), None, None)
            .await
            .unwrap();

        // The customer-visible change stands.
        assert_eq!(updated.status, OrderStatus::Processing);
        // The inconsistency went to the operator queue.
        let recorded = alerts::list_alerts(&db, 10).await.unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].order_id.as_deref(), Some("ord-1"));
        assert!(recorded[0].message.contains("disk full"));
        // The notification still went out.
        assert_eq!(queue.enqueued().await.len(), 1);
    }

    #[tokio::test]
    async fn available_transitions_match_the_table() {
        assert_eq!(
            OrderStateMachine::available_transitions(OrderStatus::Pending, ActorRole::Admin),
            vec![
                OrderStatus::Confirmed,
                OrderStatus::Processing,
                OrderStatus::Cancelled
            ],
        );
        assert!(
            OrderStateMachine::available_transitions(OrderStatus::Delivered, ActorRole::Admin)
                .is_empty()
        );
    }
}
