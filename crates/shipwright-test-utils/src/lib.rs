// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for component and gateway tests: a scriptable mail
//! transport, database seeding helpers, and a condition poller for
//! asserting on background-worker effects.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shipwright_core::{MailError, Mailer, OrderStatus};
use shipwright_storage::Database;
use shipwright_storage::models::{OrderItemRow, OrderRow};
use shipwright_storage::queries::{orders, stock};
use tokio::sync::Mutex;

/// One successfully "sent" message, as recorded by [`MockMailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// A scriptable in-memory mail transport.
///
/// Outcomes are consumed in order, one per send attempt; once the script
/// is exhausted every further send succeeds. Successful sends are
/// recorded for assertion.
pub struct MockMailer {
    script: Mutex<Vec<Result<(), MailError>>>,
    sent: Mutex<Vec<SentMail>>,
}

impl MockMailer {
    /// A mailer that always succeeds.
    pub fn reliable() -> Arc<Self> {
        Self::scripted(vec![])
    }

    /// A mailer that plays back the given outcomes, then succeeds.
    pub fn scripted(outcomes: Vec<Result<(), MailError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Convenience: fail transiently `n` times, then succeed.
    pub fn flaky(n: usize) -> Arc<Self> {
        Self::scripted(
            (0..n)
                .map(|i| Err(MailError::Transient(format!("connection reset ({i})"))))
                .collect(),
        )
    }

    /// Messages delivered so far.
    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, MailError> {
        let outcome = {
            let mut script = self.script.lock().await;
            if script.is_empty() {
                Ok(())
            } else {
                script.remove(0)
            }
        };
        outcome?;
        let mut sent = self.sent.lock().await;
        sent.push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(format!("msg-{}", sent.len()))
    }
}

/// Insert an order with one line (3 x SKU-A at 1000 cents) and seed its
/// stock level (10 units at 400 cents cost).
pub async fn seed_order_with_stock(db: &Database, order_id: &str, status: OrderStatus) {
    orders::insert_order(
        db,
        &OrderRow {
            id: order_id.to_string(),
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
            order_id: order_id.to_string(),
            product_id: "p1".to_string(),
            sku: "SKU-A".to_string(),
            quantity: 3,
            unit_price_cents: 1000,
        }],
    )
    .await
    .expect("seed order");
    stock::upsert_level(db, "SKU-A", "p1", 10, 400)
        .await
        .expect("seed stock");
}

/// Poll `cond` until it returns true or the deadline passes. Panics on
/// timeout so failing tests name the unmet condition.
pub async fn wait_for<F, Fut>(what: &str, deadline: Duration, mut cond: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    loop {
        if cond().await {
            return;
        }
        if start.elapsed() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
