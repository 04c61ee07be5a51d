// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `shipwright serve` command implementation.
//!
//! Wires the components together and runs them until a shutdown signal:
//! open the database, start the notification worker, then serve the
//! gateway. Shutdown order is the reverse: stop accepting requests, stop
//! the worker mid-claim-safe, checkpoint and close the database.

use std::sync::Arc;

use shipwright_config::ShipwrightConfig;
use shipwright_core::{Mailer, ShipwrightError};
use shipwright_gateway::{AppState, TokenVerifier};
use shipwright_ledger::{MovementLedger, StockChecker};
use shipwright_notify::smtp::{LogMailer, SmtpMailer};
use shipwright_notify::{NotificationQueue, QueueProcessor};
use shipwright_orders::OrderStateMachine;
use shipwright_storage::Database;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `shipwright serve` command.
pub async fn run_serve(config: ShipwrightConfig) -> Result<(), ShipwrightError> {
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting shipwright serve");

    let db = Arc::new(Database::open(&config.storage.database_path).await?);

    let ledger = Arc::new(MovementLedger::new(db.clone()));
    let queue = Arc::new(NotificationQueue::new(db.clone(), config.queue.clone()));
    let orders = Arc::new(OrderStateMachine::new(
        db.clone(),
        ledger.clone(),
        queue.clone(),
    ));
    let stock_checks = Arc::new(StockChecker::new(db.clone()));
    let verifier = Arc::new(TokenVerifier::from_config(&config.gateway)?);
    if config.gateway.tokens.is_empty() {
        warn!("no gateway tokens configured, every API request will be rejected");
    }

    let mailer: Arc<dyn Mailer> = if config.mail.smtp_host.is_some() {
        Arc::new(SmtpMailer::from_config(&config.mail)?)
    } else {
        warn!("mail.smtp_host not set, notifications will be logged instead of sent");
        Arc::new(LogMailer)
    };
    let worker = QueueProcessor::new(db.clone(), mailer, config.queue.clone())?.start();

    let cancel = shutdown::install_signal_handler();

    let state = AppState {
        db: db.clone(),
        orders,
        ledger,
        queue,
        stock_checks,
        verifier,
    };
    shipwright_gateway::serve(&config.gateway, state, cancel.clone().cancelled_owned()).await?;

    // The gateway has drained; stop the worker, then checkpoint and close.
    worker.stop().await;
    db.close().await?;

    info!("shipwright serve shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shipwright={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
