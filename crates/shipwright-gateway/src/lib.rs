// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the fulfillment core.
//!
//! A thin axum layer over the order state machine, the movement ledger,
//! and the notification queue. Every API route sits behind bearer-token
//! authentication; `/health` is the only public route.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Router, middleware};
use shipwright_core::ActorVerifier;
use shipwright_ledger::{MovementLedger, StockChecker};
use shipwright_notify::NotificationQueue;
use shipwright_orders::OrderStateMachine;
use shipwright_storage::Database;
use tower_http::cors::CorsLayer;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::TokenVerifier;
pub use server::serve;

/// Shared handler state: the components plus the verifier.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub orders: Arc<OrderStateMachine>,
    pub ledger: Arc<MovementLedger>,
    pub queue: Arc<NotificationQueue>,
    pub stock_checks: Arc<StockChecker>,
    pub verifier: Arc<dyn ActorVerifier>,
}

/// Assemble the full route tree.
pub fn router(state: AppState) -> Router {
    let public = Router::new().route("/health", get(handlers::health));

    let api = Router::new()
        .route("/orders/{id}", get(handlers::get_order))
        .route("/orders/{id}/status", post(handlers::post_order_status))
        .route(
            "/orders/{id}/status/transitions",
            get(handlers::get_order_transitions),
        )
        .route("/movements", get(handlers::list_movements))
        .route("/movements/inbound", post(handlers::post_inbound_movement))
        .route("/movements/{id}", get(handlers::get_movement))
        .route("/notification-queue/status", get(handlers::get_queue_status))
        .route(
            "/notification-queue/clear-completed",
            post(handlers::clear_completed_jobs),
        )
        .route("/notification-queue/{id}", get(handlers::get_queue_job))
        .route(
            "/notification-queue/{id}/retry",
            post(handlers::retry_queue_job),
        )
        .route("/alerts", get(handlers::list_alerts))
        .route("/stock-checks", post(handlers::post_stock_check))
        .route("/stock-checks/{id}", get(handlers::get_stock_check))
        .route(
            "/stock-checks/{id}/counts",
            post(handlers::post_stock_check_count),
        )
        .route(
            "/stock-checks/{id}/complete",
            post(handlers::post_stock_check_complete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_actor,
        ))
        .with_state(state.clone());

    Router::new()
        .merge(public)
        .merge(api)
        .layer(CorsLayer::permissive())
}
