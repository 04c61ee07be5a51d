// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the admin API.
//!
//! Handlers stay thin: decode the request, call one component, encode the
//! result. All domain decisions (transition legality, receipt allocation,
//! retry eligibility) live in the components.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shipwright_core::{Actor, HistoryEntry, Movement, MovementType, OrderSnapshot, OrderStatus};
use shipwright_ledger::{InboundLine, MovementQuery, MovementSummary, StockCheck};
use shipwright_notify::{JobDetail, QueueStatus};
use shipwright_orders::OrderStateMachine;
use shipwright_storage::models::OperatorAlertRow;
use shipwright_storage::queries::alerts;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "shipwright",
    })
}

// ---- orders ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

pub async fn post_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<OrderSnapshot>, ApiError> {
    let order = state
        .orders
        .request_transition(
            &order_id,
            body.status,
            &actor,
            body.note,
            body.tracking_number,
        )
        .await?;
    Ok(Json(order))
}

#[derive(Serialize)]
pub struct OrderDetail {
    pub order: OrderSnapshot,
    pub history: Vec<HistoryEntry>,
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderDetail>, ApiError> {
    let order = state.orders.get_order(&order_id).await?;
    let history = state.orders.history(&order_id).await?;
    Ok(Json(OrderDetail { order, history }))
}

#[derive(Deserialize)]
pub struct TransitionsQuery {
    #[serde(default)]
    pub current_status: Option<OrderStatus>,
}

#[derive(Serialize)]
pub struct TransitionsResponse {
    pub order_id: String,
    pub current_status: OrderStatus,
    pub transitions: Vec<OrderStatus>,
}

/// Legal next statuses for the caller's role, either from the order's
/// stored status or from an explicit `current_status` override.
pub async fn get_order_transitions(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<TransitionsQuery>,
) -> Result<Json<TransitionsResponse>, ApiError> {
    let current = match query.current_status {
        Some(status) => status,
        None => state.orders.get_order(&order_id).await?.status,
    };
    Ok(Json(TransitionsResponse {
        order_id,
        current_status: current,
        transitions: OrderStateMachine::available_transitions(current, actor.role),
    }))
}

// ---- movements ----

#[derive(Deserialize)]
pub struct MovementListQuery {
    #[serde(default, rename = "type")]
    pub movement_type: Option<MovementType>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Serialize)]
pub struct MovementListResponse {
    pub movements: Vec<MovementSummary>,
}

pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementListQuery>,
) -> Result<Json<MovementListResponse>, ApiError> {
    let movements = state
        .ledger
        .list(&MovementQuery {
            movement_type: query.movement_type,
            from: query.from,
            to: query.to,
        })
        .await?;
    Ok(Json(MovementListResponse { movements }))
}

pub async fn get_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<String>,
) -> Result<Json<Movement>, ApiError> {
    Ok(Json(state.ledger.get(&movement_id).await?))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InboundLineRequest {
    pub product_id: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub unit_value_cents: i64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InboundRequest {
    #[serde(default = "default_inbound_sub_type")]
    pub sub_type: String,
    pub lines: Vec<InboundLineRequest>,
}

fn default_inbound_sub_type() -> String {
    "manual".to_string()
}

pub async fn post_inbound_movement(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<InboundRequest>,
) -> Result<Json<Movement>, ApiError> {
    if body.lines.is_empty() {
        return Err(ApiError::BadRequest(
            "an inbound movement needs at least one line".to_string(),
        ));
    }
    if body.lines.iter().any(|line| line.quantity <= 0) {
        return Err(ApiError::BadRequest(
            "inbound quantities must be positive".to_string(),
        ));
    }
    let lines: Vec<InboundLine> = body
        .lines
        .into_iter()
        .map(|line| InboundLine {
            product_id: line.product_id,
            sku: line.sku,
            quantity: line.quantity,
            unit_cost_cents: line.unit_cost_cents,
            unit_value_cents: line.unit_value_cents,
        })
        .collect();
    let actor_tag = format!("{}:{}", actor.role, actor.id);
    let movement = state
        .ledger
        .create_inbound(&lines, &body.sub_type, &actor_tag)
        .await?;
    Ok(Json(movement))
}

// ---- notification queue ----

pub async fn get_queue_status(
    State(state): State<AppState>,
) -> Result<Json<QueueStatus>, ApiError> {
    Ok(Json(state.queue.status().await?))
}

pub async fn get_queue_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobDetail>, ApiError> {
    Ok(Json(state.queue.job(&job_id).await?))
}

pub async fn retry_queue_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobDetail>, ApiError> {
    Ok(Json(state.queue.retry(&job_id).await?))
}

#[derive(Serialize)]
pub struct ClearCompletedResponse {
    pub removed: usize,
}

pub async fn clear_completed_jobs(
    State(state): State<AppState>,
) -> Result<Json<ClearCompletedResponse>, ApiError> {
    let removed = state.queue.clear_completed().await?;
    Ok(Json(ClearCompletedResponse { removed }))
}

// ---- operator alerts ----

#[derive(Deserialize)]
pub struct AlertsQuery {
    #[serde(default = "default_alert_limit")]
    pub limit: i64,
}

fn default_alert_limit() -> i64 {
    50
}

#[derive(Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<OperatorAlertRow>,
}

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<AlertsResponse>, ApiError> {
    let alerts = alerts::list_alerts(&state.db, query.limit).await?;
    Ok(Json(AlertsResponse { alerts }))
}

// ---- stock checks ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenCheckRequest {
    pub scope: String,
}

pub async fn post_stock_check(
    State(state): State<AppState>,
    Json(body): Json<OpenCheckRequest>,
) -> Result<Json<StockCheck>, ApiError> {
    Ok(Json(state.stock_checks.open(&body.scope).await?))
}

pub async fn get_stock_check(
    State(state): State<AppState>,
    Path(check_id): Path<String>,
) -> Result<Json<StockCheck>, ApiError> {
    Ok(Json(state.stock_checks.get(&check_id).await?))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordCountRequest {
    pub sku: String,
    pub counted_quantity: i64,
}

pub async fn post_stock_check_count(
    State(state): State<AppState>,
    Path(check_id): Path<String>,
    Json(body): Json<RecordCountRequest>,
) -> Result<Json<StockCheck>, ApiError> {
    if body.counted_quantity < 0 {
        return Err(ApiError::BadRequest(
            "counted quantity cannot be negative".to_string(),
        ));
    }
    state
        .stock_checks
        .record_count(&check_id, &body.sku, body.counted_quantity)
        .await?;
    Ok(Json(state.stock_checks.get(&check_id).await?))
}

pub async fn post_stock_check_complete(
    State(state): State<AppState>,
    Path(check_id): Path<String>,
) -> Result<Json<StockCheck>, ApiError> {
    Ok(Json(state.stock_checks.complete(&check_id).await?))
}
