// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The asynchronous notification queue.
//!
//! Enqueue is synchronous and durable: the job row is committed before the
//! caller learns the job id, so an accepted notification survives a crash.
//! Delivery happens in the background worker ([`processor`]), decoupled
//! from the request that enqueued the job.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use shipwright_config::QueueConfig;
use shipwright_core::{
    JobState, NotificationKind, NotificationPayload, QueuePort, ShipwrightError,
};
use shipwright_storage::Database;
use shipwright_storage::models::JobRow;
use shipwright_storage::queries::jobs;
use tracing::{debug, info};
use uuid::Uuid;

pub mod backoff;
pub mod processor;
pub mod smtp;
pub mod template;

pub use processor::{QueueProcessor, WorkerHandle};

/// Per-state job counts, as reported by the status endpoint. Carries the
/// creation time of the oldest still-queued job so operators can spot a
/// stalled backlog.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QueueStatus {
    pub queued: i64,
    pub in_flight: i64,
    pub completed: i64,
    pub failed: i64,
    pub oldest_queued_at: Option<String>,
}

/// Full job detail, including delivery bookkeeping and the decoded payload.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    pub id: String,
    pub kind: NotificationKind,
    pub state: JobState,
    pub attempts: i64,
    pub max_attempts: i64,
    pub last_error: Option<String>,
    pub created_at: String,
    pub next_attempt_at: String,
    pub completed_at: Option<String>,
    pub payload: NotificationPayload,
}

fn job_detail(row: JobRow) -> Result<JobDetail, ShipwrightError> {
    let kind = NotificationKind::from_str(&row.kind)
        .map_err(|_| ShipwrightError::Internal(format!("unrecognized job kind: {}", row.kind)))?;
    let state = JobState::from_str(&row.state)
        .map_err(|_| ShipwrightError::Internal(format!("unrecognized job state: {}", row.state)))?;
    let payload: NotificationPayload = serde_json::from_str(&row.payload)
        .map_err(|e| ShipwrightError::Internal(format!("undecodable job payload: {e}")))?;
    Ok(JobDetail {
        id: row.id,
        kind,
        state,
        attempts: row.attempts,
        max_attempts: row.max_attempts,
        last_error: row.last_error,
        created_at: row.created_at,
        next_attempt_at: row.next_attempt_at,
        completed_at: row.completed_at,
        payload,
    })
}

/// The queue component: durable enqueue plus the operator surface.
pub struct NotificationQueue {
    db: Arc<Database>,
    config: QueueConfig,
}

impl NotificationQueue {
    pub fn new(db: Arc<Database>, config: QueueConfig) -> Self {
        Self { db, config }
    }

    /// Counts per job state.
    pub async fn status(&self) -> Result<QueueStatus, ShipwrightError> {
        let counts = jobs::counts(&self.db).await?;
        Ok(QueueStatus {
            queued: counts.queued,
            in_flight: counts.in_flight,
            completed: counts.completed,
            failed: counts.failed,
            oldest_queued_at: counts.oldest_queued_at,
        })
    }

    /// Full detail for one job.
    pub async fn job(&self, id: &str) -> Result<JobDetail, ShipwrightError> {
        let row = jobs::get_job(&self.db, id)
            .await?
            .ok_or_else(|| ShipwrightError::NotFound {
                kind: "notification job",
                id: id.to_string(),
            })?;
        job_detail(row)
    }

    /// Operator action: move one failed job back to queued, granting it a
    /// fresh round of attempts on top of its preserved attempt count.
    pub async fn retry(&self, id: &str) -> Result<JobDetail, ShipwrightError> {
        let granted = i64::from(self.config.max_attempts);
        if !jobs::retry_job(&self.db, id, granted).await? {
            return Err(ShipwrightError::NotFound {
                kind: "failed notification job",
                id: id.to_string(),
            });
        }
        info!(job_id = id, granted, "failed job requeued by operator");
        self.job(id).await
    }

    /// Operator action: purge completed jobs older than the retention
    /// window. Returns the number removed.
    pub async fn clear_completed(&self) -> Result<usize, ShipwrightError> {
        let removed =
            jobs::clear_completed(&self.db, i64::from(self.config.retention_days)).await?;
        debug!(removed, "completed jobs cleared");
        Ok(removed)
    }
}

#[async_trait]
impl QueuePort for NotificationQueue {
    async fn enqueue(
        &self,
        kind: NotificationKind,
        payload: &NotificationPayload,
    ) -> Result<String, ShipwrightError> {
        let id = Uuid::new_v4().to_string();
        let encoded = serde_json::to_string(payload)
            .map_err(|e| ShipwrightError::Internal(format!("payload encoding failed: {e}")))?;
        jobs::enqueue(
            &self.db,
            &id,
            &kind.to_string(),
            &encoded,
            i64::from(self.config.max_attempts),
        )
        .await?;
        debug!(job_id = %id, kind = %kind, "notification job enqueued");
        Ok(id)
    }
}
