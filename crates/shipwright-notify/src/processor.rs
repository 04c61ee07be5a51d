// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The background delivery worker.
//!
//! Dequeue is claim-then-process: a transaction moves the job to in_flight
//! and bumps its attempt count before any delivery work starts, so two
//! workers can never send the same job. The worker is a supervised task:
//! started at most once per handle, stopped by cancelling its token and
//! awaiting the task, never by a racily checked flag. Queued work is never
//! lost by a stop; it is simply picked up on the next start.

use std::sync::Arc;
use std::time::Duration;

use shipwright_config::QueueConfig;
use shipwright_core::{Mailer, NotificationPayload, ShipwrightError};
use shipwright_core::MailError;
use shipwright_storage::Database;
use shipwright_storage::models::JobRow;
use shipwright_storage::queries::jobs;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::BackoffPolicy;
use crate::template;

/// Margin added to the send timeout when computing the claim lock, so a
/// live worker never loses its claim mid-send.
const LOCK_MARGIN_SECS: u64 = 30;

/// A running worker. Dropping the handle without calling [`stop`] leaves
/// the task running until the process exits.
///
/// [`stop`]: WorkerHandle::stop
pub struct WorkerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the worker to stop and wait for it to finish its current
    /// job. Queued jobs stay queued.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "notification worker task panicked");
        }
    }
}

/// Drains due jobs and drives each through the mail transport.
pub struct QueueProcessor {
    db: Arc<Database>,
    mailer: Arc<dyn Mailer>,
    config: QueueConfig,
    policy: BackoffPolicy,
}

impl QueueProcessor {
    pub fn new(
        db: Arc<Database>,
        mailer: Arc<dyn Mailer>,
        config: QueueConfig,
    ) -> Result<Self, ShipwrightError> {
        let policy = BackoffPolicy::from_config(&config.backoff)?;
        Ok(Self {
            db,
            mailer,
            config,
            policy,
        })
    }

    /// Spawn the drain loop. Consumes the processor so one processor is
    /// exactly one running worker.
    pub fn start(self) -> WorkerHandle {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let task = tokio::spawn(async move {
            info!("notification worker started");
            self.run(loop_token).await;
            info!("notification worker stopped");
        });
        WorkerHandle { token, task }
    }

    async fn run(self, token: CancellationToken) {
        let idle = Duration::from_millis(self.config.poll_interval_ms);
        loop {
            if token.is_cancelled() {
                break;
            }
            let worked = match self.process_one().await {
                Ok(worked) => worked,
                Err(e) => {
                    warn!(error = %e, "job processing hit a storage error");
                    false
                }
            };
            if !worked {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(idle) => {}
                }
            }
        }
    }

    /// Claim and process at most one due job. Returns whether a job was
    /// claimed, so the loop can drain a backlog without idle sleeps.
    async fn process_one(&self) -> Result<bool, ShipwrightError> {
        let lock_secs = (self.config.send_timeout_secs + LOCK_MARGIN_SECS) as i64;
        let Some(job) = jobs::claim_due(&self.db, lock_secs).await? else {
            return Ok(false);
        };
        debug!(job_id = %job.id, attempt = job.attempts, "job claimed");

        // Malformed payloads can never deliver; retrying cannot fix them.
        let payload: NotificationPayload = match serde_json::from_str(&job.payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "malformed payload, job failed permanently");
                jobs::fail_permanent(&self.db, &job.id, &format!("malformed payload: {e}"))
                    .await?;
                return Ok(true);
            }
        };
        let Some(recipient) = payload.recipient.clone() else {
            warn!(job_id = %job.id, "payload has no recipient, job failed permanently");
            jobs::fail_permanent(&self.db, &job.id, "payload has no recipient").await?;
            return Ok(true);
        };

        let (subject, body) = template::render_status_changed(&payload);
        let send = self.mailer.send(&recipient, &subject, &body);
        let outcome =
            tokio::time::timeout(Duration::from_secs(self.config.send_timeout_secs), send).await;

        match outcome {
            Ok(Ok(message_id)) => {
                info!(job_id = %job.id, message_id, attempts = job.attempts, "notification delivered");
                if !jobs::complete(&self.db, &job.id).await? {
                    warn!(job_id = %job.id, "claim lapsed mid-send, outcome recorded elsewhere");
                }
            }
            Ok(Err(MailError::Permanent(message))) => {
                warn!(job_id = %job.id, %message, "permanent delivery failure");
                if !jobs::fail_permanent(&self.db, &job.id, &message).await? {
                    warn!(job_id = %job.id, "claim lapsed mid-send, outcome recorded elsewhere");
                }
            }
            Ok(Err(MailError::Transient(message))) => {
                self.retry_or_fail(&job, message).await?;
            }
            Err(_) => {
                let message = format!(
                    "send timed out after {}s",
                    self.config.send_timeout_secs
                );
                self.retry_or_fail(&job, message).await?;
            }
        }
        Ok(true)
    }

    async fn retry_or_fail(&self, job: &JobRow, message: String) -> Result<(), ShipwrightError> {
        if job.attempts >= job.max_attempts {
            warn!(
                job_id = %job.id,
                attempts = job.attempts,
                %message,
                "attempts exhausted, job failed"
            );
            if !jobs::fail_permanent(&self.db, &job.id, &message).await? {
                warn!(job_id = %job.id, "claim lapsed mid-send, outcome recorded elsewhere");
            }
        } else {
            let delay = self
                .policy
                .delay_secs(self.config.base_delay_secs, job.attempts);
            debug!(job_id = %job.id, attempt = job.attempts, delay, %message, "transient failure, retry scheduled");
            if !jobs::fail_retry(&self.db, &job.id, &message, delay).await? {
                warn!(job_id = %job.id, "claim lapsed mid-send, outcome recorded elsewhere");
            }
        }
        Ok(())
    }
}
