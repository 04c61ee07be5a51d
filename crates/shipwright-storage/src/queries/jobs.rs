// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification job persistence.
//!
//! Jobs survive restarts: enqueue writes the row before any delivery is
//! attempted, and the claim is a single transaction that moves the job to
//! in_flight and bumps `attempts`. A job stuck in_flight past its
//! `locked_until` is reclaimable, so a crash mid-delivery never strands it.

use rusqlite::{OptionalExtension, params};
use shipwright_core::ShipwrightError;

use crate::database::{Database, map_tr_err};
use crate::models::JobRow;

const JOB_COLUMNS: &str = "id, kind, payload, state, attempts, max_attempts, last_error, \
     created_at, next_attempt_at, locked_until, completed_at";

fn row_to_job(row: &rusqlite::Row<'_>) -> Result<JobRow, rusqlite::Error> {
    Ok(JobRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        payload: row.get(2)?,
        state: row.get(3)?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        last_error: row.get(6)?,
        created_at: row.get(7)?,
        next_attempt_at: row.get(8)?,
        locked_until: row.get(9)?,
        completed_at: row.get(10)?,
    })
}

/// Per-state job counts for the queue status endpoint, plus the creation
/// time of the oldest still-queued job (a backlog indicator).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub queued: i64,
    pub in_flight: i64,
    pub completed: i64,
    pub failed: i64,
    pub oldest_queued_at: Option<String>,
}

/// Insert a new queued job, due immediately.
pub async fn enqueue(
    db: &Database,
    id: &str,
    kind: &str,
    payload: &str,
    max_attempts: i64,
) -> Result<(), ShipwrightError> {
    let id = id.to_string();
    let kind = kind.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO notification_jobs (id, kind, payload, max_attempts) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, kind, payload, max_attempts],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Claim the oldest due job: oldest `queued` row whose `next_attempt_at` has
/// passed, or an `in_flight` row whose lock expired (crashed worker).
///
/// The claim transaction moves the job to in_flight, increments `attempts`,
/// and sets `locked_until` so no other claimer can pick it up.
pub async fn claim_due(db: &Database, lock_secs: i64) -> Result<Option<JobRow>, ShipwrightError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let candidate: Option<String> = tx
                .query_row(
                    "SELECT id FROM notification_jobs \
                     WHERE (state = 'queued' AND next_attempt_at <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now')) \
                        OR (state = 'in_flight' AND locked_until <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now')) \
                     ORDER BY next_attempt_at ASC, created_at ASC, rowid ASC \
                     LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(id) = candidate else {
                return Ok(None);
            };
            tx.execute(
                "UPDATE notification_jobs SET state = 'in_flight', attempts = attempts + 1, \
                 locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+' || ?2 || ' seconds') \
                 WHERE id = ?1",
                params![id, lock_secs],
            )?;
            let job = tx.query_row(
                &format!("SELECT {JOB_COLUMNS} FROM notification_jobs WHERE id = ?1"),
                params![id],
                |row| row_to_job(row),
            )?;
            tx.commit()?;
            Ok(Some(job))
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a claimed job delivered.
///
/// Guarded on `in_flight`: a worker whose claim lapsed and was reclaimed
/// cannot overwrite the later outcome. Returns whether the row changed.
pub async fn complete(db: &Database, id: &str) -> Result<bool, ShipwrightError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE notification_jobs SET state = 'completed', locked_until = NULL, \
                 completed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ?1 AND state = 'in_flight'",
                params![id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Return a claimed job to the queue after a transient failure, due again
/// after `delay_secs`. Guarded on `in_flight` like [`complete`].
pub async fn fail_retry(
    db: &Database,
    id: &str,
    error: &str,
    delay_secs: i64,
) -> Result<bool, ShipwrightError> {
    let id = id.to_string();
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE notification_jobs SET state = 'queued', locked_until = NULL, \
                 last_error = ?2, \
                 next_attempt_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+' || ?3 || ' seconds') \
                 WHERE id = ?1 AND state = 'in_flight'",
                params![id, error, delay_secs],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Park a job as failed: attempts exhausted or a permanent delivery error.
/// Guarded on `in_flight` like [`complete`].
pub async fn fail_permanent(db: &Database, id: &str, error: &str) -> Result<bool, ShipwrightError> {
    let id = id.to_string();
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE notification_jobs SET state = 'failed', locked_until = NULL, \
                 last_error = ?2 \
                 WHERE id = ?1 AND state = 'in_flight'",
                params![id, error],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Requeue one failed job, granting it `extra_attempts` more tries. The
/// attempt count is preserved so the delivery history stays honest.
///
/// Returns `false` if the job does not exist or is not in `failed`.
pub async fn retry_job(
    db: &Database,
    id: &str,
    extra_attempts: i64,
) -> Result<bool, ShipwrightError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE notification_jobs SET state = 'queued', \
                 max_attempts = max_attempts + ?2, \
                 next_attempt_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ?1 AND state = 'failed'",
                params![id, extra_attempts],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete completed jobs older than the retention window.
pub async fn clear_completed(db: &Database, retention_days: i64) -> Result<usize, ShipwrightError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "DELETE FROM notification_jobs WHERE state = 'completed' \
                 AND completed_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '-' || ?1 || ' days')",
                params![retention_days],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}

/// Per-state counts.
pub async fn counts(db: &Database) -> Result<QueueCounts, ShipwrightError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT state, COUNT(*) FROM notification_jobs GROUP BY state",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            let mut counts = QueueCounts::default();
            for row in rows {
                let (state, n) = row?;
                match state.as_str() {
                    "queued" => counts.queued = n,
                    "in_flight" => counts.in_flight = n,
                    "completed" => counts.completed = n,
                    "failed" => counts.failed = n,
                    _ => {}
                }
            }
            counts.oldest_queued_at = conn
                .query_row(
                    "SELECT MIN(created_at) FROM notification_jobs WHERE state = 'queued'",
                    [],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a single job by id.
pub async fn get_job(db: &Database, id: &str) -> Result<Option<JobRow>, ShipwrightError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {JOB_COLUMNS} FROM notification_jobs WHERE id = ?1"),
                params![id],
                |row| row_to_job(row),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List jobs in the given state, oldest first.
pub async fn list_by_state(
    db: &Database,
    state: &str,
    limit: i64,
) -> Result<Vec<JobRow>, ShipwrightError> {
    let state = state.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM notification_jobs WHERE state = ?1 \
                 ORDER BY created_at ASC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![state, limit], |row| row_to_job(row))?;
            let mut jobs = Vec::new();
            for row in rows {
                jobs.push(row?);
            }
            Ok(jobs)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn enqueue_then_claim_increments_attempts() {
        let db = setup_db().await;
        enqueue(&db, "job-1", "status-changed", "{}", 3).await.unwrap();

        let job = claim_due(&db, 30).await.unwrap().unwrap();
        assert_eq!(job.id, "job-1");
        assert_eq!(job.state, "in_flight");
        assert_eq!(job.attempts, 1);
        assert!(job.locked_until.is_some());
    }

    #[tokio::test]
    async fn claimed_job_is_not_reclaimable_while_locked() {
        let db = setup_db().await;
        enqueue(&db, "job-1", "status-changed", "{}", 3).await.unwrap();
        claim_due(&db, 30).await.unwrap().unwrap();

        assert!(claim_due(&db, 30).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_lock_is_reclaimed_with_attempt_bump() {
        let db = setup_db().await;
        enqueue(&db, "job-1", "status-changed", "{}", 3).await.unwrap();
        // Lock of zero seconds expires immediately: simulates a crash.
        claim_due(&db, 0).await.unwrap().unwrap();

        let reclaimed = claim_due(&db, 30).await.unwrap().unwrap();
        assert_eq!(reclaimed.id, "job-1");
        assert_eq!(reclaimed.attempts, 2);
    }

    #[tokio::test]
    async fn retry_delay_gates_the_next_claim() {
        let db = setup_db().await;
        enqueue(&db, "job-1", "status-changed", "{}", 3).await.unwrap();
        claim_due(&db, 30).await.unwrap().unwrap();
        assert!(fail_retry(&db, "job-1", "connection refused", 3600).await.unwrap());

        // Due an hour from now, so nothing is claimable.
        assert!(claim_due(&db, 30).await.unwrap().is_none());
        let job = get_job(&db, "job-1").await.unwrap().unwrap();
        assert_eq!(job.state, "queued");
        assert_eq!(job.last_error.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn complete_and_counts() {
        let db = setup_db().await;
        enqueue(&db, "job-1", "status-changed", "{}", 3).await.unwrap();
        enqueue(&db, "job-2", "status-changed", "{}", 3).await.unwrap();
        claim_due(&db, 30).await.unwrap().unwrap();
        assert!(complete(&db, "job-1").await.unwrap());

        let after_first = counts(&db).await.unwrap();
        assert_eq!(after_first.queued, 1);
        assert_eq!(after_first.completed, 1);
        assert_eq!(after_first.in_flight, 0);
        assert_eq!(after_first.failed, 0);
        assert!(after_first.oldest_queued_at.is_some());

        claim_due(&db, 30).await.unwrap().unwrap();
        assert!(complete(&db, "job-2").await.unwrap());
        let after_both = counts(&db).await.unwrap();
        assert_eq!(after_both.oldest_queued_at, None);
    }

    #[tokio::test]
    async fn worker_outcomes_only_apply_to_claimed_jobs() {
        let db = setup_db().await;
        enqueue(&db, "job-1", "status-changed", "{}", 3).await.unwrap();

        // Never claimed: no outcome may touch it.
        assert!(!complete(&db, "job-1").await.unwrap());
        assert!(!fail_retry(&db, "job-1", "late", 0).await.unwrap());
        assert!(!fail_permanent(&db, "job-1", "late").await.unwrap());
        assert_eq!(get_job(&db, "job-1").await.unwrap().unwrap().state, "queued");

        claim_due(&db, 30).await.unwrap().unwrap();
        assert!(complete(&db, "job-1").await.unwrap());

        // Completed is terminal: a worker whose lock lapsed before the
        // reclaimer finished cannot requeue or fail the job.
        assert!(!fail_retry(&db, "job-1", "late", 0).await.unwrap());
        assert!(!fail_permanent(&db, "job-1", "late").await.unwrap());
        let job = get_job(&db, "job-1").await.unwrap().unwrap();
        assert_eq!(job.state, "completed");
        assert_eq!(job.last_error, None);
    }

    #[tokio::test]
    async fn retry_job_preserves_attempts_and_grants_more() {
        let db = setup_db().await;
        enqueue(&db, "job-1", "status-changed", "{}", 3).await.unwrap();
        for _ in 0..3 {
            claim_due(&db, 0).await.unwrap().unwrap();
        }
        assert!(fail_permanent(&db, "job-1", "mailbox unavailable").await.unwrap());

        assert!(retry_job(&db, "job-1", 3).await.unwrap());

        let job = get_job(&db, "job-1").await.unwrap().unwrap();
        assert_eq!(job.state, "queued");
        assert_eq!(job.attempts, 3);
        assert_eq!(job.max_attempts, 6);
        // The prior error sticks around until the next outcome overwrites it.
        assert_eq!(job.last_error.as_deref(), Some("mailbox unavailable"));
    }

    #[tokio::test]
    async fn retry_job_refuses_non_failed_states() {
        let db = setup_db().await;
        enqueue(&db, "job-1", "status-changed", "{}", 3).await.unwrap();

        assert!(!retry_job(&db, "job-1", 3).await.unwrap());
        assert!(!retry_job(&db, "missing", 3).await.unwrap());
    }

    #[tokio::test]
    async fn oldest_due_job_is_claimed_first() {
        let db = setup_db().await;
        enqueue(&db, "job-a", "status-changed", "{}", 3).await.unwrap();
        enqueue(&db, "job-b", "status-changed", "{}", 3).await.unwrap();

        let first = claim_due(&db, 30).await.unwrap().unwrap();
        assert_eq!(first.id, "job-a");
    }
}
