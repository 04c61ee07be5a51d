// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the fulfillment core.
//!
//! Caller errors (`InvalidTransition`, `Unauthorized`, `NotFound`) are
//! returned synchronously and are actionable by the UI. Infrastructure
//! errors downstream of a durable order mutation are logged and surfaced
//! through the operator alert queue, never to the end customer.

use thiserror::Error;

use crate::types::{ActorRole, MovementStatus, OrderStatus};

/// The primary error type used across all shipwright components.
#[derive(Debug, Error)]
pub enum ShipwrightError {
    /// The requested status is not reachable from the order's current
    /// status for the acting role.
    #[error("invalid transition: {from} -> {to} is not allowed for role {role}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        role: ActorRole,
    },

    /// The requested movement status is not reachable from the movement's
    /// current status in the fulfillment lattice.
    #[error("invalid movement transition: {from} -> {to}")]
    InvalidMovementTransition {
        from: MovementStatus,
        to: MovementStatus,
    },

    /// The presented credential did not resolve to a permitted actor.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A ledger write downstream of a durable order mutation failed.
    /// The order transition is not rolled back; the inconsistency is
    /// surfaced to the operator alert queue.
    #[error("ledger write failed for order {order_id}: {source}")]
    LedgerWriteFailed {
        order_id: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A notification could not be delivered. Retried by the queue;
    /// terminal failures retain full diagnostic context for manual resend.
    #[error("notification delivery failed for job {job_id}: {message}")]
    NotificationDeliveryFailed { job_id: String, message: String },

    /// Storage backend errors (database connection, query failure,
    /// serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ShipwrightError {
    /// Build a `Storage` error from any boxable source.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// True for errors the caller can act on (fix the request), as opposed
    /// to infrastructure failures.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. }
                | Self::InvalidMovementTransition { .. }
                | Self::Unauthorized(_)
                | Self::NotFound { .. }
        )
    }
}

/// Outcome of a mail-send attempt, classified for retry handling.
///
/// Transient failures (SMTP errors, timeouts) are retried with backoff;
/// permanent failures (unparseable recipient, rejected payload) go straight
/// to the failed state without consuming retry attempts.
#[derive(Debug, Error)]
pub enum MailError {
    /// Delivery failed but a retry may succeed.
    #[error("transient mail failure: {0}")]
    Transient(String),

    /// Delivery can never succeed with this payload.
    #[error("permanent mail failure: {0}")]
    Permanent(String),
}
