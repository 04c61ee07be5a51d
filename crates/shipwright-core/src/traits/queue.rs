// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification queue port consumed by the order state machine.

use async_trait::async_trait;

use crate::error::ShipwrightError;
use crate::types::{NotificationKind, NotificationPayload};

/// Enqueue interface into the asynchronous notification queue.
///
/// `enqueue` is synchronous and durable: the job survives a process
/// restart before the caller is told it succeeded. Delivery happens out
/// of band in the queue's background worker.
#[async_trait]
pub trait QueuePort: Send + Sync {
    /// Durably enqueue a notification job. Returns the job id.
    async fn enqueue(
        &self,
        kind: NotificationKind,
        payload: &NotificationPayload,
    ) -> Result<String, ShipwrightError>;
}
