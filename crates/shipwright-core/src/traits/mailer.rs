// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound mail transport port.

use async_trait::async_trait;

use crate::error::MailError;

/// The external mail-send primitive. Treated as unreliable: the queue
/// worker bounds every call with a timeout and retries transient failures.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message. Returns a transport message id on success.
    async fn send(&self, recipient: &str, subject: &str, body: &str)
    -> Result<String, MailError>;
}
