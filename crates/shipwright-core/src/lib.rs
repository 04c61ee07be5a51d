// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the shipwright order-fulfillment core.
//!
//! This crate provides the error taxonomy, domain types, append-only
//! history, and the narrow port traits that bind the order state machine,
//! the inventory movement ledger, and the notification queue together
//! without shared mutable state.

pub mod error;
pub mod history;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{MailError, ShipwrightError};
pub use history::{AuditTrail, HistoryEntry};
pub use types::{
    Actor, ActorRole, JobState, Movement, MovementItem, MovementStatus, MovementType,
    NotificationKind, NotificationPayload, OrderLine, OrderSnapshot, OrderStatus,
};

pub use traits::{ActorVerifier, LedgerPort, Mailer, QueuePort};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_cover_the_taxonomy() {
        let _invalid = ShipwrightError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Delivered,
            role: ActorRole::Staff,
        };
        let _unauthorized = ShipwrightError::Unauthorized("bad token".into());
        let _not_found = ShipwrightError::NotFound {
            kind: "order",
            id: "ord-1".into(),
        };
        let _ledger = ShipwrightError::LedgerWriteFailed {
            order_id: "ord-1".into(),
            source: Box::new(std::io::Error::other("disk")),
        };
        let _delivery = ShipwrightError::NotificationDeliveryFailed {
            job_id: "job-1".into(),
            message: "smtp 451".into(),
        };
        let _storage = ShipwrightError::storage(std::io::Error::other("disk"));
        let _config = ShipwrightError::Config("bad toml".into());
        let _timeout = ShipwrightError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        let _internal = ShipwrightError::Internal("unexpected".into());
    }

    #[test]
    fn port_traits_are_object_safe() {
        fn _ledger(_: &dyn LedgerPort) {}
        fn _queue(_: &dyn QueuePort) {}
        fn _mailer(_: &dyn Mailer) {}
        fn _verifier(_: &dyn ActorVerifier) {}
    }
}
