// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Component port traits.
//!
//! The state machine depends on these narrow interfaces instead of the
//! other components' storage, so each component can be tested against
//! in-memory fakes and substituted independently.

pub mod actor;
pub mod ledger;
pub mod mailer;
pub mod queue;

pub use actor::ActorVerifier;
pub use ledger::LedgerPort;
pub use mailer::Mailer;
pub use queue::QueuePort;
