// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication collaborator port.

use async_trait::async_trait;

use crate::error::ShipwrightError;
use crate::types::Actor;

/// Resolves a presented credential to a verified `(actor_id, role)` pair.
///
/// Authentication itself is external to the fulfillment core; the gateway
/// consumes this contract to stamp transitions with the acting role.
#[async_trait]
pub trait ActorVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Actor, ShipwrightError>;
}
