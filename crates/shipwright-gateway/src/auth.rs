// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication.
//!
//! Fail-closed: every API route requires a token that resolves to a
//! configured actor, and an empty token table rejects everything. The
//! resolved [`Actor`] is attached to the request so handlers can stamp
//! transitions with the acting role.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use shipwright_config::GatewayConfig;
use shipwright_core::{Actor, ActorRole, ActorVerifier, ShipwrightError};
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;

/// [`ActorVerifier`] over the static token table in the gateway config.
pub struct TokenVerifier {
    actors: HashMap<String, Actor>,
}

impl TokenVerifier {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ShipwrightError> {
        let mut actors = HashMap::with_capacity(config.tokens.len());
        for entry in &config.tokens {
            let role = ActorRole::from_str(&entry.role).map_err(|_| {
                ShipwrightError::Config(format!(
                    "unrecognized role '{}' for token actor {}",
                    entry.role, entry.actor_id
                ))
            })?;
            actors.insert(
                entry.token.clone(),
                Actor {
                    id: entry.actor_id.clone(),
                    role,
                },
            );
        }
        Ok(Self { actors })
    }
}

#[async_trait]
impl ActorVerifier for TokenVerifier {
    async fn verify(&self, credential: &str) -> Result<Actor, ShipwrightError> {
        self.actors
            .get(credential)
            .cloned()
            .ok_or_else(|| ShipwrightError::Unauthorized("unrecognized token".to_string()))
    }
}

/// Middleware guarding the API routes. Extracts the bearer token, resolves
/// it to an actor, and injects the actor into request extensions.
pub async fn require_actor(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = bearer_token(&request).ok_or_else(|| {
        ApiError::from(ShipwrightError::Unauthorized(
            "missing bearer token".to_string(),
        ))
    })?;
    let actor = state.verifier.verify(&credential).await?;
    debug!(actor_id = %actor.id, role = %actor.role, "request authenticated");
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}
