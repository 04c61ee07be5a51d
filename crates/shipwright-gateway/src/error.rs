// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from domain errors to HTTP responses.
//!
//! Caller errors keep their full message; infrastructure errors are logged
//! server-side and surface as an opaque 500 so internals never leak
//! through the API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shipwright_core::ShipwrightError;
use tracing::error;

/// JSON error body returned by every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Gateway-level error: a domain error or a request the router accepted
/// but a handler rejected.
#[derive(Debug)]
pub enum ApiError {
    Domain(ShipwrightError),
    BadRequest(String),
}

impl From<ShipwrightError> for ApiError {
    fn from(err: ShipwrightError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Domain(err) => match &err {
                ShipwrightError::InvalidTransition { .. }
                | ShipwrightError::InvalidMovementTransition { .. } => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                ShipwrightError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, err.to_string()),
                ShipwrightError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
                _ => {
                    error!(error = %err, "request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    )
                }
            },
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipwright_core::{ActorRole, OrderStatus};

    #[test]
    fn status_codes_follow_the_error_class() {
        let conflict = ApiError::from(ShipwrightError::InvalidTransition {
            from: OrderStatus::Shipping,
            to: OrderStatus::Pending,
            role: ActorRole::Staff,
        });
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let missing = ApiError::from(ShipwrightError::NotFound {
            kind: "order",
            id: "ord-1".into(),
        });
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let auth = ApiError::from(ShipwrightError::Unauthorized("bad token".into()));
        assert_eq!(auth.into_response().status(), StatusCode::UNAUTHORIZED);

        let infra = ApiError::from(ShipwrightError::Internal("boom".into()));
        assert_eq!(
            infra.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
