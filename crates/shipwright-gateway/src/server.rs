// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binding and serving the gateway.

use shipwright_config::GatewayConfig;
use shipwright_core::ShipwrightError;
use tokio::net::TcpListener;
use tracing::info;

use crate::AppState;

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn serve<S>(
    config: &GatewayConfig,
    state: AppState,
    shutdown: S,
) -> Result<(), ShipwrightError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let app = crate::router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ShipwrightError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!(%addr, "gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ShipwrightError::Internal(format!("gateway server error: {e}")))
}
