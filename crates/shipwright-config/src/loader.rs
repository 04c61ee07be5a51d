// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./shipwright.toml` > `~/.config/shipwright/shipwright.toml`
//! > `/etc/shipwright/shipwright.toml` with environment variable overrides
//! via `SHIPWRIGHT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ShipwrightConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/shipwright/shipwright.toml` (system-wide)
/// 3. `~/.config/shipwright/shipwright.toml` (user XDG config)
/// 4. `./shipwright.toml` (local directory)
/// 5. `SHIPWRIGHT_*` environment variables
pub fn load_config() -> Result<ShipwrightConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ShipwrightConfig::default()))
        .merge(Toml::file("/etc/shipwright/shipwright.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("shipwright/shipwright.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("shipwright.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ShipwrightConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ShipwrightConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ShipwrightConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ShipwrightConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `SHIPWRIGHT_QUEUE_MAX_ATTEMPTS` must
/// map to `queue.max_attempts`, not `queue.max.attempts`.
fn env_provider() -> Env {
    Env::prefixed("SHIPWRIGHT_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("queue_", "queue.", 1)
            .replacen("mail_", "mail.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_toml_overrides_defaults() {
        let config = load_config_from_str(
            "[queue]\nmax_attempts = 5\nbackoff = \"fixed\"\n\n[gateway]\nport = 9000\n",
        )
        .unwrap();
        assert_eq!(config.queue.max_attempts, 5);
        assert_eq!(config.queue.backoff, "fixed");
        assert_eq!(config.gateway.port, 9000);
        // Untouched sections keep their defaults.
        assert_eq!(config.queue.poll_interval_ms, 500);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.service.name, "shipwright");
        assert_eq!(config.mail.smtp_port, 587);
    }

    #[test]
    fn gateway_tokens_parse() {
        let config = load_config_from_str(
            r#"
            [[gateway.tokens]]
            token = "t-admin"
            actor_id = "ops-1"
            role = "admin"

            [[gateway.tokens]]
            token = "t-staff"
            actor_id = "wh-7"
            role = "staff"
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.tokens.len(), 2);
        assert_eq!(config.gateway.tokens[0].role, "admin");
        assert_eq!(config.gateway.tokens[1].actor_id, "wh-7");
    }
}
