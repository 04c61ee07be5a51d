// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the shipwright fulfillment core.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use shipwright_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("queue backoff: {}", config.queue.backoff);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    ApiToken, GatewayConfig, MailConfig, QueueConfig, ServiceConfig, ShipwrightConfig,
    StorageConfig,
};
pub use validation::{ConfigError, render_errors};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `ShipwrightConfig` or the full list of
/// validation diagnostics.
pub fn load_and_validate() -> Result<ShipwrightConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Parse {
            message: err.to_string(),
        }]),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<ShipwrightConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Parse {
            message: err.to_string(),
        }]),
    }
}
