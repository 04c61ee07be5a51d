// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Figment guarantees the shapes; this layer checks cross-field rules that
//! serde cannot express (enumerated string values, non-zero bounds,
//! role spellings on gateway tokens).

use std::str::FromStr;

use miette::Diagnostic;
use shipwright_core::ActorRole;
use thiserror::Error;

use crate::model::ShipwrightConfig;

/// A single validation failure, rendered as a miette diagnostic.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("queue.backoff must be \"fixed\" or \"exponential\", got {value:?}")]
    #[diagnostic(
        code(shipwright::config::backoff),
        help("set queue.backoff to \"fixed\" or \"exponential\"")
    )]
    InvalidBackoff { value: String },

    #[error("queue.max_attempts must be at least 1")]
    #[diagnostic(code(shipwright::config::max_attempts))]
    ZeroMaxAttempts,

    #[error("queue.send_timeout_secs must be at least 1")]
    #[diagnostic(code(shipwright::config::send_timeout))]
    ZeroSendTimeout,

    #[error("gateway.port must be non-zero")]
    #[diagnostic(code(shipwright::config::port))]
    ZeroPort,

    #[error("gateway token for actor {actor_id:?} has unknown role {role:?}")]
    #[diagnostic(
        code(shipwright::config::token_role),
        help("valid roles are \"admin\", \"staff\", and \"system\"")
    )]
    UnknownTokenRole { actor_id: String, role: String },

    #[error("gateway token for actor {actor_id:?} is empty")]
    #[diagnostic(code(shipwright::config::empty_token))]
    EmptyToken { actor_id: String },

    #[error("mail.from_address must not be empty")]
    #[diagnostic(code(shipwright::config::from_address))]
    EmptyFromAddress,

    #[error("failed to parse configuration: {message}")]
    #[diagnostic(
        code(shipwright::config::parse),
        help("check TOML syntax and key spelling; unknown keys are rejected")
    )]
    Parse { message: String },
}

/// Render collected validation failures to stderr as miette diagnostics.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

/// Validate a deserialized config, collecting every failure instead of
/// stopping at the first.
pub fn validate_config(config: &ShipwrightConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    match config.queue.backoff.as_str() {
        "fixed" | "exponential" => {}
        other => errors.push(ConfigError::InvalidBackoff {
            value: other.to_string(),
        }),
    }

    if config.queue.max_attempts == 0 {
        errors.push(ConfigError::ZeroMaxAttempts);
    }

    if config.queue.send_timeout_secs == 0 {
        errors.push(ConfigError::ZeroSendTimeout);
    }

    if config.gateway.port == 0 {
        errors.push(ConfigError::ZeroPort);
    }

    for token in &config.gateway.tokens {
        if token.token.is_empty() {
            errors.push(ConfigError::EmptyToken {
                actor_id: token.actor_id.clone(),
            });
        }
        if ActorRole::from_str(&token.role).is_err() {
            errors.push(ConfigError::UnknownTokenRole {
                actor_id: token.actor_id.clone(),
                role: token.role.clone(),
            });
        }
    }

    if config.mail.from_address.is_empty() {
        errors.push(ConfigError::EmptyFromAddress);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn default_config_validates() {
        let config = ShipwrightConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn bad_backoff_is_reported() {
        let config = load_config_from_str("[queue]\nbackoff = \"jittered\"\n").unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ConfigError::InvalidBackoff { .. }))
        );
    }

    #[test]
    fn all_failures_are_collected() {
        let config = load_config_from_str(
            "[queue]\nbackoff = \"jittered\"\nmax_attempts = 0\n\n[gateway]\nport = 0\n",
        )
        .unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn unknown_token_role_is_reported() {
        let config = load_config_from_str(
            "[[gateway.tokens]]\ntoken = \"t\"\nactor_id = \"a\"\nrole = \"customer\"\n",
        )
        .unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ConfigError::UnknownTokenRole { role, .. }] if role == "customer"
        ));
    }
}
