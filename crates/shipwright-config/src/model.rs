// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the shipwright fulfillment core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level shipwright configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShipwrightConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Outbound mail transport settings.
    #[serde(default)]
    pub mail: MailConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service instance.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "shipwright".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("shipwright").join("shipwright.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("shipwright.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Notification queue configuration.
///
/// Backoff policy is configuration, not hard-coded per call site.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Delivery attempts granted per retry cycle.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff policy between retries: "fixed" or "exponential".
    #[serde(default = "default_backoff")]
    pub backoff: String,

    /// Base delay between retries, in seconds.
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,

    /// How often the worker polls for due jobs, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on a single mail-send call, in seconds.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// Completed jobs older than this many days are purged by
    /// clear-completed.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
            base_delay_secs: default_base_delay_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            send_timeout_secs: default_send_timeout_secs(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> String {
    "exponential".to_string()
}

fn default_base_delay_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_send_timeout_secs() -> u64 {
    20
}

fn default_retention_days() -> u32 {
    7
}

/// Outbound mail transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    /// SMTP relay hostname. `None` disables real delivery (jobs still
    /// queue; the worker logs instead of sending).
    #[serde(default)]
    pub smtp_host: Option<String>,

    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username. `None` sends unauthenticated.
    #[serde(default)]
    pub smtp_username: Option<String>,

    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,

    /// From address on outgoing messages.
    #[serde(default = "default_from_address")]
    pub from_address: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from_address: default_from_address(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "orders@localhost".to_string()
}

/// One static API credential accepted by the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiToken {
    /// Bearer token value.
    pub token: String,
    /// Actor id stamped onto transitions made with this token.
    pub actor_id: String,
    /// Actor role: "admin", "staff", or "system".
    pub role: String,
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Static bearer tokens mapped to actors. Empty list means every
    /// request is rejected as unauthorized.
    #[serde(default)]
    pub tokens: Vec<ApiToken>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tokens: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8470
}
