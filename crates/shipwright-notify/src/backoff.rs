// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry backoff policies.
//!
//! The policy is a configuration value, not a per-call-site choice. Delays
//! are computed from the number of attempts already made, so the first
//! retry of a job that failed once waits one base delay.

use shipwright_core::ShipwrightError;

/// Cap on any single retry delay.
const MAX_DELAY_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// Every retry waits the base delay.
    Fixed,
    /// Delay doubles with each failed attempt: base, 2x, 4x, ...
    Exponential,
}

impl BackoffPolicy {
    /// Parse the configured policy name. Config validation rejects unknown
    /// names earlier; this guards direct construction.
    pub fn from_config(name: &str) -> Result<Self, ShipwrightError> {
        match name {
            "fixed" => Ok(Self::Fixed),
            "exponential" => Ok(Self::Exponential),
            other => Err(ShipwrightError::Config(format!(
                "unknown backoff policy: {other}"
            ))),
        }
    }

    /// Delay before the next attempt, given `attempts` made so far.
    pub fn delay_secs(self, base_secs: u64, attempts: i64) -> i64 {
        let base = base_secs as i64;
        let delay = match self {
            Self::Fixed => base,
            Self::Exponential => {
                let exponent = (attempts - 1).clamp(0, 20) as u32;
                base.saturating_mul(1_i64 << exponent)
            }
        };
        delay.min(MAX_DELAY_SECS)
    }
}
