// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2020 Joyent, Inc.
// Copyright 2026 Edgecast Cloud LLC.

//! Configuration for move admission

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::AdmissionError;

/// Default cap on moves in flight per node.
pub const DEFAULT_MAX_CONCURRENT_MOVES: usize = 5;

/// Default cooldown applied to a node after a failed move.
pub const DEFAULT_FAILURE_DELAY_MS: u64 = 10_000;

/// Admission configuration loaded from environment variables or a JSON file
///
/// Configuration can be loaded from:
/// 1. Environment variables (see `from_env()`)
/// 2. JSON config file (see `from_file()`)
///
/// Missing fields fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Maximum number of moves a single node may have in flight
    pub max_concurrent_moves: usize,

    /// Cooldown, in milliseconds, applied to a node after a failed move
    pub failure_delay_ms: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_moves: DEFAULT_MAX_CONCURRENT_MOVES,
            failure_delay_ms: DEFAULT_FAILURE_DELAY_MS,
        }
    }
}

impl AdmissionConfig {
    /// Load configuration from environment variables
    ///
    /// - `MAX_CONCURRENT_MOVES` (default 5)
    /// - `MOVE_FAILURE_DELAY_MS` (default 10000)
    pub fn from_env() -> Result<Self> {
        let max_concurrent_moves = std::env::var("MAX_CONCURRENT_MOVES")
            .unwrap_or_else(|_| DEFAULT_MAX_CONCURRENT_MOVES.to_string())
            .parse()
            .context("Invalid MAX_CONCURRENT_MOVES")?;

        let failure_delay_ms = std::env::var("MOVE_FAILURE_DELAY_MS")
            .unwrap_or_else(|_| DEFAULT_FAILURE_DELAY_MS.to_string())
            .parse()
            .context("Invalid MOVE_FAILURE_DELAY_MS")?;

        let config = Self {
            max_concurrent_moves,
            failure_delay_ms,
        };
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Reject values that would produce an unusable controller
    pub fn validate(&self) -> Result<(), AdmissionError> {
        if self.max_concurrent_moves == 0 {
            return Err(AdmissionError::InvalidConcurrency(self.max_concurrent_moves));
        }
        Ok(())
    }

    /// Cooldown applied after a failed move
    pub fn failure_delay(&self) -> Duration {
        Duration::from_millis(self.failure_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // =========================================================================
    // Configuration Tests
    // =========================================================================
    //
    // `from_env()` is not exercised here: `std::env::set_var` is `unsafe` in
    // the 2024 edition and would race with other tests reading the
    // environment.
    //
    // =========================================================================

    #[test]
    fn default_config_has_sensible_values() {
        let config = AdmissionConfig::default();

        assert_eq!(config.max_concurrent_moves, 5);
        assert_eq!(config.failure_delay_ms, 10_000);
        assert_eq!(config.failure_delay(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_deserialization_uses_defaults() {
        let json = r#"{ "max_concurrent_moves": 12 }"#;

        let config: AdmissionConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.max_concurrent_moves, 12);
        assert_eq!(config.failure_delay_ms, DEFAULT_FAILURE_DELAY_MS);
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let config = AdmissionConfig {
            max_concurrent_moves: 0,
            failure_delay_ms: 100,
        };

        assert_eq!(
            config.validate(),
            Err(AdmissionError::InvalidConcurrency(0))
        );
    }

    #[test]
    fn from_file_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "max_concurrent_moves": 3, "failure_delay_ms": 2500 }}"#
        )
        .unwrap();

        let config = AdmissionConfig::from_file(file.path()).unwrap();

        assert_eq!(config.max_concurrent_moves, 3);
        assert_eq!(config.failure_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn from_file_rejects_zero_concurrency() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_concurrent_moves": 0 }}"#).unwrap();

        let err = AdmissionConfig::from_file(file.path()).unwrap_err();

        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn from_file_missing_file_errors() {
        let err = AdmissionConfig::from_file(Path::new("/nonexistent/admission.json"))
            .unwrap_err();

        assert!(err.to_string().contains("Failed to read config file"));
    }
}
