// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, a usable history window, and a known log level.

use crate::diagnostic::ConfigError;
use crate::model::LinqConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LinqConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.rules.path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "rules.path must not be empty".to_string(),
        });
    }

    if config.chat.history_window == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.history_window must be at least 1".to_string(),
        });
    }

    if config.chat.reply_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.reply_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.chat.fallback_reply.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "chat.fallback_reply must not be empty".to_string(),
        });
    }

    let level = config.log.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
