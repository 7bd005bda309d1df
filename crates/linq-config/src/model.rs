// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Linq memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Linq configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinqConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Preference-mining rule file settings.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Settings for the chat loop that feeds the memory store.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
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
        .map(|p| p.join("linq").join("linq.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("linq.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Rule file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Path to the JSON rule file. Created with built-in rules when absent.
    #[serde(default = "default_rules_path")]
    pub path: String,

    /// Reload rules automatically when the file changes.
    #[serde(default)]
    pub watch: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: default_rules_path(),
            watch: false,
        }
    }
}

fn default_rules_path() -> String {
    dirs::config_dir()
        .map(|p| p.join("linq").join("rules.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("rules.json"))
        .to_string_lossy()
        .into_owned()
}

/// Chat loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Number of most recent exchanges handed to the prompt builder.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Seconds to wait for the AI-reply collaborator.
    #[serde(default = "default_reply_timeout_secs")]
    pub reply_timeout_secs: u64,

    /// Reply recorded when the collaborator fails or times out.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            reply_timeout_secs: default_reply_timeout_secs(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

fn default_history_window() -> usize {
    4
}

fn default_reply_timeout_secs() -> u64 {
    300
}

fn default_fallback_reply() -> String {
    "抱歉，我现在有点忙，请稍后再试。".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
