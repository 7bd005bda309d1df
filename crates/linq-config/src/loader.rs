// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./linq.toml` > `~/.config/linq/linq.toml` > `/etc/linq/linq.toml`
//! with environment variable overrides via `LINQ_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LinqConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/linq/linq.toml` (system-wide)
/// 3. `~/.config/linq/linq.toml` (user XDG config)
/// 4. `./linq.toml` (local directory)
/// 5. `LINQ_*` environment variables
pub fn load_config() -> Result<LinqConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LinqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LinqConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LinqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LinqConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LinqConfig::default()))
        .merge(Toml::file("/etc/linq/linq.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("linq/linq.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("linq.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `LINQ_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that keys containing
/// underscores survive: `LINQ_STORAGE_DATABASE_PATH` -> `storage.database_path`.
fn env_provider() -> Env {
    Env::prefixed("LINQ_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 4] = ["storage", "rules", "chat", "log"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("chat_reply_timeout_secs"), "chat.reply_timeout_secs");
        assert_eq!(map_env_key("rules_watch"), "rules.watch");
        assert_eq!(map_env_key("log_level"), "log.level");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }
}
