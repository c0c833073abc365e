// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./basera.toml` > `~/.config/basera/basera.toml`
//! > `/etc/basera/basera.toml`, with environment variable overrides via the
//! `BASERA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BaseraConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/basera/basera.toml` (system-wide)
/// 3. `~/.config/basera/basera.toml` (user XDG config)
/// 4. `./basera.toml` (local directory)
/// 5. `BASERA_*` environment variables
pub fn load_config() -> Result<BaseraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BaseraConfig::default()))
        .merge(Toml::file("/etc/basera/basera.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("basera/basera.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("basera.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<BaseraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BaseraConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BaseraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BaseraConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `BASERA_SCHEDULER_POLL_INTERVAL_SECS`
/// must map to `scheduler.poll_interval_secs`, not
/// `scheduler.poll.interval.secs`.
fn env_provider() -> Env {
    Env::prefixed("BASERA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: BASERA_ANSWER_BASE_URL -> "answer_base_url"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("scheduler_", "scheduler.", 1)
            .replacen("answer_", "answer.", 1)
            .replacen("notify_", "notify.", 1)
            .replacen("directory_", "directory.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn str_loader_merges_over_defaults() {
        let config = load_config_from_str(
            r#"
[storage]
database_path = "/var/lib/basera/basera.db"
"#,
        )
        .unwrap();
        assert_eq!(config.storage.database_path, "/var/lib/basera/basera.db");
        assert_eq!(config.scheduler.poll_interval_secs, 60);
    }

    #[test]
    fn str_loader_rejects_unknown_keys() {
        let result = load_config_from_str(
            r#"
[answer]
base_ur = "http://bot:5005"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn env_var_overrides_underscore_keys() {
        // SAFETY: serialized with other env-mutating tests via #[serial].
        unsafe {
            std::env::set_var("BASERA_SCHEDULER_POLL_INTERVAL_SECS", "7");
        }
        let figment = Figment::new()
            .merge(Serialized::defaults(BaseraConfig::default()))
            .merge(env_provider());
        let config: BaseraConfig = figment.extract().unwrap();
        unsafe {
            std::env::remove_var("BASERA_SCHEDULER_POLL_INTERVAL_SECS");
        }
        assert_eq!(config.scheduler.poll_interval_secs, 7);
    }

    #[test]
    #[serial]
    fn env_var_overrides_nested_url() {
        unsafe {
            std::env::set_var("BASERA_ANSWER_BASE_URL", "http://bot.internal:5005");
        }
        let figment = Figment::new()
            .merge(Serialized::defaults(BaseraConfig::default()))
            .merge(env_provider());
        let config: BaseraConfig = figment.extract().unwrap();
        unsafe {
            std::env::remove_var("BASERA_ANSWER_BASE_URL");
        }
        assert_eq!(config.answer.base_url, "http://bot.internal:5005");
    }
}
