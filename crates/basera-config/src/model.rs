// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Basera conversation backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Basera configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BaseraConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Task scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Bot answer collaborator settings.
    #[serde(default)]
    pub answer: AnswerConfig,

    /// Notification collaborator settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Profile directory collaborator settings.
    #[serde(default)]
    pub directory: DirectoryConfig,
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
    "basera".to_string()
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

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    "basera.db".to_string()
}

fn default_true() -> bool {
    true
}

/// Task scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Run the scheduler loop. Disable for read-only deployments.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between due-task polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

/// Bot answer collaborator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnswerConfig {
    /// Base URL of the bot answer service.
    #[serde(default = "default_answer_base_url")]
    pub base_url: String,

    /// Round-trip budget for one answer call, in seconds.
    #[serde(default = "default_answer_timeout_secs")]
    pub timeout_secs: u64,

    /// Language/locale hint sent with every question.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            base_url: default_answer_base_url(),
            timeout_secs: default_answer_timeout_secs(),
            language: default_language(),
        }
    }
}

fn default_answer_base_url() -> String {
    "http://localhost:5005".to_string()
}

fn default_answer_timeout_secs() -> u64 {
    150
}

fn default_language() -> String {
    "en".to_string()
}

/// Notification collaborator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Base URL of the notification service.
    #[serde(default = "default_notify_base_url")]
    pub base_url: String,

    /// Dispatch notifications for bot replies. Failures are logged either way.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            base_url: default_notify_base_url(),
            enabled: true,
        }
    }
}

fn default_notify_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// Profile directory collaborator configuration.
///
/// When `base_url` is unset, chat lists fall back to id-only profiles.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Base URL of the profile directory service.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = BaseraConfig::default();
        assert_eq!(config.service.name, "basera");
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.storage.database_path, "basera.db");
        assert!(config.storage.wal_mode);
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.poll_interval_secs, 60);
        assert_eq!(config.answer.timeout_secs, 150);
        assert_eq!(config.answer.language, "en");
        assert!(config.notify.enabled);
        assert!(config.directory.base_url.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[scheduler]
poll_interval_secs = 5

[answer]
base_url = "http://bot.internal:5005"
"#;
        let config: BaseraConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scheduler.poll_interval_secs, 5);
        assert!(config.scheduler.enabled, "unset fields keep their defaults");
        assert_eq!(config.answer.base_url, "http://bot.internal:5005");
        assert_eq!(config.answer.timeout_secs, 150);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let toml_str = r#"
[scheduler]
pol_interval_secs = 5
"#;
        let result = toml::from_str::<BaseraConfig>(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_is_rejected() {
        let toml_str = r#"
[sheduler]
enabled = false
"#;
        let result = toml::from_str::<BaseraConfig>(toml_str);
        assert!(result.is_err());
    }
}
