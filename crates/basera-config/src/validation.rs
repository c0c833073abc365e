// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths, well-formed base URLs, and positive
//! intervals.

use crate::diagnostic::ConfigError;
use crate::model::BaseraConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BaseraConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.scheduler.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.poll_interval_secs must be at least 1".to_string(),
        });
    }

    check_base_url(&mut errors, "answer.base_url", &config.answer.base_url);

    if config.answer.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "answer.timeout_secs must be at least 1".to_string(),
        });
    }

    if config.answer.language.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "answer.language must not be empty".to_string(),
        });
    }

    if config.notify.enabled {
        check_base_url(&mut errors, "notify.base_url", &config.notify.base_url);
    }

    if let Some(url) = &config.directory.base_url {
        check_base_url(&mut errors, "directory.base_url", url);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Require a non-empty http(s) base URL.
fn check_base_url(errors: &mut Vec<ConfigError>, key: &str, url: &str) {
    let url = url.trim();
    if url.is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{key} must not be empty"),
        });
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("{key} `{url}` must start with http:// or https://"),
        });
    }
}
