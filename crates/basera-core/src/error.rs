// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Basera conversation backend.

use thiserror::Error;

/// The primary error type used across all Basera crates.
#[derive(Debug, Error)]
pub enum BaseraError {
    /// Configuration errors (invalid TOML, missing required fields, unregistered task types).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// External collaborator errors (bot answer service, notification service, directory).
    #[error("collaborator error: {message}")]
    Collaborator {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Malformed input: a task payload that does not match its task type's
    /// shape, or an invalid identifier handed to a registry operation.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
