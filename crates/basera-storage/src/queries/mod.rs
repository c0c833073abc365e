// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod chats;
pub mod messages;
pub mod tasks;

use rusqlite::types::Type;

/// Decode a JSON TEXT column inside a row mapper.
pub(crate) fn json_col<T: serde::de::DeserializeOwned>(
    idx: usize,
    raw: &str,
) -> Result<T, rusqlite::Error> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Encode a value as a JSON TEXT parameter.
pub(crate) fn json_param<T: serde::Serialize>(value: &T) -> Result<String, rusqlite::Error> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Parse an enum TEXT column inside a row mapper.
pub(crate) fn enum_col<T>(idx: usize, raw: &str) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|e: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}
