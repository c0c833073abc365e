// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profile directory trait.

use async_trait::async_trait;

use crate::error::BaseraError;
use crate::types::UserProfile;

/// Read-only lookup of marketplace user profiles.
///
/// Used to enrich chat lists with the other participant's public profile.
/// Lookup failures degrade to id-only profiles; they never fail the chat
/// list itself.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Resolve a user id to its public profile. `None` means the user is
    /// unknown to the directory.
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, BaseraError>;
}
