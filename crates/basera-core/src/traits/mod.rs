// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The scheduler and chat pipeline see external services only through these
//! narrow interfaces. All traits use `#[async_trait]` for dynamic dispatch
//! compatibility.

pub mod answer;
pub mod directory;
pub mod handler;
pub mod notify;
pub mod realtime;

pub use answer::AnswerProvider;
pub use directory::ProfileDirectory;
pub use handler::TaskHandler;
pub use notify::Notifier;
pub use realtime::RealtimePublisher;
