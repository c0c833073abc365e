// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Basera integration tests.
//!
//! Provides mock collaborators and a pipeline harness for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockAnswer`] - scripted bot-answer collaborator with call recording
//! - [`MockNotifier`] - recording notification collaborator with a wait helper
//! - [`CapturePublisher`] - realtime publisher that captures channel/event pairs
//! - [`PipelineHarness`] - full scheduler/chat/bot-reply stack over a temp database

pub mod harness;
pub mod mocks;

pub use harness::PipelineHarness;
pub use mocks::{CapturePublisher, MockAnswer, MockNotifier};
