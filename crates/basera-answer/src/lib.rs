// SPDX-FileCopyrightText: 2026 Basera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the bot answer service.
//!
//! The answer service turns a buyer's question into structured content
//! blocks. This crate provides the production [`AnswerProvider`]
//! implementation used by the bot reply pipeline.
//!
//! [`AnswerProvider`]: basera_core::traits::AnswerProvider

pub mod client;
pub mod types;

pub use client::AnswerClient;
pub use types::{AnswerRequest, AnswerResponse};
