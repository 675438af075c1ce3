// ABOUTME: Main library entry point for the Coach IA training service
// ABOUTME: HTTP functions, storage, AI gateway, push reminders and the training state machine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Coach IA Server
//!
//! Backend for a Spanish-language fitness coaching app.
//!
//! ## Features
//!
//! - **Routines**: AI-generated workout routines through forced tool calling
//! - **Chat coach**: streamed replies relayed from an OpenAI-compatible gateway
//! - **Form analysis**: vision prompts with a tolerant JSON parser
//! - **Voice**: text-to-speech and speech-to-text proxies
//! - **Reminders**: Web Push with VAPID and `aes128gcm` payload encryption
//! - **Training**: session state machine with rest countdown and XP rules
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use coach_ia_server::config::ServerConfig;
//! use coach_ia_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("{}", config.summary());
//!     Ok(())
//! }
//! ```

pub use coach_core::{constants, errors, models};

/// Bearer token authentication
pub mod auth;

/// Streaming chat coach
pub mod coach;

/// Environment-driven configuration
pub mod config;

/// `SQLite` storage managers
pub mod database;

/// Dashboard insight text
pub mod insights;

/// AI gateway client
pub mod llm;

/// Structured logging setup
pub mod logging;

/// CORS and request tracing layers
pub mod middleware;

/// Web Push delivery
pub mod push;

/// Scheduled coach reminders
pub mod reminders;

/// Shared resource container
pub mod resources;

/// AI routine generation
pub mod routines;

/// HTTP routes
pub mod routes;

/// Training session state machine
pub mod training;

/// Exercise form analysis
pub mod vision;

/// Voice proxies
pub mod voice;
