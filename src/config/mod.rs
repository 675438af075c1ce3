// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Environment-driven configuration built once at startup and shared read-only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! Configuration module.
//!
//! - **Environment**: server, auth, AI gateway, voice, push and reminder settings
//! - **Database**: type-safe database URL parsing

/// Database URL parsing and pool settings
pub mod database;
/// Environment and server configuration
pub mod environment;

pub use database::{DatabaseConfig, DatabaseUrl};
pub use environment::{
    AiGatewayConfig, AuthConfig, CorsConfig, Environment, LogLevel, PushConfig, ReminderConfig,
    ServerConfig, VoiceConfig,
};
