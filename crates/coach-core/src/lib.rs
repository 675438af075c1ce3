// ABOUTME: Core types and constants for the Coach IA training service
// ABOUTME: Foundation crate with error handling, data models and localized messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

#![deny(unsafe_code)]

//! # Coach Core
//!
//! Foundation crate shared by the HTTP service, the training state machine and
//! the command-line client. It changes rarely, so the rest of the workspace
//! can compile incrementally against it.
//!
//! ## Modules
//!
//! - **errors**: `AppError`, `ErrorCode` and upstream AI failure classification
//! - **models**: profiles, routines, sessions, completed sets and notification settings
//! - **constants**: defaults and user-facing Spanish messages

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and localized messages
pub mod constants;

/// Core data models persisted by the service
pub mod models;
