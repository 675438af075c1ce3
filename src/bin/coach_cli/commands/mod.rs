// ABOUTME: Subcommand implementations for coach-cli
// ABOUTME: One module per top-level command
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

pub mod chat;
pub mod remind;
pub mod token;
