// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Training defaults, push defaults and localized user-facing messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! Constants grouped by domain.

/// User-facing Spanish messages, including upstream failure texts per endpoint
pub mod messages;

/// Training session defaults and XP formulas
pub mod training {
    /// Base XP for finishing a routine-driven workout
    pub const ROUTINE_BASE_XP: u32 = 50;
    /// XP per completed exercise in a routine-driven workout
    pub const ROUTINE_XP_PER_EXERCISE: u32 = 10;
    /// Base XP for finishing a free workout
    pub const FREE_BASE_XP: u32 = 25;
    /// XP per completed exercise in a free workout
    pub const FREE_XP_PER_EXERCISE: u32 = 5;
    /// Rest seconds used by free training
    pub const FREE_DEFAULT_REST_SECONDS: u32 = 90;
}

/// Push notification defaults
pub mod push {
    /// Default notification title
    pub const DEFAULT_TITLE: &str = "Coach IA";
    /// Default notification body
    pub const DEFAULT_BODY: &str = "¡Es hora de entrenar!";
    /// Default click target
    pub const DEFAULT_URL: &str = "/training";
    /// Notification icon path
    pub const ICON: &str = "/favicon.ico";
    /// Notification tag for reminders
    pub const REMINDER_TAG: &str = "coach-reminder";
    /// Default VAPID subject
    pub const DEFAULT_VAPID_SUBJECT: &str = "mailto:coach@terminal-buddy.app";
    /// Default TTL header value in seconds
    pub const DEFAULT_TTL_SECONDS: u32 = 86_400;
    /// VAPID token lifetime in seconds
    pub const VAPID_TOKEN_LIFETIME_SECONDS: i64 = 12 * 60 * 60;
    /// Default preferred training time
    pub const DEFAULT_TRAINING_TIME: &str = "18:00";
}

/// Network defaults
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
}
