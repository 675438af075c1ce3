// ABOUTME: Core data models persisted by the Coach IA service
// ABOUTME: Profiles, routines, sessions, completed sets and notification settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! Data models shared by storage, HTTP handlers and the training state machine.
//!
//! Rows serialize with `snake_case` field names, matching the JSON the web
//! client already reads for table rows.

mod notification;
mod profile;
mod routine;
mod session;

pub use notification::{NotificationPreferences, NotificationSettings, PushSubscription, PushSubscriptionKeys};
pub use profile::{ExperienceLevel, Goal, OnboardingInput, Profile};
pub use routine::{Difficulty, GeneratedExercise, GeneratedRoutine, RoutineExercise, WorkoutRoutine};
pub use session::{CompletedSet, NewCompletedSet, WorkoutSession};
