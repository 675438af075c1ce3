// ABOUTME: Workout session and completed set models
// ABOUTME: Completed sets are an append-only log attached to a session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A training session from start to finish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSession {
    /// Row ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Routine followed, absent for free training
    pub routine_id: Option<Uuid>,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Completion time
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed active seconds
    pub duration_seconds: Option<u32>,
    /// XP awarded on completion
    pub xp_earned: u32,
    /// Free-text notes
    pub notes: Option<String>,
}

/// One logged set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSet {
    /// Row ID
    pub id: Uuid,
    /// Parent session
    pub session_id: Uuid,
    /// Exercise name at the time of logging
    pub exercise_name: String,
    /// 1-based set number
    pub set_number: u32,
    /// Load as text, e.g. "20 kg"
    pub weight_used: Option<String>,
    /// Repetitions performed
    pub reps_completed: Option<u32>,
    /// Log time
    pub completed_at: DateTime<Utc>,
}

/// Input for appending a [`CompletedSet`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompletedSet {
    /// Exercise name
    pub exercise_name: String,
    /// 1-based set number
    pub set_number: u32,
    /// Load as text
    #[serde(default)]
    pub weight_used: Option<String>,
    /// Repetitions performed
    #[serde(default)]
    pub reps_completed: Option<u32>,
}
