// ABOUTME: Workout routine and routine exercise models
// ABOUTME: Includes the structured routine shape returned by the generation tool call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Difficulty reported by the generation tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Entry level
    Beginner,
    /// Mid level
    Intermediate,
    /// High level
    Advanced,
}

impl Difficulty {
    /// Spanish label stored in `workout_routines.difficulty_level`
    #[must_use]
    pub const fn label_es(self) -> &'static str {
        match self {
            Self::Beginner => "principiante",
            Self::Intermediate => "intermedio",
            Self::Advanced => "avanzado",
        }
    }
}

/// A routine owned by a user; at most one should be active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRoutine {
    /// Row ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Routine name
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Spanish difficulty label
    pub difficulty_level: Option<String>,
    /// Estimated duration
    pub estimated_duration_minutes: Option<u32>,
    /// Whether the routine came from the generation call
    pub generated_by_ai: bool,
    /// Active flag
    pub is_active: bool,
    /// Muscle groups the routine targets
    pub target_muscle_groups: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// Exercises ordered by `order_index`
    #[serde(default)]
    pub routine_exercises: Vec<RoutineExercise>,
}

/// One exercise in a routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineExercise {
    /// Row ID
    pub id: Uuid,
    /// Parent routine
    pub routine_id: Uuid,
    /// Exercise name
    pub name: String,
    /// Number of sets
    pub sets: u32,
    /// Repetitions, free text such as "8-12"
    pub reps: String,
    /// Rest between sets in seconds
    pub rest_seconds: u32,
    /// Suggested load, free text such as "20 kg"
    pub weight_suggestion: Option<String>,
    /// Coaching notes
    pub notes: Option<String>,
    /// Position inside the routine, starting at 0
    pub order_index: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Arguments of the `create_workout_routine` tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedRoutine {
    /// Routine name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Target muscle groups
    #[serde(default)]
    pub target_muscle_groups: Vec<String>,
    /// Duration estimate
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
    /// Difficulty
    #[serde(default)]
    pub difficulty_level: Option<Difficulty>,
    /// Exercises in order
    pub exercises: Vec<GeneratedExercise>,
}

/// One exercise inside a [`GeneratedRoutine`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedExercise {
    /// Exercise name
    pub name: String,
    /// Number of sets
    pub sets: u32,
    /// Repetitions as text
    pub reps: String,
    /// Suggested load
    #[serde(default)]
    pub weight_suggestion: Option<String>,
    /// Rest in seconds
    pub rest_seconds: u32,
    /// Notes
    #[serde(default)]
    pub notes: Option<String>,
}
