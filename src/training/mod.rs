// ABOUTME: Guided training session: state machine, weight helpers, rest clock and persistence
// ABOUTME: Routine and free modes share one transition function with mode-specific XP rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

mod controller;
mod countdown;
mod state;
mod weight;

pub use controller::{DatabaseRecorder, Notice, TrainingController, TrainingRecorder};
pub use countdown::RestCountdown;
pub use state::{
    Effect, PlannedExercise, TrainingError, TrainingEvent, TrainingMode, TrainingSession,
    TrainingState, WorkoutSummary,
};
pub use weight::{adjust_weight, format_weight, initial_weight, planned_reps};
