// ABOUTME: Training session progression as a closed state machine
// ABOUTME: One transition function turns taps and timer ticks into states and persistence effects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::weight::{adjust_weight, format_weight, initial_weight, planned_reps};
use crate::constants::training;
use crate::models::RoutineExercise;

// ============================================================================
// Plan
// ============================================================================

/// One exercise as the session sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedExercise {
    /// Exercise name
    pub name: String,
    /// Number of sets, at least 1
    pub sets: u32,
    /// Repetition scheme, e.g. "8-12"
    pub reps: String,
    /// Rest after a set of this exercise
    pub rest_seconds: u32,
    /// Suggested load, e.g. "50-60kg"
    #[serde(default)]
    pub weight_suggestion: Option<String>,
}

impl PlannedExercise {
    /// Free-training exercise with no suggestion
    #[must_use]
    pub fn free(name: impl Into<String>, sets: u32, reps: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sets,
            reps: reps.into(),
            rest_seconds: training::FREE_DEFAULT_REST_SECONDS,
            weight_suggestion: None,
        }
    }
}

impl From<&RoutineExercise> for PlannedExercise {
    fn from(exercise: &RoutineExercise) -> Self {
        Self {
            name: exercise.name.clone(),
            sets: exercise.sets,
            reps: exercise.reps.clone(),
            rest_seconds: exercise.rest_seconds,
            weight_suggestion: exercise.weight_suggestion.clone(),
        }
    }
}

/// Where the workout came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    /// Following the active routine
    Routine,
    /// Exercises picked by the user
    Free,
}

impl TrainingMode {
    /// XP for finishing with `exercises_completed` exercises done
    #[must_use]
    pub const fn xp_for(self, exercises_completed: u32) -> u32 {
        match self {
            Self::Routine => training::ROUTINE_BASE_XP
                .saturating_add(training::ROUTINE_XP_PER_EXERCISE.saturating_mul(exercises_completed)),
            Self::Free => training::FREE_BASE_XP
                .saturating_add(training::FREE_XP_PER_EXERCISE.saturating_mul(exercises_completed)),
        }
    }

    /// Whether finishing extends the streak
    #[must_use]
    pub const fn increments_streak(self) -> bool {
        matches!(self, Self::Routine)
    }

    /// Rest offered after a set of `exercise`
    #[must_use]
    pub const fn rest_for(self, exercise: &PlannedExercise) -> u32 {
        match self {
            Self::Routine => exercise.rest_seconds,
            Self::Free => training::FREE_DEFAULT_REST_SECONDS,
        }
    }
}

// ============================================================================
// States, events, effects
// ============================================================================

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrainingState {
    /// Performing `set_number` of `exercise_index`
    Exercising {
        /// 0-based exercise index
        exercise_index: usize,
        /// 1-based set number
        set_number: u32,
    },
    /// A set was logged; the user picks rest or continue
    ChoosingRestOrContinue {
        /// Exercise to perform next
        exercise_index: usize,
        /// Set to perform next
        set_number: u32,
        /// Rest offered
        pending_rest_seconds: u32,
    },
    /// Rest countdown running
    Resting {
        /// Exercise to perform next
        exercise_index: usize,
        /// Set to perform next
        set_number: u32,
        /// Seconds left
        remaining_seconds: u32,
    },
    /// Terminal
    Finished {
        /// Exercises fully completed
        exercises_completed: u32,
    },
}

impl TrainingState {
    const fn name(self) -> &'static str {
        match self {
            Self::Exercising { .. } => "exercising",
            Self::ChoosingRestOrContinue { .. } => "choosing_rest_or_continue",
            Self::Resting { .. } => "resting",
            Self::Finished { .. } => "finished",
        }
    }

    /// Exercise and set the user is on, `None` once finished
    #[must_use]
    pub const fn position(self) -> Option<(usize, u32)> {
        match self {
            Self::Exercising {
                exercise_index,
                set_number,
            }
            | Self::ChoosingRestOrContinue {
                exercise_index,
                set_number,
                ..
            }
            | Self::Resting {
                exercise_index,
                set_number,
                ..
            } => Some((exercise_index, set_number)),
            Self::Finished { .. } => None,
        }
    }
}

/// User actions and timer ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingEvent {
    /// "Set complete" tapped
    SetCompleted,
    /// Rest chosen after a set
    ChooseRest,
    /// Continue chosen after a set
    ChooseContinue,
    /// One second elapsed
    Tick,
    /// Rest cut short
    SkipRest,
    /// Session timer paused
    Pause,
    /// Session timer resumed
    Resume,
    /// "Finish" tapped
    Finish,
}

/// Summary shown after the workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    /// Active seconds
    pub duration_seconds: u32,
    /// XP awarded
    pub xp_earned: u32,
    /// Exercises fully completed
    pub exercises_completed: u32,
}

/// Side effects for the caller to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a completed set
    LogSet {
        /// Exercise name
        exercise_name: String,
        /// 1-based set number
        set_number: u32,
        /// Load as text, e.g. "40 kg"
        weight: String,
        /// Planned reps when numeric
        reps: Option<u32>,
    },
    /// Every set of an exercise is done
    ExerciseCompleted {
        /// 0-based exercise index
        index: usize,
    },
    /// The workout ended
    WorkoutFinished(WorkoutSummary),
}

/// Rejected transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrainingError {
    /// A workout needs at least one exercise
    #[error("workout has no exercises")]
    NoExercises,
    /// The workout already finished
    #[error("workout already finished")]
    AlreadyFinished,
    /// Event not accepted in the current state
    #[error("{event:?} is not valid while {state}")]
    InvalidTransition {
        /// Rejected event
        event: TrainingEvent,
        /// Current state name
        state: &'static str,
    },
}

// ============================================================================
// Session
// ============================================================================

/// A workout in progress
#[derive(Debug, Clone)]
pub struct TrainingSession {
    mode: TrainingMode,
    exercises: Vec<PlannedExercise>,
    weights: Vec<u32>,
    state: TrainingState,
    elapsed_seconds: u32,
    paused: bool,
    exercises_completed: u32,
}

impl TrainingSession {
    /// Start at set 1 of the first exercise
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::NoExercises`] for an empty plan
    pub fn new(mode: TrainingMode, exercises: Vec<PlannedExercise>) -> Result<Self, TrainingError> {
        if exercises.is_empty() {
            return Err(TrainingError::NoExercises);
        }
        let exercises: Vec<PlannedExercise> = exercises
            .into_iter()
            .map(|mut exercise| {
                exercise.sets = exercise.sets.max(1);
                exercise
            })
            .collect();
        let weights = exercises
            .iter()
            .map(|e| initial_weight(e.weight_suggestion.as_deref()))
            .collect();
        Ok(Self {
            mode,
            exercises,
            weights,
            state: TrainingState::Exercising {
                exercise_index: 0,
                set_number: 1,
            },
            elapsed_seconds: 0,
            paused: false,
            exercises_completed: 0,
        })
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> TrainingState {
        self.state
    }

    /// Workout mode
    #[must_use]
    pub const fn mode(&self) -> TrainingMode {
        self.mode
    }

    /// Planned exercises
    #[must_use]
    pub fn exercises(&self) -> &[PlannedExercise] {
        &self.exercises
    }

    /// Exercise the user is on
    #[must_use]
    pub fn current_exercise(&self) -> Option<&PlannedExercise> {
        self.state
            .position()
            .and_then(|(index, _)| self.exercises.get(index))
    }

    /// Working weight of the current exercise
    #[must_use]
    pub fn current_weight(&self) -> Option<u32> {
        self.state
            .position()
            .and_then(|(index, _)| self.weights.get(index).copied())
    }

    /// Change the current working weight, returning the new value
    pub fn adjust_weight(&mut self, delta: i32) -> Option<u32> {
        let (index, _) = self.state.position()?;
        let weight = self.weights.get_mut(index)?;
        *weight = adjust_weight(*weight, delta);
        Some(*weight)
    }

    /// Active seconds so far
    #[must_use]
    pub const fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    /// True while paused
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Exercises fully completed
    #[must_use]
    pub const fn exercises_completed(&self) -> u32 {
        self.exercises_completed
    }

    /// Overall progress in percent
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        let total = self.exercises.len() as f64;
        match self.state {
            TrainingState::Finished { .. } => 100.0,
            state => {
                let partial = state
                    .position()
                    .and_then(|(index, set_number)| {
                        self.exercises
                            .get(index)
                            .map(|e| f64::from(set_number - 1) / f64::from(e.sets))
                    })
                    .unwrap_or(0.0);
                ((f64::from(self.exercises_completed) + partial) / total * 100.0).min(100.0)
            }
        }
    }

    /// Apply one event
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::AlreadyFinished`] after the workout ended and
    /// [`TrainingError::InvalidTransition`] for events the state does not accept
    pub fn handle(&mut self, event: TrainingEvent) -> Result<Vec<Effect>, TrainingError> {
        if matches!(self.state, TrainingState::Finished { .. }) {
            return Err(TrainingError::AlreadyFinished);
        }

        match (event, self.state) {
            (TrainingEvent::Pause, _) => {
                self.paused = true;
                Ok(Vec::new())
            }
            (TrainingEvent::Resume, _) => {
                self.paused = false;
                Ok(Vec::new())
            }
            (TrainingEvent::Finish, _) => Ok(vec![self.finish()]),
            (
                TrainingEvent::Tick,
                TrainingState::Resting {
                    exercise_index,
                    set_number,
                    remaining_seconds,
                },
            ) => {
                let remaining_seconds = remaining_seconds.saturating_sub(1);
                self.state = if remaining_seconds == 0 {
                    TrainingState::Exercising {
                        exercise_index,
                        set_number,
                    }
                } else {
                    TrainingState::Resting {
                        exercise_index,
                        set_number,
                        remaining_seconds,
                    }
                };
                Ok(Vec::new())
            }
            (TrainingEvent::Tick, _) => {
                if !self.paused {
                    self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
                }
                Ok(Vec::new())
            }
            (
                TrainingEvent::SetCompleted,
                TrainingState::Exercising {
                    exercise_index,
                    set_number,
                },
            ) => Ok(self.complete_set(exercise_index, set_number)),
            (
                TrainingEvent::ChooseRest,
                TrainingState::ChoosingRestOrContinue {
                    exercise_index,
                    set_number,
                    pending_rest_seconds,
                },
            ) => {
                self.state = if pending_rest_seconds == 0 {
                    TrainingState::Exercising {
                        exercise_index,
                        set_number,
                    }
                } else {
                    TrainingState::Resting {
                        exercise_index,
                        set_number,
                        remaining_seconds: pending_rest_seconds,
                    }
                };
                Ok(Vec::new())
            }
            (
                TrainingEvent::ChooseContinue,
                TrainingState::ChoosingRestOrContinue {
                    exercise_index,
                    set_number,
                    ..
                },
            )
            | (
                TrainingEvent::SkipRest,
                TrainingState::Resting {
                    exercise_index,
                    set_number,
                    ..
                },
            ) => {
                self.state = TrainingState::Exercising {
                    exercise_index,
                    set_number,
                };
                Ok(Vec::new())
            }
            (event, state) => Err(TrainingError::InvalidTransition {
                event,
                state: state.name(),
            }),
        }
    }

    fn complete_set(&mut self, exercise_index: usize, set_number: u32) -> Vec<Effect> {
        let Some(exercise) = self.exercises.get(exercise_index) else {
            return vec![self.finish()];
        };
        let weight = self.weights.get(exercise_index).copied().unwrap_or(0);
        let rest = self.mode.rest_for(exercise);
        let sets = exercise.sets;
        let mut effects = vec![Effect::LogSet {
            exercise_name: exercise.name.clone(),
            set_number,
            weight: format_weight(weight),
            reps: planned_reps(&exercise.reps),
        }];

        if set_number < sets {
            self.state = TrainingState::ChoosingRestOrContinue {
                exercise_index,
                set_number: set_number + 1,
                pending_rest_seconds: rest,
            };
            return effects;
        }

        self.exercises_completed += 1;
        effects.push(Effect::ExerciseCompleted {
            index: exercise_index,
        });
        if exercise_index + 1 < self.exercises.len() {
            self.state = TrainingState::ChoosingRestOrContinue {
                exercise_index: exercise_index + 1,
                set_number: 1,
                pending_rest_seconds: rest,
            };
        } else {
            effects.push(self.finish());
        }
        effects
    }

    fn finish(&mut self) -> Effect {
        let summary = WorkoutSummary {
            duration_seconds: self.elapsed_seconds,
            xp_earned: self.mode.xp_for(self.exercises_completed),
            exercises_completed: self.exercises_completed,
        };
        self.state = TrainingState::Finished {
            exercises_completed: self.exercises_completed,
        };
        Effect::WorkoutFinished(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Vec<PlannedExercise> {
        vec![
            PlannedExercise {
                name: "Sentadilla".to_owned(),
                sets: 3,
                reps: "8-10".to_owned(),
                rest_seconds: 90,
                weight_suggestion: Some("50-60kg".to_owned()),
            },
            PlannedExercise {
                name: "Press banca".to_owned(),
                sets: 2,
                reps: "10".to_owned(),
                rest_seconds: 60,
                weight_suggestion: None,
            },
        ]
    }

    fn count_finished(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::WorkoutFinished(_)))
            .count()
    }

    #[test]
    fn test_completing_every_set_finishes_exactly_once() {
        let mut session = TrainingSession::new(TrainingMode::Routine, plan()).unwrap();
        let mut finished = 0;
        let mut logged = 0;

        loop {
            let effects = session.handle(TrainingEvent::SetCompleted).unwrap();
            logged += effects
                .iter()
                .filter(|e| matches!(e, Effect::LogSet { .. }))
                .count();
            finished += count_finished(&effects);
            if matches!(session.state(), TrainingState::Finished { .. }) {
                break;
            }
            session.handle(TrainingEvent::ChooseContinue).unwrap();
        }

        assert_eq!(finished, 1);
        assert_eq!(logged, 5);
        assert_eq!(
            session.state(),
            TrainingState::Finished {
                exercises_completed: 2
            }
        );
        assert_eq!(
            session.handle(TrainingEvent::Finish),
            Err(TrainingError::AlreadyFinished)
        );
    }

    #[test]
    fn test_xp_formulas() {
        assert_eq!(TrainingMode::Routine.xp_for(4), 90);
        assert_eq!(TrainingMode::Free.xp_for(4), 45);
        assert_eq!(TrainingMode::Routine.xp_for(0), 50);
        assert!(TrainingMode::Routine.increments_streak());
        assert!(!TrainingMode::Free.increments_streak());
    }

    #[test]
    fn test_set_progression_and_rest_choice() {
        let mut session = TrainingSession::new(TrainingMode::Routine, plan()).unwrap();
        let effects = session.handle(TrainingEvent::SetCompleted).unwrap();
        assert_eq!(
            effects,
            vec![Effect::LogSet {
                exercise_name: "Sentadilla".to_owned(),
                set_number: 1,
                weight: "50 kg".to_owned(),
                reps: Some(8),
            }]
        );
        assert_eq!(
            session.state(),
            TrainingState::ChoosingRestOrContinue {
                exercise_index: 0,
                set_number: 2,
                pending_rest_seconds: 90
            }
        );

        session.handle(TrainingEvent::ChooseRest).unwrap();
        assert!(matches!(
            session.state(),
            TrainingState::Resting {
                remaining_seconds: 90,
                ..
            }
        ));
    }

    #[test]
    fn test_rest_reaches_zero_after_exactly_n_ticks() {
        let mut session = TrainingSession::new(TrainingMode::Routine, plan()).unwrap();
        session.handle(TrainingEvent::SetCompleted).unwrap();
        session.handle(TrainingEvent::ChooseRest).unwrap();

        for _ in 0..89 {
            session.handle(TrainingEvent::Tick).unwrap();
            assert!(matches!(session.state(), TrainingState::Resting { .. }));
        }
        session.handle(TrainingEvent::Tick).unwrap();
        assert_eq!(
            session.state(),
            TrainingState::Exercising {
                exercise_index: 0,
                set_number: 2
            }
        );
        assert_eq!(session.elapsed_seconds(), 0);
    }

    #[test]
    fn test_skip_rest_and_zero_rest() {
        let mut exercises = plan();
        exercises[0].rest_seconds = 0;
        let mut session = TrainingSession::new(TrainingMode::Routine, exercises).unwrap();
        session.handle(TrainingEvent::SetCompleted).unwrap();
        session.handle(TrainingEvent::ChooseRest).unwrap();
        assert!(matches!(session.state(), TrainingState::Exercising { .. }));

        let mut session = TrainingSession::new(TrainingMode::Routine, plan()).unwrap();
        session.handle(TrainingEvent::SetCompleted).unwrap();
        session.handle(TrainingEvent::ChooseRest).unwrap();
        session.handle(TrainingEvent::SkipRest).unwrap();
        assert!(matches!(session.state(), TrainingState::Exercising { .. }));
    }

    #[test]
    fn test_last_set_advances_exercise() {
        let mut session = TrainingSession::new(TrainingMode::Free, plan()).unwrap();
        for _ in 0..2 {
            session.handle(TrainingEvent::SetCompleted).unwrap();
            session.handle(TrainingEvent::ChooseContinue).unwrap();
        }
        let effects = session.handle(TrainingEvent::SetCompleted).unwrap();
        assert!(effects.contains(&Effect::ExerciseCompleted { index: 0 }));
        assert_eq!(
            session.state(),
            TrainingState::ChoosingRestOrContinue {
                exercise_index: 1,
                set_number: 1,
                pending_rest_seconds: 90
            }
        );
    }

    #[test]
    fn test_finish_mid_workout_counts_completed_only() {
        let mut session = TrainingSession::new(TrainingMode::Free, plan()).unwrap();
        session.handle(TrainingEvent::Tick).unwrap();
        session.handle(TrainingEvent::Tick).unwrap();
        let effects = session.handle(TrainingEvent::Finish).unwrap();
        assert_eq!(
            effects,
            vec![Effect::WorkoutFinished(WorkoutSummary {
                duration_seconds: 2,
                xp_earned: 25,
                exercises_completed: 0
            })]
        );
    }

    #[test]
    fn test_pause_stops_elapsed_clock() {
        let mut session = TrainingSession::new(TrainingMode::Routine, plan()).unwrap();
        session.handle(TrainingEvent::Tick).unwrap();
        session.handle(TrainingEvent::Pause).unwrap();
        session.handle(TrainingEvent::Tick).unwrap();
        session.handle(TrainingEvent::Resume).unwrap();
        session.handle(TrainingEvent::Tick).unwrap();
        assert_eq!(session.elapsed_seconds(), 2);
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut session = TrainingSession::new(TrainingMode::Routine, plan()).unwrap();
        assert!(matches!(
            session.handle(TrainingEvent::ChooseRest),
            Err(TrainingError::InvalidTransition { .. })
        ));
        session.handle(TrainingEvent::SetCompleted).unwrap();
        assert!(session.handle(TrainingEvent::SetCompleted).is_err());
    }

    #[test]
    fn test_weight_and_progress() {
        let mut session = TrainingSession::new(TrainingMode::Routine, plan()).unwrap();
        assert_eq!(session.current_weight(), Some(50));
        assert_eq!(session.adjust_weight(-60), Some(0));
        assert!(session.progress_percent().abs() < f64::EPSILON);

        session.handle(TrainingEvent::SetCompleted).unwrap();
        let progress = session.progress_percent();
        assert!((progress - 100.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_plan_is_rejected() {
        assert_eq!(
            TrainingSession::new(TrainingMode::Free, Vec::new()).unwrap_err(),
            TrainingError::NoExercises
        );
    }
}
