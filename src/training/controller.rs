// ABOUTME: Applies training state machine effects through a persistence recorder
// ABOUTME: Storage failures become user-facing notices and never roll back local progress
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::state::{Effect, TrainingError, TrainingEvent, TrainingSession, WorkoutSummary};
use crate::constants::messages;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::NewCompletedSet;

/// Persistence side of a training session
#[async_trait]
pub trait TrainingRecorder: Send + Sync {
    /// Append a completed set
    async fn log_set(&self, session_id: Uuid, set: NewCompletedSet) -> AppResult<()>;

    /// Close the session row
    async fn complete_session(&self, session_id: Uuid, summary: WorkoutSummary) -> AppResult<()>;

    /// Add XP and optionally extend the streak
    async fn award_progress(&self, user_id: Uuid, xp: u32, increment_streak: bool) -> AppResult<()>;
}

/// Recorder writing straight to the service database
#[derive(Clone)]
pub struct DatabaseRecorder {
    database: Database,
}

impl DatabaseRecorder {
    /// Wrap a database handle
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl TrainingRecorder for DatabaseRecorder {
    async fn log_set(&self, session_id: Uuid, set: NewCompletedSet) -> AppResult<()> {
        self.database.sessions().log_set(session_id, &set).await?;
        Ok(())
    }

    async fn complete_session(&self, session_id: Uuid, summary: WorkoutSummary) -> AppResult<()> {
        self.database
            .sessions()
            .complete(session_id, summary.duration_seconds, summary.xp_earned)
            .await
    }

    async fn award_progress(&self, user_id: Uuid, xp: u32, increment_streak: bool) -> AppResult<()> {
        self.database
            .profiles()
            .award_progress(user_id, xp, increment_streak)
            .await?;
        Ok(())
    }
}

/// Toast shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notice {
    /// Positive confirmation
    Success(String),
    /// Something was not saved
    Error(String),
}

/// Drives a [`TrainingSession`] and persists what it emits
pub struct TrainingController<R> {
    session: TrainingSession,
    recorder: R,
    user_id: Uuid,
    session_id: Uuid,
}

impl<R: TrainingRecorder> TrainingController<R> {
    /// Bind a session to its stored row
    #[must_use]
    pub const fn new(session: TrainingSession, recorder: R, user_id: Uuid, session_id: Uuid) -> Self {
        Self {
            session,
            recorder,
            user_id,
            session_id,
        }
    }

    /// Local session state
    #[must_use]
    pub const fn session(&self) -> &TrainingSession {
        &self.session
    }

    /// Mutable access for weight adjustments
    pub fn session_mut(&mut self) -> &mut TrainingSession {
        &mut self.session
    }

    /// Apply one event and persist its effects
    ///
    /// # Errors
    ///
    /// Returns the state machine error for rejected events; persistence
    /// failures are reported as [`Notice::Error`] instead
    pub async fn dispatch(&mut self, event: TrainingEvent) -> Result<Vec<Notice>, TrainingError> {
        let effects = self.session.handle(event)?;
        let mut notices = Vec::new();
        for effect in effects {
            if let Some(notice) = self.apply(effect).await {
                notices.push(notice);
            }
        }
        Ok(notices)
    }

    async fn apply(&self, effect: Effect) -> Option<Notice> {
        match effect {
            Effect::LogSet {
                exercise_name,
                set_number,
                weight,
                reps,
            } => {
                let set = NewCompletedSet {
                    exercise_name,
                    set_number,
                    weight_used: Some(weight),
                    reps_completed: reps,
                };
                if let Err(e) = self.recorder.log_set(self.session_id, set).await {
                    warn!(session_id = %self.session_id, "Failed to log set: {e}");
                    return Some(Notice::Error(messages::SET_SAVE_FAILED.to_owned()));
                }
                None
            }
            Effect::ExerciseCompleted { index } => {
                info!(session_id = %self.session_id, index, "Exercise completed");
                None
            }
            Effect::WorkoutFinished(summary) => Some(self.finish(summary).await),
        }
    }

    async fn finish(&self, summary: WorkoutSummary) -> Notice {
        if let Err(e) = self
            .recorder
            .complete_session(self.session_id, summary)
            .await
        {
            warn!(session_id = %self.session_id, "Failed to complete session: {e}");
            return Notice::Error(messages::SESSION_SAVE_FAILED.to_owned());
        }

        let mode = self.session.mode();
        if let Err(e) = self
            .recorder
            .award_progress(self.user_id, summary.xp_earned, mode.increments_streak())
            .await
        {
            warn!(user_id = %self.user_id, "Failed to award progress: {e}");
            return Notice::Error(messages::PROGRESS_SAVE_FAILED.to_owned());
        }

        Notice::Success(if mode.increments_streak() {
            "¡Entrenamiento completado!".to_owned()
        } else {
            "¡Entrenamiento libre completado!".to_owned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::training::state::{PlannedExercise, TrainingMode, TrainingState};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryRecorder {
        sets: Mutex<Vec<NewCompletedSet>>,
        completed: Mutex<Vec<WorkoutSummary>>,
        awards: Mutex<Vec<(u32, bool)>>,
        fail_sets: bool,
    }

    #[async_trait]
    impl TrainingRecorder for MemoryRecorder {
        async fn log_set(&self, _session_id: Uuid, set: NewCompletedSet) -> AppResult<()> {
            if self.fail_sets {
                return Err(AppError::database("disk full"));
            }
            self.sets.lock().unwrap().push(set);
            Ok(())
        }

        async fn complete_session(&self, _session_id: Uuid, summary: WorkoutSummary) -> AppResult<()> {
            self.completed.lock().unwrap().push(summary);
            Ok(())
        }

        async fn award_progress(&self, _user_id: Uuid, xp: u32, increment_streak: bool) -> AppResult<()> {
            self.awards.lock().unwrap().push((xp, increment_streak));
            Ok(())
        }
    }

    fn one_exercise(mode: TrainingMode) -> TrainingSession {
        TrainingSession::new(
            mode,
            vec![PlannedExercise {
                name: "Dominadas".to_owned(),
                sets: 1,
                reps: "6".to_owned(),
                rest_seconds: 120,
                weight_suggestion: Some("10kg".to_owned()),
            }],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_routine_completion_persists_and_awards_streak() {
        let mut controller = TrainingController::new(
            one_exercise(TrainingMode::Routine),
            MemoryRecorder::default(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );

        let notices = controller.dispatch(TrainingEvent::SetCompleted).await.unwrap();
        assert_eq!(
            notices,
            vec![Notice::Success("¡Entrenamiento completado!".to_owned())]
        );
        let recorder = &controller.recorder;
        assert_eq!(recorder.sets.lock().unwrap()[0].weight_used.as_deref(), Some("10 kg"));
        assert_eq!(recorder.completed.lock().unwrap()[0].xp_earned, 60);
        assert_eq!(recorder.awards.lock().unwrap().as_slice(), &[(60, true)]);
    }

    #[tokio::test]
    async fn test_free_completion_awards_xp_only() {
        let mut controller = TrainingController::new(
            one_exercise(TrainingMode::Free),
            MemoryRecorder::default(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let notices = controller.dispatch(TrainingEvent::Finish).await.unwrap();
        assert_eq!(
            notices,
            vec![Notice::Success("¡Entrenamiento libre completado!".to_owned())]
        );
        assert_eq!(controller.recorder.awards.lock().unwrap().as_slice(), &[(25, false)]);
    }

    #[tokio::test]
    async fn test_failed_set_save_keeps_local_progress() {
        let recorder = MemoryRecorder {
            fail_sets: true,
            ..MemoryRecorder::default()
        };
        let mut controller = TrainingController::new(
            one_exercise(TrainingMode::Routine),
            recorder,
            Uuid::new_v4(),
            Uuid::new_v4(),
        );

        let notices = controller.dispatch(TrainingEvent::SetCompleted).await.unwrap();
        assert_eq!(notices[0], Notice::Error(messages::SET_SAVE_FAILED.to_owned()));
        assert!(matches!(
            controller.session().state(),
            TrainingState::Finished { .. }
        ));
    }
}
