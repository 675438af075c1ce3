// ABOUTME: Database operations for workout sessions and the completed set log
// ABOUTME: Sessions are created at training start and closed once at finish
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{format_timestamp, parse_optional_timestamp, parse_timestamp, parse_uuid, to_u32};
use crate::errors::{AppError, AppResult};
use crate::models::{CompletedSet, NewCompletedSet, WorkoutSession};

const SESSION_COLUMNS: &str =
    "id, user_id, routine_id, started_at, completed_at, duration_seconds, xp_earned, notes";

/// Session database operations manager
pub struct SessionManager {
    pool: SqlitePool,
}

impl SessionManager {
    /// Create a new session manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a session
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn start(&self, user_id: Uuid, routine_id: Option<Uuid>) -> AppResult<WorkoutSession> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            r"
            INSERT INTO workout_sessions (id, user_id, routine_id, started_at, xp_earned)
            VALUES ($1, $2, $3, $4, 0)
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(routine_id.map(|r| r.to_string()))
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to start session: {e}")))?;

        Ok(WorkoutSession {
            id,
            user_id,
            routine_id,
            started_at: now,
            completed_at: None,
            duration_seconds: None,
            xp_earned: 0,
            notes: None,
        })
    }

    /// One session owned by the user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get(&self, user_id: Uuid, session_id: Uuid) -> AppResult<Option<WorkoutSession>> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions WHERE id = $1 AND user_id = $2"
        ))
        .bind(session_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get session: {e}")))?;

        row.as_ref().map(row_to_session).transpose()
    }

    /// Append a completed set
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including an unknown session
    pub async fn log_set(&self, session_id: Uuid, set: &NewCompletedSet) -> AppResult<CompletedSet> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            r"
            INSERT INTO completed_sets (id, session_id, exercise_name, set_number, weight_used, reps_completed, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(id.to_string())
        .bind(session_id.to_string())
        .bind(&set.exercise_name)
        .bind(i64::from(set.set_number))
        .bind(set.weight_used.as_deref())
        .bind(set.reps_completed.map(i64::from))
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to log set: {e}")))?;

        Ok(CompletedSet {
            id,
            session_id,
            exercise_name: set.exercise_name.clone(),
            set_number: set.set_number,
            weight_used: set.weight_used.clone(),
            reps_completed: set.reps_completed,
            completed_at: now,
        })
    }

    /// Sets logged in a session, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn sets_for(&self, session_id: Uuid) -> AppResult<Vec<CompletedSet>> {
        let rows = sqlx::query(
            r"
            SELECT id, session_id, exercise_name, set_number, weight_used, reps_completed, completed_at
            FROM completed_sets
            WHERE session_id = $1
            ORDER BY completed_at ASC
            ",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get completed sets: {e}")))?;

        rows.iter().map(row_to_set).collect()
    }

    /// Close a session with its duration and XP
    ///
    /// # Errors
    ///
    /// Returns `INVALID_STATE` if the session is unknown or already closed
    pub async fn complete(
        &self,
        session_id: Uuid,
        duration_seconds: u32,
        xp_earned: u32,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE workout_sessions
            SET completed_at = $1, duration_seconds = $2, xp_earned = $3
            WHERE id = $4 AND completed_at IS NULL
            ",
        )
        .bind(format_timestamp(Utc::now()))
        .bind(i64::from(duration_seconds))
        .bind(i64::from(xp_earned))
        .bind(session_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to complete session: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::invalid_state(format!(
                "Session {session_id} is unknown or already completed"
            )));
        }
        Ok(())
    }

    /// Most recently completed session
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn last_completed(&self, user_id: Uuid) -> AppResult<Option<WorkoutSession>> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions \
             WHERE user_id = $1 AND completed_at IS NOT NULL \
             ORDER BY completed_at DESC LIMIT 1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get last session: {e}")))?;

        row.as_ref().map(row_to_session).transpose()
    }

    /// Sessions completed at or after `since`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn completed_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<WorkoutSession>> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions \
             WHERE user_id = $1 AND completed_at IS NOT NULL AND completed_at >= $2 \
             ORDER BY completed_at DESC"
        ))
        .bind(user_id.to_string())
        .bind(format_timestamp(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list sessions: {e}")))?;

        rows.iter().map(row_to_session).collect()
    }
}

fn row_to_session(row: &SqliteRow) -> AppResult<WorkoutSession> {
    let routine_id: Option<String> = row.get("routine_id");
    let duration: Option<i64> = row.get("duration_seconds");
    Ok(WorkoutSession {
        id: parse_uuid(row.get("id"), "workout_sessions.id")?,
        user_id: parse_uuid(row.get("user_id"), "workout_sessions.user_id")?,
        routine_id: routine_id
            .as_deref()
            .map(|r| parse_uuid(r, "workout_sessions.routine_id"))
            .transpose()?,
        started_at: parse_timestamp(row.get("started_at"), "workout_sessions.started_at")?,
        completed_at: parse_optional_timestamp(
            row.get("completed_at"),
            "workout_sessions.completed_at",
        )?,
        duration_seconds: duration.map(to_u32),
        xp_earned: to_u32(row.get("xp_earned")),
        notes: row.get("notes"),
    })
}

fn row_to_set(row: &SqliteRow) -> AppResult<CompletedSet> {
    let reps: Option<i64> = row.get("reps_completed");
    Ok(CompletedSet {
        id: parse_uuid(row.get("id"), "completed_sets.id")?,
        session_id: parse_uuid(row.get("session_id"), "completed_sets.session_id")?,
        exercise_name: row.get("exercise_name"),
        set_number: to_u32(row.get("set_number")),
        weight_used: row.get("weight_used"),
        reps_completed: reps.map(to_u32),
        completed_at: parse_timestamp(row.get("completed_at"), "completed_sets.completed_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use chrono::Duration;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let db = Database::in_memory().await.unwrap();
        let sessions = db.sessions();
        let user_id = Uuid::new_v4();

        let session = sessions.start(user_id, None).await.unwrap();
        for set_number in 1..=3 {
            sessions
                .log_set(
                    session.id,
                    &NewCompletedSet {
                        exercise_name: "Sentadilla".to_owned(),
                        set_number,
                        weight_used: Some("40 kg".to_owned()),
                        reps_completed: Some(10),
                    },
                )
                .await
                .unwrap();
        }
        sessions.complete(session.id, 1800, 60).await.unwrap();

        let sets = sessions.sets_for(session.id).await.unwrap();
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[2].set_number, 3);

        let last = sessions.last_completed(user_id).await.unwrap().unwrap();
        assert_eq!(last.duration_seconds, Some(1800));
        assert_eq!(last.xp_earned, 60);

        let recent = sessions
            .completed_since(user_id, Utc::now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[tokio::test]
    async fn test_complete_twice_is_rejected() {
        let db = Database::in_memory().await.unwrap();
        let sessions = db.sessions();
        let session = sessions.start(Uuid::new_v4(), None).await.unwrap();

        sessions.complete(session.id, 10, 25).await.unwrap();
        let error = sessions.complete(session.id, 20, 25).await.unwrap_err();
        assert_eq!(error.http_status(), 409);
    }

    #[tokio::test]
    async fn test_log_set_for_unknown_session_fails() {
        let db = Database::in_memory().await.unwrap();
        let result = db
            .sessions()
            .log_set(
                Uuid::new_v4(),
                &NewCompletedSet {
                    exercise_name: "Press".to_owned(),
                    set_number: 1,
                    weight_used: None,
                    reps_completed: None,
                },
            )
            .await;
        assert!(result.is_err());
    }
}
