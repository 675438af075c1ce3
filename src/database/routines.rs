// ABOUTME: Database operations for workout routines and their ordered exercises
// ABOUTME: New routines supersede the active one via deactivate-then-insert, never deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{format_timestamp, parse_string_list, parse_timestamp, parse_uuid, to_u32};
use crate::errors::{AppError, AppResult};
use crate::models::{GeneratedRoutine, RoutineExercise, WorkoutRoutine};

const ROUTINE_COLUMNS: &str = "id, user_id, name, description, difficulty_level, \
     estimated_duration_minutes, generated_by_ai, is_active, target_muscle_groups, created_at, updated_at";

/// Routine database operations manager
pub struct RoutineManager {
    pool: SqlitePool,
}

impl RoutineManager {
    /// Create a new routine manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent active routine with exercises ordered by `order_index`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn active_routine(&self, user_id: Uuid) -> AppResult<Option<WorkoutRoutine>> {
        let row = sqlx::query(&format!(
            "SELECT {ROUTINE_COLUMNS} FROM workout_routines \
             WHERE user_id = $1 AND is_active = 1 \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get active routine: {e}")))?;

        match row {
            Some(row) => {
                let mut routine = row_to_routine(&row)?;
                routine.routine_exercises = self.exercises(routine.id).await?;
                Ok(Some(routine))
            }
            None => Ok(None),
        }
    }

    /// One routine owned by the user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get(&self, user_id: Uuid, routine_id: Uuid) -> AppResult<Option<WorkoutRoutine>> {
        let row = sqlx::query(&format!(
            "SELECT {ROUTINE_COLUMNS} FROM workout_routines WHERE id = $1 AND user_id = $2"
        ))
        .bind(routine_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get routine: {e}")))?;

        match row {
            Some(row) => {
                let mut routine = row_to_routine(&row)?;
                routine.routine_exercises = self.exercises(routine.id).await?;
                Ok(Some(routine))
            }
            None => Ok(None),
        }
    }

    /// All routines of a user, newest first, without exercises
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<WorkoutRoutine>> {
        let rows = sqlx::query(&format!(
            "SELECT {ROUTINE_COLUMNS} FROM workout_routines WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list routines: {e}")))?;

        rows.iter().map(row_to_routine).collect()
    }

    /// Exercises of a routine ordered by `order_index`
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn exercises(&self, routine_id: Uuid) -> AppResult<Vec<RoutineExercise>> {
        let rows = sqlx::query(
            r"
            SELECT id, routine_id, name, sets, reps, rest_seconds, weight_suggestion, notes, order_index, created_at
            FROM routine_exercises
            WHERE routine_id = $1
            ORDER BY order_index ASC
            ",
        )
        .bind(routine_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get routine exercises: {e}")))?;

        rows.iter().map(row_to_exercise).collect()
    }

    /// Clear `is_active` on every routine of the user
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn deactivate_all(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE workout_routines SET is_active = 0, updated_at = $1 WHERE user_id = $2 AND is_active = 1",
        )
        .bind(format_timestamp(Utc::now()))
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to deactivate routines: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Insert a generated routine as active, followed by its exercises
    ///
    /// Callers deactivate the previous routine first; the two steps are not atomic.
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails. A failure while inserting exercises
    /// leaves the routine row in place.
    pub async fn insert_generated(
        &self,
        user_id: Uuid,
        generated: &GeneratedRoutine,
    ) -> AppResult<WorkoutRoutine> {
        let routine_id = Uuid::new_v4();
        let now = Utc::now();
        let now_text = format_timestamp(now);
        let muscle_groups = serde_json::to_string(&generated.target_muscle_groups)?;
        let difficulty = generated.difficulty_level.map(|d| d.label_es().to_owned());

        sqlx::query(
            r"
            INSERT INTO workout_routines (id, user_id, name, description, difficulty_level,
                estimated_duration_minutes, generated_by_ai, is_active, target_muscle_groups, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 1, 1, $7, $8, $8)
            ",
        )
        .bind(routine_id.to_string())
        .bind(user_id.to_string())
        .bind(&generated.name)
        .bind(generated.description.as_deref())
        .bind(difficulty.as_deref())
        .bind(generated.estimated_duration_minutes.map(i64::from))
        .bind(&muscle_groups)
        .bind(&now_text)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create routine: {e}")))?;

        let mut exercises = Vec::with_capacity(generated.exercises.len());
        for (index, exercise) in generated.exercises.iter().enumerate() {
            let exercise_id = Uuid::new_v4();
            let order_index = u32::try_from(index).unwrap_or(u32::MAX);
            sqlx::query(
                r"
                INSERT INTO routine_exercises (id, routine_id, name, sets, reps, rest_seconds,
                    weight_suggestion, notes, order_index, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ",
            )
            .bind(exercise_id.to_string())
            .bind(routine_id.to_string())
            .bind(&exercise.name)
            .bind(i64::from(exercise.sets))
            .bind(&exercise.reps)
            .bind(i64::from(exercise.rest_seconds))
            .bind(exercise.weight_suggestion.as_deref())
            .bind(exercise.notes.as_deref())
            .bind(i64::from(order_index))
            .bind(&now_text)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create routine exercise: {e}")))?;

            exercises.push(RoutineExercise {
                id: exercise_id,
                routine_id,
                name: exercise.name.clone(),
                sets: exercise.sets,
                reps: exercise.reps.clone(),
                rest_seconds: exercise.rest_seconds,
                weight_suggestion: exercise.weight_suggestion.clone(),
                notes: exercise.notes.clone(),
                order_index,
                created_at: now,
            });
        }

        debug!(%user_id, %routine_id, exercises = exercises.len(), "Inserted generated routine");

        Ok(WorkoutRoutine {
            id: routine_id,
            user_id,
            name: generated.name.clone(),
            description: generated.description.clone(),
            difficulty_level: difficulty,
            estimated_duration_minutes: generated.estimated_duration_minutes,
            generated_by_ai: true,
            is_active: true,
            target_muscle_groups: generated.target_muscle_groups.clone(),
            created_at: now,
            updated_at: now,
            routine_exercises: exercises,
        })
    }

    /// Number of active routines, used to verify the one-active invariant
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_active(&self, user_id: Uuid) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workout_routines WHERE user_id = $1 AND is_active = 1",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count active routines: {e}")))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn row_to_routine(row: &SqliteRow) -> AppResult<WorkoutRoutine> {
    let duration: Option<i64> = row.get("estimated_duration_minutes");
    Ok(WorkoutRoutine {
        id: parse_uuid(row.get("id"), "workout_routines.id")?,
        user_id: parse_uuid(row.get("user_id"), "workout_routines.user_id")?,
        name: row.get("name"),
        description: row.get("description"),
        difficulty_level: row.get("difficulty_level"),
        estimated_duration_minutes: duration.map(to_u32),
        generated_by_ai: row.get::<i64, _>("generated_by_ai") != 0,
        is_active: row.get::<i64, _>("is_active") != 0,
        target_muscle_groups: parse_string_list(
            row.get("target_muscle_groups"),
            "workout_routines.target_muscle_groups",
        )?,
        created_at: parse_timestamp(row.get("created_at"), "workout_routines.created_at")?,
        updated_at: parse_timestamp(row.get("updated_at"), "workout_routines.updated_at")?,
        routine_exercises: Vec::new(),
    })
}

fn row_to_exercise(row: &SqliteRow) -> AppResult<RoutineExercise> {
    Ok(RoutineExercise {
        id: parse_uuid(row.get("id"), "routine_exercises.id")?,
        routine_id: parse_uuid(row.get("routine_id"), "routine_exercises.routine_id")?,
        name: row.get("name"),
        sets: to_u32(row.get("sets")),
        reps: row.get("reps"),
        rest_seconds: to_u32(row.get("rest_seconds")),
        weight_suggestion: row.get("weight_suggestion"),
        notes: row.get("notes"),
        order_index: to_u32(row.get("order_index")),
        created_at: parse_timestamp(row.get("created_at"), "routine_exercises.created_at")?,
    })
}
