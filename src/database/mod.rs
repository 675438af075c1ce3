// ABOUTME: SQLite storage replacing the hosted backend-as-a-service tables
// ABOUTME: Owns the connection pool, inline migrations and per-table managers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! # Database Management
//!
//! Six tables: `profiles`, `workout_routines`, `routine_exercises`,
//! `workout_sessions`, `completed_sets` and `user_notifications`. IDs are UUID
//! strings, timestamps are RFC 3339 text and arrays are JSON text.
//!
//! No cross-table invariant is enforced by a transaction. In particular the
//! one-active-routine rule relies on deactivate-then-insert ordering only.

mod notifications;
mod profiles;
mod routines;
mod sessions;

pub use notifications::NotificationManager;
pub use profiles::ProfileManager;
pub use routines::RoutineManager;
pub use sessions::SessionManager;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::config::{DatabaseConfig, DatabaseUrl};
use crate::errors::{AppError, AppResult};

/// Database handle shared by all services
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the connection
    /// fails or a migration statement fails
    pub async fn new(config: &DatabaseConfig) -> AppResult<Self> {
        if let DatabaseUrl::SQLite { path } = &config.url {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::database(format!("Failed to create database directory: {e}"))
                })?;
            }
        }

        // Every in-memory connection is a separate database, so keep exactly one
        let max_connections = if config.url.is_memory() {
            1
        } else {
            config.max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&config.url.to_connection_string())
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!(url = %config.url, "Database ready");
        Ok(db)
    }

    /// In-memory database with migrations applied
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail
    pub async fn in_memory() -> AppResult<Self> {
        Self::new(&DatabaseConfig {
            url: DatabaseUrl::Memory,
            max_connections: 1,
        })
        .await
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Profile table operations
    #[must_use]
    pub fn profiles(&self) -> ProfileManager {
        ProfileManager::new(self.pool.clone())
    }

    /// Routine and routine exercise table operations
    #[must_use]
    pub fn routines(&self) -> RoutineManager {
        RoutineManager::new(self.pool.clone())
    }

    /// Session and completed set table operations
    #[must_use]
    pub fn sessions(&self) -> SessionManager {
        SessionManager::new(self.pool.clone())
    }

    /// Notification settings table operations
    #[must_use]
    pub fn notifications(&self) -> NotificationManager {
        NotificationManager::new(self.pool.clone())
    }

    /// Round-trip a trivial query, used by the readiness probe
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Database ping failed: {e}")))?;
        Ok(())
    }

    /// Run idempotent schema migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        }
        Ok(())
    }
}

const MIGRATIONS: [&str; 10] = [
    r"
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL UNIQUE,
        full_name TEXT,
        avatar_url TEXT,
        goal TEXT,
        experience_level TEXT,
        height_cm REAL,
        weight_kg REAL,
        streak_days INTEGER NOT NULL DEFAULT 0,
        total_xp INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS workout_routines (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        difficulty_level TEXT,
        estimated_duration_minutes INTEGER,
        generated_by_ai INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 0,
        target_muscle_groups TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_workout_routines_user ON workout_routines(user_id, is_active)",
    r"
    CREATE TABLE IF NOT EXISTS routine_exercises (
        id TEXT PRIMARY KEY,
        routine_id TEXT NOT NULL REFERENCES workout_routines(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        sets INTEGER NOT NULL DEFAULT 3,
        reps TEXT NOT NULL,
        rest_seconds INTEGER NOT NULL DEFAULT 60,
        weight_suggestion TEXT,
        notes TEXT,
        order_index INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS workout_sessions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        routine_id TEXT REFERENCES workout_routines(id),
        started_at TEXT NOT NULL,
        completed_at TEXT,
        duration_seconds INTEGER,
        xp_earned INTEGER NOT NULL DEFAULT 0,
        notes TEXT
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_workout_sessions_user ON workout_sessions(user_id, completed_at)",
    r"
    CREATE TABLE IF NOT EXISTS completed_sets (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL REFERENCES workout_sessions(id) ON DELETE CASCADE,
        exercise_name TEXT NOT NULL,
        set_number INTEGER NOT NULL,
        weight_used TEXT,
        reps_completed INTEGER,
        completed_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS user_notifications (
        user_id TEXT PRIMARY KEY,
        push_subscription TEXT,
        notifications_enabled INTEGER NOT NULL DEFAULT 0,
        preferred_training_time TEXT NOT NULL DEFAULT '18:00',
        training_days TEXT NOT NULL DEFAULT '[]',
        last_notified_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_routine_exercises_routine ON routine_exercises(routine_id, order_index)",
    "CREATE INDEX IF NOT EXISTS idx_completed_sets_session ON completed_sets(session_id)",
];

// ============================================================================
// Row decoding helpers
// ============================================================================

/// Fixed-width RFC 3339 so text ordering matches time ordering
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_uuid(raw: &str, column: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::database(format!("Invalid UUID in {column}: {e}")))
}

pub(crate) fn parse_timestamp(raw: &str, column: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid timestamp in {column}: {e}")))
}

pub(crate) fn parse_optional_timestamp(
    raw: Option<String>,
    column: &str,
) -> AppResult<Option<DateTime<Utc>>> {
    raw.as_deref()
        .map(|value| parse_timestamp(value, column))
        .transpose()
}

pub(crate) fn parse_string_list(raw: &str, column: &str) -> AppResult<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::database(format!("Invalid JSON array in {column}: {e}")))
}

/// Non-negative integer column to `u32`
pub(crate) fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
