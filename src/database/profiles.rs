// ABOUTME: Database operations for user profiles
// ABOUTME: Onboarding upsert, goal edits and XP/streak increments on workout completion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid, to_u32};
use crate::errors::{AppError, AppResult};
use crate::models::{ExperienceLevel, Goal, OnboardingInput, Profile};

const PROFILE_COLUMNS: &str = "id, user_id, full_name, avatar_url, goal, experience_level, \
     height_cm, weight_kg, streak_days, total_xp, created_at, updated_at";

/// Profile database operations manager
pub struct ProfileManager {
    pool: SqlitePool,
}

impl ProfileManager {
    /// Create a new profile manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the profile of a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be decoded
    pub async fn get(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;

        row.as_ref().map(row_to_profile).transpose()
    }

    /// Create or update the profile with onboarding answers
    ///
    /// Fields left as `None` keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn upsert_onboarding(
        &self,
        user_id: Uuid,
        input: &OnboardingInput,
    ) -> AppResult<Profile> {
        let now = format_timestamp(Utc::now());
        sqlx::query(
            r"
            INSERT INTO profiles (id, user_id, full_name, goal, experience_level, height_cm, weight_kg,
                                  streak_days, total_xp, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, 0, $8, $8)
            ON CONFLICT(user_id) DO UPDATE SET
                full_name = COALESCE(excluded.full_name, profiles.full_name),
                goal = COALESCE(excluded.goal, profiles.goal),
                experience_level = COALESCE(excluded.experience_level, profiles.experience_level),
                height_cm = COALESCE(excluded.height_cm, profiles.height_cm),
                weight_kg = COALESCE(excluded.weight_kg, profiles.weight_kg),
                updated_at = excluded.updated_at
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(input.full_name.as_deref())
        .bind(input.goal.map(Goal::as_str))
        .bind(input.experience_level.map(ExperienceLevel::as_str))
        .bind(input.height_cm)
        .bind(input.weight_kg)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save profile: {e}")))?;

        self.require(user_id).await
    }

    /// Change goal and optionally experience level
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` if the user has no profile
    pub async fn update_goal(
        &self,
        user_id: Uuid,
        goal: Goal,
        level: Option<ExperienceLevel>,
    ) -> AppResult<Profile> {
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET goal = $1,
                experience_level = COALESCE($2, experience_level),
                updated_at = $3
            WHERE user_id = $4
            ",
        )
        .bind(goal.as_str())
        .bind(level.map(ExperienceLevel::as_str))
        .bind(format_timestamp(Utc::now()))
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update goal: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Profile"));
        }
        self.require(user_id).await
    }

    /// Add XP and optionally extend the streak by one
    ///
    /// Users without a profile row are skipped and get `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn award_progress(
        &self,
        user_id: Uuid,
        xp: u32,
        increment_streak: bool,
    ) -> AppResult<Option<Profile>> {
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET total_xp = total_xp + $1,
                streak_days = streak_days + $2,
                updated_at = $3
            WHERE user_id = $4
            ",
        )
        .bind(i64::from(xp))
        .bind(i64::from(increment_streak))
        .bind(format_timestamp(Utc::now()))
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to award progress: {e}")))?;

        if result.rows_affected() == 0 {
            debug!(%user_id, xp, "No profile to award progress to");
            return Ok(None);
        }
        self.require(user_id).await.map(Some)
    }

    async fn require(&self, user_id: Uuid) -> AppResult<Profile> {
        self.get(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Profile"))
    }
}

fn row_to_profile(row: &SqliteRow) -> AppResult<Profile> {
    let goal: Option<String> = row.get("goal");
    let level: Option<String> = row.get("experience_level");
    Ok(Profile {
        id: parse_uuid(row.get("id"), "profiles.id")?,
        user_id: parse_uuid(row.get("user_id"), "profiles.user_id")?,
        full_name: row.get("full_name"),
        avatar_url: row.get("avatar_url"),
        // Unknown legacy values read as unset rather than failing the row
        goal: goal.and_then(|g| g.parse().ok()),
        experience_level: level.and_then(|l| l.parse().ok()),
        height_cm: row.get("height_cm"),
        weight_kg: row.get("weight_kg"),
        streak_days: to_u32(row.get("streak_days")),
        total_xp: to_u32(row.get("total_xp")),
        created_at: parse_timestamp(row.get("created_at"), "profiles.created_at")?,
        updated_at: parse_timestamp(row.get("updated_at"), "profiles.updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    #[tokio::test]
    async fn test_onboarding_then_award_progress() {
        let db = Database::in_memory().await.unwrap();
        let profiles = db.profiles();
        let user_id = Uuid::new_v4();

        let profile = profiles
            .upsert_onboarding(
                user_id,
                &OnboardingInput {
                    full_name: Some("Ana".to_owned()),
                    goal: Some(Goal::LoseFat),
                    experience_level: Some(ExperienceLevel::Beginner),
                    height_cm: Some(165.0),
                    weight_kg: Some(60.5),
                },
            )
            .await
            .unwrap();
        assert_eq!(profile.goal, Some(Goal::LoseFat));
        assert_eq!(profile.total_xp, 0);

        let profile = profiles
            .award_progress(user_id, 80, true)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.total_xp, 80);
        assert_eq!(profile.streak_days, 1);

        let profile = profiles
            .award_progress(user_id, 35, false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.total_xp, 115);
        assert_eq!(profile.streak_days, 1);
    }

    #[tokio::test]
    async fn test_award_progress_without_profile_is_skipped() {
        let db = Database::in_memory().await.unwrap();
        let profiles = db.profiles();
        let user_id = Uuid::new_v4();

        assert!(profiles
            .award_progress(user_id, 60, true)
            .await
            .unwrap()
            .is_none());
        assert!(profiles.get(user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_onboarding_keeps_existing_fields() {
        let db = Database::in_memory().await.unwrap();
        let profiles = db.profiles();
        let user_id = Uuid::new_v4();

        profiles
            .upsert_onboarding(
                user_id,
                &OnboardingInput {
                    full_name: Some("Luis".to_owned()),
                    weight_kg: Some(80.0),
                    ..OnboardingInput::default()
                },
            )
            .await
            .unwrap();
        let profile = profiles
            .upsert_onboarding(
                user_id,
                &OnboardingInput {
                    goal: Some(Goal::Strength),
                    ..OnboardingInput::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.full_name.as_deref(), Some("Luis"));
        assert_eq!(profile.weight_kg, Some(80.0));
        assert_eq!(profile.goal, Some(Goal::Strength));
    }

    #[tokio::test]
    async fn test_update_goal_without_profile_is_not_found() {
        let db = Database::in_memory().await.unwrap();
        let error = db
            .profiles()
            .update_goal(Uuid::new_v4(), Goal::Endurance, None)
            .await
            .unwrap_err();
        assert_eq!(error.http_status(), 404);
    }
}
