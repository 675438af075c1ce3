// ABOUTME: Workout session endpoints: start, append sets, list sets and complete
// ABOUTME: Completion applies the XP and streak rules of the session's mode
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{CompletedSet, NewCompletedSet, Profile, WorkoutSession};
use crate::resources::ServerResources;
use crate::training::TrainingMode;

/// Body of `POST /api/sessions`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    /// Routine being followed; free training when absent
    #[serde(default)]
    pub routine_id: Option<Uuid>,
}

/// Body of `POST /api/sessions/:id/complete`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionRequest {
    /// Active seconds
    pub duration_seconds: u32,
    /// Exercises fully completed
    pub exercises_completed: u32,
}

/// Response of `POST /api/sessions/:id/complete`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionResponse {
    /// XP awarded
    pub xp_earned: u32,
    /// Whether the streak grew
    pub streak_incremented: bool,
    /// Profile after the award, absent for users who skipped onboarding
    pub profile: Option<Profile>,
}

/// Session routes handler
pub struct SessionRoutes;

impl SessionRoutes {
    /// Create all session routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/sessions", post(Self::start))
            .route(
                "/api/sessions/:id/sets",
                post(Self::log_set).get(Self::list_sets),
            )
            .route("/api/sessions/:id/complete", post(Self::complete))
            .with_state(resources)
    }

    async fn owned_session(
        resources: &ServerResources,
        user_id: Uuid,
        session_id: Uuid,
    ) -> AppResult<WorkoutSession> {
        resources
            .database
            .sessions()
            .get(user_id, session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session"))
    }

    async fn start(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<StartSessionRequest>,
    ) -> AppResult<(StatusCode, Json<WorkoutSession>)> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        if let Some(routine_id) = request.routine_id {
            resources
                .database
                .routines()
                .get(user_id, routine_id)
                .await?
                .ok_or_else(|| AppError::not_found("Routine"))?;
        }
        let session = resources
            .database
            .sessions()
            .start(user_id, request.routine_id)
            .await?;
        Ok((StatusCode::CREATED, Json(session)))
    }

    async fn log_set(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(session_id): Path<Uuid>,
        Json(set): Json<NewCompletedSet>,
    ) -> AppResult<(StatusCode, Json<CompletedSet>)> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        if set.exercise_name.trim().is_empty() || set.set_number == 0 {
            return Err(AppError::invalid_input(
                "exercise_name and a positive set_number are required",
            ));
        }
        let session = Self::owned_session(&resources, user_id, session_id).await?;
        let stored = resources.database.sessions().log_set(session.id, &set).await?;
        Ok((StatusCode::CREATED, Json(stored)))
    }

    async fn list_sets(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(session_id): Path<Uuid>,
    ) -> AppResult<Json<Vec<CompletedSet>>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        let session = Self::owned_session(&resources, user_id, session_id).await?;
        let sets = resources.database.sessions().sets_for(session.id).await?;
        Ok(Json(sets))
    }

    async fn complete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(session_id): Path<Uuid>,
        Json(request): Json<CompleteSessionRequest>,
    ) -> AppResult<Json<CompleteSessionResponse>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        let session = Self::owned_session(&resources, user_id, session_id).await?;

        let mode = if session.routine_id.is_some() {
            TrainingMode::Routine
        } else {
            TrainingMode::Free
        };
        let xp_earned = mode.xp_for(request.exercises_completed);
        let streak_incremented = mode.increments_streak();

        resources
            .database
            .sessions()
            .complete(session.id, request.duration_seconds, xp_earned)
            .await?;
        let profile = resources
            .database
            .profiles()
            .award_progress(user_id, xp_earned, streak_incremented)
            .await?;

        info!(user_id = %user_id, session_id = %session.id, xp_earned, ?mode, "Session completed");
        Ok(Json(CompleteSessionResponse {
            xp_earned,
            streak_incremented,
            profile,
        }))
    }
}
