// ABOUTME: Profile endpoints for onboarding, goal changes and progress display
// ABOUTME: Every read and write is scoped to the authenticated user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::models::{ExperienceLevel, Goal, OnboardingInput, Profile};
use crate::resources::ServerResources;

/// Body of `PUT /api/profile/goal`
#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    /// New goal
    pub goal: Goal,
    /// New level, unchanged when absent
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
}

/// Profile routes handler
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Create all profile routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/profile", get(Self::get_profile).put(Self::save_profile))
            .route("/api/profile/onboarding", post(Self::save_profile))
            .route("/api/profile/goal", put(Self::update_goal))
            .with_state(resources)
    }

    async fn get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<Profile>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        resources
            .database
            .profiles()
            .get(user_id)
            .await?
            .map(Json)
            .ok_or_else(|| AppError::not_found("Profile"))
    }

    async fn save_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(input): Json<OnboardingInput>,
    ) -> AppResult<Json<Profile>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        if input.weight_kg.is_some_and(|w| w <= 0.0) || input.height_cm.is_some_and(|h| h <= 0.0) {
            return Err(AppError::invalid_input("Height and weight must be positive"));
        }
        let profile = resources
            .database
            .profiles()
            .upsert_onboarding(user_id, &input)
            .await?;
        Ok(Json(profile))
    }

    async fn update_goal(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdateGoalRequest>,
    ) -> AppResult<Json<Profile>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        let profile = resources
            .database
            .profiles()
            .update_goal(user_id, request.goal, request.experience_level)
            .await?;
        Ok(Json(profile))
    }
}
