// ABOUTME: Dashboard endpoint combining progress counters with the coach insight
// ABOUTME: Weekly sessions count completions in the trailing seven days
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;
use crate::insights::dashboard_insight;
use crate::models::WorkoutRoutine;
use crate::resources::ServerResources;

/// Dashboard payload
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    /// Coach insight text
    pub insight: String,
    /// Current streak
    pub streak_days: u32,
    /// Accumulated XP
    pub total_xp: u32,
    /// Sessions completed in the last 7 days
    pub weekly_sessions: usize,
    /// Active routine, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_routine: Option<WorkoutRoutine>,
}

/// Dashboard routes handler
pub struct DashboardRoutes;

impl DashboardRoutes {
    /// Create all dashboard routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/dashboard", get(Self::dashboard))
            .with_state(resources)
    }

    async fn dashboard(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<DashboardResponse>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        let now = Utc::now();
        let database = &resources.database;

        let profile = database.profiles().get(user_id).await?;
        let last_session = database.sessions().last_completed(user_id).await?;
        let weekly = database
            .sessions()
            .completed_since(user_id, now - Duration::days(7))
            .await?;
        let active_routine = database.routines().active_routine(user_id).await?;

        Ok(Json(DashboardResponse {
            insight: dashboard_insight(profile.as_ref(), last_session.as_ref(), now),
            streak_days: profile.as_ref().map_or(0, |p| p.streak_days),
            total_xp: profile.as_ref().map_or(0, |p| p.total_xp),
            weekly_sessions: weekly.len(),
            active_routine,
        }))
    }
}
