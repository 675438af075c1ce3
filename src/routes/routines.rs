// ABOUTME: Read endpoints for the user's stored workout routines
// ABOUTME: The active routine carries its exercises in order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::errors::AppResult;
use crate::resources::ServerResources;

/// Routine routes handler
pub struct RoutineRoutes;

impl RoutineRoutes {
    /// Create all routine routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/routines", get(Self::list))
            .route("/api/routines/active", get(Self::active))
            .with_state(resources)
    }

    async fn list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<Value>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        let routines = resources.database.routines().list(user_id).await?;
        Ok(Json(json!({ "routines": routines })))
    }

    async fn active(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<Value>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        let routine = resources.database.routines().active_routine(user_id).await?;
        Ok(Json(json!({ "routine": routine })))
    }
}
