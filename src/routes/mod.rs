// ABOUTME: HTTP surface of the Coach IA server organized by domain
// ABOUTME: Merges function, table and operational routes and applies the shared layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! Route modules
//!
//! - `/functions/v1/*`: AI, voice, push and cron functions
//! - `/api/*`: profile, routines, sessions, dashboard and notifications
//! - `/health`, `/ready`, `/sw.js`

/// Dashboard summary
pub mod dashboard;
/// Serverless-style functions
pub mod functions;
/// Health and readiness
pub mod health;
/// Reminder settings and push subscriptions
pub mod notifications;
/// Profile and onboarding
pub mod profile;
/// Stored routines
pub mod routines;
/// Service worker script
pub mod service_worker;
/// Workout sessions
pub mod sessions;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Uri;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

pub use dashboard::DashboardRoutes;
pub use functions::FunctionRoutes;
pub use health::HealthRoutes;
pub use notifications::NotificationRoutes;
pub use profile::ProfileRoutes;
pub use routines::RoutineRoutes;
pub use service_worker::ServiceWorkerRoutes;
pub use sessions::SessionRoutes;

use crate::errors::AppError;
use crate::middleware::{setup_cors, with_request_tracing};
use crate::resources::ServerResources;

/// Largest accepted request body; camera frames and voice notes arrive base64-encoded
pub const MAX_BODY_BYTES: usize = 15 * 1024 * 1024;

/// Assemble every route with CORS, body limit and request tracing
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config.cors);

    let router = Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(FunctionRoutes::routes(Arc::clone(&resources)))
        .merge(ProfileRoutes::routes(Arc::clone(&resources)))
        .merge(RoutineRoutes::routes(Arc::clone(&resources)))
        .merge(SessionRoutes::routes(Arc::clone(&resources)))
        .merge(DashboardRoutes::routes(Arc::clone(&resources)))
        .merge(NotificationRoutes::routes(resources))
        .merge(ServiceWorkerRoutes::routes())
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors);

    with_request_tracing(router)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("Route {}", uri.path()))
}
