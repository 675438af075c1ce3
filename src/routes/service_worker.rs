// ABOUTME: Serves the push notification service worker script
// ABOUTME: Embedded at compile time so the binary has no static file directory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use axum::http::{header, HeaderValue};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

/// Service worker source
pub const SERVICE_WORKER_JS: &str = include_str!("../../assets/sw.js");

/// Service worker routes handler
pub struct ServiceWorkerRoutes;

impl ServiceWorkerRoutes {
    /// Create the `/sw.js` route
    pub fn routes() -> Router {
        Router::new().route("/sw.js", get(Self::script))
    }

    async fn script() -> impl IntoResponse {
        (
            [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/javascript; charset=utf-8"),
                ),
                (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
                (
                    header::HeaderName::from_static("service-worker-allowed"),
                    HeaderValue::from_static("/"),
                ),
            ],
            SERVICE_WORKER_JS,
        )
    }
}
