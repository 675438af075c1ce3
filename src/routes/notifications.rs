// ABOUTME: Reminder preference and Web Push subscription endpoints
// ABOUTME: Exposes the VAPID public key the browser needs to subscribe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

use crate::constants::push;
use crate::errors::{AppError, AppResult};
use crate::models::{NotificationPreferences, NotificationSettings, PushSubscription};
use crate::resources::ServerResources;

/// Settings plus the key needed to subscribe
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationsResponse {
    /// Stored settings, defaults when none exist
    pub settings: NotificationSettings,
    /// Application server key, base64url
    pub vapid_public_key: Option<String>,
}

/// Notification routes handler
pub struct NotificationRoutes;

impl NotificationRoutes {
    /// Create all notification routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/notifications",
                get(Self::get_settings).put(Self::update_preferences),
            )
            .route("/api/notifications/subscribe", post(Self::subscribe))
            .route("/api/notifications/unsubscribe", post(Self::unsubscribe))
            .with_state(resources)
    }

    fn default_settings(user_id: Uuid) -> NotificationSettings {
        NotificationSettings {
            user_id,
            push_subscription: None,
            notifications_enabled: false,
            preferred_training_time: push::DEFAULT_TRAINING_TIME.to_owned(),
            training_days: Vec::new(),
            last_notified_at: None,
        }
    }

    async fn get_settings(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<NotificationsResponse>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        let settings = resources
            .database
            .notifications()
            .get(user_id)
            .await?
            .unwrap_or_else(|| Self::default_settings(user_id));
        Ok(Json(NotificationsResponse {
            settings,
            vapid_public_key: resources.push.public_key().map(str::to_owned),
        }))
    }

    async fn update_preferences(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(preferences): Json<NotificationPreferences>,
    ) -> AppResult<Json<NotificationSettings>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        let settings = resources
            .database
            .notifications()
            .update_preferences(user_id, &preferences)
            .await?;
        Ok(Json(settings))
    }

    async fn subscribe(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(subscription): Json<PushSubscription>,
    ) -> AppResult<Json<NotificationSettings>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        let valid_endpoint = Url::parse(&subscription.endpoint)
            .is_ok_and(|url| matches!(url.scheme(), "https" | "http"));
        if !valid_endpoint || subscription.keys.p256dh.is_empty() || subscription.keys.auth.is_empty() {
            return Err(AppError::invalid_input("Invalid push subscription"));
        }
        let settings = resources
            .database
            .notifications()
            .subscribe(user_id, &subscription)
            .await?;
        Ok(Json(settings))
    }

    async fn unsubscribe(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<Value>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        resources.database.notifications().unsubscribe(user_id).await?;
        Ok(Json(json!({ "success": true })))
    }
}
