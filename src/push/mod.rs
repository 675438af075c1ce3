// ABOUTME: Web Push delivery of coach reminders to stored browser subscriptions
// ABOUTME: Encrypts the payload, signs with VAPID, records delivery and drops expired subscriptions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! # Push Delivery
//!
//! [`PushSender::send`] is shared by the `send-push` endpoint and the reminder
//! job. Delivery problems with the push service are reported as
//! `success: false`, never as errors; only storage and configuration failures
//! surface as [`AppError`].

pub mod encryption;
pub mod vapid;

pub use encryption::encrypt_payload;
pub use vapid::VapidSigner;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::PushConfig;
use crate::constants::{messages, push};
use crate::database::Database;
use crate::errors::{AppError, AppResult};

/// Notification content chosen by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Title, "Coach IA" when absent
    #[serde(default)]
    pub title: Option<String>,
    /// Body, "¡Es hora de entrenar!" when absent
    #[serde(default)]
    pub body: Option<String>,
    /// Click target, "/training" when absent
    #[serde(default)]
    pub url: Option<String>,
}

/// Payload the service worker receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Title
    pub title: String,
    /// Body
    pub body: String,
    /// Icon path
    pub icon: String,
    /// Click target
    pub url: String,
    /// Notification tag
    pub tag: String,
}

impl From<PushMessage> for NotificationPayload {
    fn from(message: PushMessage) -> Self {
        let non_empty = |value: Option<String>, default: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };
        Self {
            title: non_empty(message.title, push::DEFAULT_TITLE),
            body: non_empty(message.body, push::DEFAULT_BODY),
            icon: push::ICON.to_owned(),
            url: non_empty(message.url, push::DEFAULT_URL),
            tag: push::REMINDER_TAG.to_owned(),
        }
    }
}

/// Result reported to callers of `send-push`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOutcome {
    /// Push service accepted the message
    pub success: bool,
    /// Why nothing was delivered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PushOutcome {
    const fn delivered() -> Self {
        Self {
            success: true,
            reason: None,
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
        }
    }
}

/// Sends push messages to users
#[derive(Clone)]
pub struct PushSender {
    client: Client,
    database: Database,
    signer: Option<Arc<VapidSigner>>,
    ttl_seconds: u32,
}

impl PushSender {
    /// Create a sender from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid VAPID keys or if the HTTP
    /// client cannot be built
    pub fn new(config: &PushConfig, database: Database) -> AppResult<Self> {
        let signer = VapidSigner::from_config(config)?;
        if signer.is_none() {
            warn!("VAPID keys not configured, push delivery disabled");
        }
        Self::with_signer(signer, config.ttl_seconds, database)
    }

    /// Create a sender with an explicit signer
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn with_signer(
        signer: Option<VapidSigner>,
        ttl_seconds: u32,
        database: Database,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build push client: {e}")))?;
        Ok(Self {
            client,
            database,
            signer: signer.map(Arc::new),
            ttl_seconds,
        })
    }

    /// Application server public key for browser subscription, if configured
    #[must_use]
    pub fn public_key(&self) -> Option<&str> {
        self.signer.as_deref().map(VapidSigner::public_key)
    }

    /// Deliver `message` to `user_id`'s stored subscription
    ///
    /// # Errors
    ///
    /// Returns database errors and a configuration error when VAPID keys are
    /// missing. Push service failures are reported in the outcome.
    #[instrument(skip(self, message), fields(user_id = %user_id))]
    pub async fn send(&self, user_id: Uuid, message: PushMessage) -> AppResult<PushOutcome> {
        let notifications = self.database.notifications();
        let settings = notifications.get(user_id).await?;
        let Some(subscription) = settings
            .filter(|s| s.notifications_enabled)
            .and_then(|s| s.push_subscription)
        else {
            info!("No subscription or notifications disabled");
            return Ok(PushOutcome::failed(messages::NO_SUBSCRIPTION));
        };

        let signer = self
            .signer
            .as_deref()
            .ok_or_else(|| AppError::config_missing("VAPID_PRIVATE_KEY"))?;

        let payload = serde_json::to_vec(&NotificationPayload::from(message))?;
        let body = match encrypt_payload(
            &payload,
            &subscription.keys.p256dh,
            &subscription.keys.auth,
        ) {
            Ok(body) => body,
            Err(e) => {
                warn!("Stored subscription keys are unusable: {}", e.message);
                return Ok(PushOutcome::failed("Invalid subscription keys"));
            }
        };
        let now = Utc::now();
        let authorization = match signer.authorization(&subscription.endpoint, now) {
            Ok(value) => value,
            Err(e) => {
                warn!("Stored subscription endpoint is unusable: {}", e.message);
                return Ok(PushOutcome::failed("Invalid subscription endpoint"));
            }
        };

        let response = self
            .client
            .post(&subscription.endpoint)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_ENCODING, "aes128gcm")
            .header(CONTENT_TYPE, "application/octet-stream")
            .header("TTL", self.ttl_seconds.to_string())
            .body(body)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Push request failed: {e}");
                return Ok(PushOutcome::failed("Push service unreachable"));
            }
        };

        let status = response.status();
        if status.is_success() {
            notifications.mark_notified(user_id, now).await?;
            info!(status = status.as_u16(), "Push notification sent");
            return Ok(PushOutcome::delivered());
        }

        let text = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %text, "Push send failed");
        if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
            notifications.clear_subscription(user_id).await?;
            info!("Expired subscription removed");
            return Ok(PushOutcome::failed("Subscription expired"));
        }
        Ok(PushOutcome::failed(format!(
            "Push service returned {}",
            status.as_u16()
        )))
    }
}
