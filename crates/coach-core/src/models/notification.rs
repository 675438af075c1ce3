// ABOUTME: Push subscription and reminder preference models
// ABOUTME: One notification settings row per user, keyed by user_id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Browser `PushSubscription.toJSON()` shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    /// Push service endpoint URL
    pub endpoint: String,
    /// Expiration as reported by the browser
    #[serde(default, rename = "expirationTime", skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    /// Client keys
    pub keys: PushSubscriptionKeys,
}

/// Client public key and auth secret, both base64url
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    /// Uncompressed P-256 public key of the user agent
    pub p256dh: String,
    /// 16-byte authentication secret
    pub auth: String,
}

/// Per-user notification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Owning user
    pub user_id: Uuid,
    /// Stored subscription, cleared on unsubscribe
    pub push_subscription: Option<PushSubscription>,
    /// Master switch
    pub notifications_enabled: bool,
    /// Preferred training time "HH:MM" (UTC)
    pub preferred_training_time: String,
    /// Spanish weekday names or frequency labels such as "4-5 días"
    pub training_days: Vec<String>,
    /// Last successful reminder
    pub last_notified_at: Option<DateTime<Utc>>,
}

/// Editable reminder preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Master switch
    #[serde(default)]
    pub notifications_enabled: Option<bool>,
    /// Preferred training time "HH:MM"
    #[serde(default)]
    pub preferred_training_time: Option<String>,
    /// Training days
    #[serde(default)]
    pub training_days: Option<Vec<String>>,
}
