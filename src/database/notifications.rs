// ABOUTME: Database operations for per-user push subscriptions and reminder preferences
// ABOUTME: Subscription JSON and training days are stored as JSON text columns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{format_timestamp, parse_optional_timestamp, parse_string_list, parse_uuid};
use crate::constants::push::DEFAULT_TRAINING_TIME;
use crate::errors::{AppError, AppResult};
use crate::models::{NotificationPreferences, NotificationSettings, PushSubscription};

const NOTIFICATION_COLUMNS: &str = "user_id, push_subscription, notifications_enabled, \
     preferred_training_time, training_days, last_notified_at";

/// Notification settings database operations manager
pub struct NotificationManager {
    pool: SqlitePool,
}

impl NotificationManager {
    /// Create a new notification manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Settings of one user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or stored JSON is corrupt
    pub async fn get(&self, user_id: Uuid) -> AppResult<Option<NotificationSettings>> {
        let row = sqlx::query(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM user_notifications WHERE user_id = $1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get notification settings: {e}")))?;

        row.as_ref().map(row_to_settings).transpose()
    }

    /// Store a subscription and enable reminders
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub async fn subscribe(
        &self,
        user_id: Uuid,
        subscription: &PushSubscription,
    ) -> AppResult<NotificationSettings> {
        let json = serde_json::to_string(subscription)?;
        let now = format_timestamp(Utc::now());
        sqlx::query(
            r"
            INSERT INTO user_notifications (user_id, push_subscription, notifications_enabled,
                                            preferred_training_time, training_days, created_at, updated_at)
            VALUES ($1, $2, 1, $3, '[]', $4, $4)
            ON CONFLICT(user_id) DO UPDATE SET
                push_subscription = excluded.push_subscription,
                notifications_enabled = 1,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(json)
        .bind(DEFAULT_TRAINING_TIME)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save push subscription: {e}")))?;

        self.require(user_id).await
    }

    /// Drop the subscription and disable reminders
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn unsubscribe(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE user_notifications
            SET push_subscription = NULL, notifications_enabled = 0, updated_at = $1
            WHERE user_id = $2
            ",
        )
        .bind(format_timestamp(Utc::now()))
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to remove push subscription: {e}")))?;
        Ok(())
    }

    /// Clear a subscription the push service reported as gone, keeping preferences
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn clear_subscription(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE user_notifications SET push_subscription = NULL, updated_at = $1 WHERE user_id = $2",
        )
        .bind(format_timestamp(Utc::now()))
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to clear push subscription: {e}")))?;
        Ok(())
    }

    /// Update reminder preferences, creating the row if needed
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for a malformed training time, or a database error
    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        preferences: &NotificationPreferences,
    ) -> AppResult<NotificationSettings> {
        if let Some(time) = preferences.preferred_training_time.as_deref() {
            validate_training_time(time)?;
        }
        let days = preferences
            .training_days
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let now = format_timestamp(Utc::now());

        sqlx::query(
            r"
            INSERT INTO user_notifications (user_id, notifications_enabled, preferred_training_time,
                                            training_days, created_at, updated_at)
            VALUES ($1, COALESCE($2, 0), COALESCE($3, $4), COALESCE($5, '[]'), $6, $6)
            ON CONFLICT(user_id) DO UPDATE SET
                notifications_enabled = COALESCE($2, user_notifications.notifications_enabled),
                preferred_training_time = COALESCE($3, user_notifications.preferred_training_time),
                training_days = COALESCE($5, user_notifications.training_days),
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(preferences.notifications_enabled.map(i64::from))
        .bind(preferences.preferred_training_time.as_deref())
        .bind(DEFAULT_TRAINING_TIME)
        .bind(days)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update notification settings: {e}")))?;

        self.require(user_id).await
    }

    /// Users with reminders enabled and a stored subscription
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn enabled_with_subscription(&self) -> AppResult<Vec<NotificationSettings>> {
        let rows = sqlx::query(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM user_notifications \
             WHERE notifications_enabled = 1 AND push_subscription IS NOT NULL"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list notification settings: {e}")))?;

        rows.iter().map(row_to_settings).collect()
    }

    /// Record a delivered reminder
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn mark_notified(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE user_notifications SET last_notified_at = $1, updated_at = $1 WHERE user_id = $2",
        )
        .bind(format_timestamp(at))
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record notification: {e}")))?;
        Ok(())
    }

    async fn require(&self, user_id: Uuid) -> AppResult<NotificationSettings> {
        self.get(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification settings"))
    }
}

/// Accepts "HH:MM" with a 24-hour clock
fn validate_training_time(time: &str) -> AppResult<()> {
    let valid = time
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?, m.len())))
        .is_some_and(|(h, m, m_len)| h < 24 && m < 60 && m_len == 2);
    if valid {
        Ok(())
    } else {
        Err(AppError::invalid_input(format!(
            "preferred_training_time must be HH:MM, got '{time}'"
        )))
    }
}

fn row_to_settings(row: &SqliteRow) -> AppResult<NotificationSettings> {
    let subscription: Option<String> = row.get("push_subscription");
    let push_subscription = subscription
        .as_deref()
        .map(serde_json::from_str::<PushSubscription>)
        .transpose()
        .map_err(|e| AppError::database(format!("Invalid push subscription JSON: {e}")))?;

    Ok(NotificationSettings {
        user_id: parse_uuid(row.get("user_id"), "user_notifications.user_id")?,
        push_subscription,
        notifications_enabled: row.get::<i64, _>("notifications_enabled") != 0,
        preferred_training_time: row.get("preferred_training_time"),
        training_days: parse_string_list(
            row.get("training_days"),
            "user_notifications.training_days",
        )?,
        last_notified_at: parse_optional_timestamp(
            row.get("last_notified_at"),
            "user_notifications.last_notified_at",
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::PushSubscriptionKeys;

    fn subscription() -> PushSubscription {
        PushSubscription {
            endpoint: "https://push.example.com/send/abc".to_owned(),
            expiration_time: None,
            keys: PushSubscriptionKeys {
                p256dh: "BPub".to_owned(),
                auth: "c2VjcmV0".to_owned(),
            },
        }
    }

    #[tokio::test]
    async fn test_subscribe_enables_and_unsubscribe_disables() {
        let db = Database::in_memory().await.unwrap();
        let notifications = db.notifications();
        let user_id = Uuid::new_v4();

        let settings = notifications.subscribe(user_id, &subscription()).await.unwrap();
        assert!(settings.notifications_enabled);
        assert_eq!(settings.preferred_training_time, "18:00");
        assert_eq!(notifications.enabled_with_subscription().await.unwrap().len(), 1);

        notifications.unsubscribe(user_id).await.unwrap();
        let settings = notifications.get(user_id).await.unwrap().unwrap();
        assert!(!settings.notifications_enabled);
        assert!(settings.push_subscription.is_none());
        assert!(notifications.enabled_with_subscription().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preferences_survive_resubscribe() {
        let db = Database::in_memory().await.unwrap();
        let notifications = db.notifications();
        let user_id = Uuid::new_v4();

        notifications
            .update_preferences(
                user_id,
                &NotificationPreferences {
                    notifications_enabled: None,
                    preferred_training_time: Some("07:30".to_owned()),
                    training_days: Some(vec!["Lunes".to_owned(), "Jueves".to_owned()]),
                },
            )
            .await
            .unwrap();
        let settings = notifications.subscribe(user_id, &subscription()).await.unwrap();

        assert_eq!(settings.preferred_training_time, "07:30");
        assert_eq!(settings.training_days, vec!["Lunes", "Jueves"]);
        assert_eq!(settings.push_subscription, Some(subscription()));
    }

    #[tokio::test]
    async fn test_clear_subscription_keeps_enabled_flag() {
        let db = Database::in_memory().await.unwrap();
        let notifications = db.notifications();
        let user_id = Uuid::new_v4();
        notifications.subscribe(user_id, &subscription()).await.unwrap();

        notifications.clear_subscription(user_id).await.unwrap();
        notifications.mark_notified(user_id, Utc::now()).await.unwrap();

        let settings = notifications.get(user_id).await.unwrap().unwrap();
        assert!(settings.notifications_enabled);
        assert!(settings.push_subscription.is_none());
        assert!(settings.last_notified_at.is_some());
    }

    #[tokio::test]
    async fn test_invalid_training_time_rejected() {
        let db = Database::in_memory().await.unwrap();
        let error = db
            .notifications()
            .update_preferences(
                Uuid::new_v4(),
                &NotificationPreferences {
                    preferred_training_time: Some("25:00".to_owned()),
                    ..NotificationPreferences::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(error.http_status(), 400);
    }
}
