// ABOUTME: Periodic coach reminder job over users with push notifications enabled
// ABOUTME: Filters due users, composes a message from their recent activity and sends it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

pub mod schedule;
pub mod templates;

pub use templates::{compose_message, MessageCategory};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, instrument, warn};

use crate::constants::push;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::NotificationSettings;
use crate::push::{PushMessage, PushSender};

/// Result of one reminder pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderReport {
    /// Users with notifications enabled and a subscription
    pub candidates: usize,
    /// Users that were due at this instant
    pub due: usize,
    /// Messages accepted by a push service
    pub notifications_sent: usize,
    /// Due users whose delivery failed
    pub failed: usize,
}

/// Reminder job
pub struct ReminderJob {
    database: Database,
    sender: PushSender,
}

impl ReminderJob {
    /// Create a job
    #[must_use]
    pub const fn new(database: Database, sender: PushSender) -> Self {
        Self { database, sender }
    }

    /// Run one pass at `now` with a fresh random source
    ///
    /// # Errors
    ///
    /// Returns an error only if listing candidates fails; per-user failures
    /// are logged and counted
    pub async fn run_once(&self, now: DateTime<Utc>) -> AppResult<ReminderReport> {
        let mut rng = StdRng::from_entropy();
        self.run_once_with_rng(now, &mut rng).await
    }

    /// Run one pass with a caller-provided random source
    ///
    /// # Errors
    ///
    /// Returns an error only if listing candidates fails
    #[instrument(skip(self, rng))]
    pub async fn run_once_with_rng<R: Rng + Send + ?Sized>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> AppResult<ReminderReport> {
        let candidates = self.database.notifications().enabled_with_subscription().await?;
        info!("Found {} users with notifications enabled", candidates.len());

        let mut report = ReminderReport {
            candidates: candidates.len(),
            ..ReminderReport::default()
        };

        for settings in candidates
            .iter()
            .filter(|settings| schedule::is_due(settings, now))
        {
            report.due += 1;
            match self.remind(settings, now, rng).await {
                Ok(true) => report.notifications_sent += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(user_id = %settings.user_id, "Error processing reminder: {e}");
                }
            }
        }

        info!(
            sent = report.notifications_sent,
            due = report.due,
            failed = report.failed,
            "Reminder pass completed"
        );
        Ok(report)
    }

    async fn remind<R: Rng + Send + ?Sized>(
        &self,
        settings: &NotificationSettings,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> AppResult<bool> {
        let user_id = settings.user_id;
        let profile = self.database.profiles().get(user_id).await?;
        let last_session = self.database.sessions().last_completed(user_id).await?;

        let days_since = last_session
            .and_then(|session| session.completed_at)
            .map(|completed_at| (now - completed_at).num_days().max(0));
        let streak = profile.as_ref().map_or(0, |p| p.streak_days);
        let (category, body) = compose_message(rng, days_since, streak);

        let message = PushMessage {
            title: Some(reminder_title(
                profile.as_ref().and_then(|p| p.full_name.as_deref()),
            )),
            body: Some(body),
            url: Some(push::DEFAULT_URL.to_owned()),
        };
        let outcome = self.sender.send(user_id, message).await?;
        if outcome.success {
            info!(user_id = %user_id, ?category, "Reminder sent");
        } else {
            warn!(user_id = %user_id, reason = ?outcome.reason, "Reminder not delivered");
        }
        Ok(outcome.success)
    }

    /// Run a pass every `period` in a background task
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        info!("Starting reminder job, running every {}s", period.as_secs());
        tokio::spawn(async move {
            let mut ticker = interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once(Utc::now()).await {
                    error!("Reminder job failed: {e}");
                }
            }
        })
    }
}

/// "Coach IA", personalized when the name is known
#[must_use]
pub fn reminder_title(full_name: Option<&str>) -> String {
    match full_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("{} para {name}", push::DEFAULT_TITLE),
        None => push::DEFAULT_TITLE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_title() {
        assert_eq!(reminder_title(Some("Ana")), "Coach IA para Ana");
        assert_eq!(reminder_title(Some("  ")), "Coach IA");
        assert_eq!(reminder_title(None), "Coach IA");
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let value = serde_json::to_value(ReminderReport {
            notifications_sent: 2,
            ..ReminderReport::default()
        })
        .unwrap();
        assert_eq!(value["notificationsSent"], 2);
    }
}
