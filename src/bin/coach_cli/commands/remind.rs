// ABOUTME: Runs the coach reminder job from the command line
// ABOUTME: Single pass with --once, otherwise the configured interval until interrupted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use coach_ia_server::config::ServerConfig;
use coach_ia_server::database::Database;
use coach_ia_server::errors::{AppError, AppResult};
use coach_ia_server::push::PushSender;
use coach_ia_server::reminders::ReminderJob;
use tokio::signal;

/// Run the reminder job against the configured database
pub async fn run(config: ServerConfig, once: bool) -> AppResult<()> {
    let database = Database::new(&config.database).await?;
    let sender = PushSender::new(&config.push, database.clone())?;
    let job = Arc::new(ReminderJob::new(database, sender));

    if once {
        let report = job.run_once(Utc::now()).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let task = job.spawn(Duration::from_secs(config.reminders.interval_secs));
    signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to wait for Ctrl-C: {e}")))?;
    task.abort();
    Ok(())
}
