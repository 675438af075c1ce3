// ABOUTME: Server binary for the Coach IA HTTP service and reminder scheduler
// ABOUTME: Loads configuration, opens storage, starts the reminder job and serves the router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

#![recursion_limit = "256"]

//! # Coach IA Server Binary
//!
//! Serves the `/functions/v1` and `/api` routes and, when enabled, runs the
//! coach reminder pass on a fixed interval.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use coach_ia_server::config::{DatabaseUrl, ServerConfig};
use coach_ia_server::database::Database;
use coach_ia_server::logging;
use coach_ia_server::resources::ServerResources;
use coach_ia_server::routes::build_router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "coach-ia-server")]
#[command(about = "Coach IA - training, AI coach and push reminder backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL (`sqlite:./data/coach.db` or `sqlite::memory:`)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(url) = args.database_url.as_deref() {
        config.database.url = DatabaseUrl::parse_url(url)?;
    }

    info!("Starting Coach IA server");
    info!("{}", config.summary());

    let database = Database::new(&config.database).await?;
    info!("Database initialized: {}", config.database.url);

    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::new(Arc::clone(&config), database)?);

    let reminder_task = if config.reminders.enabled {
        Some(
            Arc::clone(&resources.reminders)
                .spawn(Duration::from_secs(config.reminders.interval_secs)),
        )
    } else {
        info!("Reminder job disabled");
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.http_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    let result = axum::serve(listener, build_router(resources))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(task) = reminder_task {
        task.abort();
    }
    if let Err(e) = result {
        error!("Server error: {e}");
        return Err(e.into());
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutdown signal received");
}
