// ABOUTME: coach-cli - command-line companion for the Coach IA server
// ABOUTME: Mints development tokens, streams a coach reply and runs one reminder pass
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors
//!
//! Usage:
//! ```bash
//! # Mint a development token
//! coach-cli token generate --user-id 7f0c... --email ana@example.com
//!
//! # Ask the coach something and print the streamed reply
//! coach-cli chat --server http://127.0.0.1:8081 --token $TOKEN --message "¿Qué entreno hoy?"
//!
//! # Run the reminder pass once against the configured database
//! coach-cli remind --once
//! ```

mod commands;

use clap::{Parser, Subcommand};
use coach_ia_server::config::{DatabaseUrl, ServerConfig};
use coach_ia_server::errors::AppResult;
use coach_ia_server::logging::{LogFormat, LoggingConfig};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "coach-cli",
    about = "Coach IA command-line client",
    long_about = "Development tokens, streamed chat with the coach and manual reminder passes."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Token management commands
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },

    /// Send one message to the coach and stream the reply
    Chat {
        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:8081")]
        server: String,

        /// Bearer token
        #[arg(long)]
        token: String,

        /// Message text
        #[arg(long)]
        message: String,
    },

    /// Run the coach reminder job
    Remind {
        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },
}

#[derive(Subcommand)]
enum TokenCommand {
    /// Mint a JWT for a user
    Generate {
        /// User ID the token is issued for
        #[arg(long)]
        user_id: Uuid,

        /// Email claim
        #[arg(long)]
        email: Option<String>,

        /// Lifetime in hours, configured default when omitted
        #[arg(long)]
        expires_hours: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: (if cli.verbose { "debug" } else { "warn" }).to_owned(),
        format: LogFormat::Compact,
        ..LoggingConfig::from_env()
    };
    if let Err(e) = logging.init() {
        eprintln!("Failed to initialize logging: {e}");
    }

    let mut config = ServerConfig::from_env()?;
    if let Some(url) = cli.database_url.as_deref() {
        config.database.url = DatabaseUrl::parse_url(url)?;
    }

    match cli.command {
        Command::Token {
            action:
                TokenCommand::Generate {
                    user_id,
                    email,
                    expires_hours,
                },
        } => commands::token::generate(&config, user_id, email.as_deref(), expires_hours),
        Command::Chat {
            server,
            token,
            message,
        } => commands::chat::run(&server, &token, &message).await,
        Command::Remind { once } => commands::remind::run(config, once).await,
    }
}
