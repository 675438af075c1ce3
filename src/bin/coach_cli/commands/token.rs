// ABOUTME: Development token minting for coach-cli
// ABOUTME: Signs with the configured secret so the local server accepts the token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use coach_ia_server::auth::AuthManager;
use coach_ia_server::config::ServerConfig;
use coach_ia_server::errors::{AppError, AppResult};
use tracing::info;
use uuid::Uuid;

/// Print a JWT for `user_id`
pub fn generate(
    config: &ServerConfig,
    user_id: Uuid,
    email: Option<&str>,
    expires_hours: Option<i64>,
) -> AppResult<()> {
    let mut auth_config = config.auth.clone();
    if let Some(hours) = expires_hours {
        if hours <= 0 {
            return Err(AppError::invalid_input("--expires-hours must be positive"));
        }
        auth_config.jwt_expiry_hours = hours;
    }

    let manager = AuthManager::new(&auth_config, None);
    let token = manager.generate_token(user_id, email)?;
    info!(user_id = %user_id, hours = auth_config.jwt_expiry_hours, "Token generated");

    println!("{token}");
    Ok(())
}
