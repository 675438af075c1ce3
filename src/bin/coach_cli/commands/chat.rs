// ABOUTME: Streams one coach reply from a running server to stdout
// ABOUTME: Parses the relayed SSE stream incrementally with the chat accumulator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::io::{self, Write};

use coach_ia_server::coach::collect_reply_with;
use coach_ia_server::errors::{AppError, AppResult};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::json;

/// Send `message` to the coach and print fragments as they arrive
pub async fn run(server: &str, token: &str, message: &str) -> AppResult<()> {
    let url = format!("{}/functions/v1/ai-coach", server.trim_end_matches('/'));
    let response = Client::new()
        .post(url)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .json(&json!({ "messages": [{ "role": "user", "content": message }] }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::external_service(
            "coach-ia-server",
            format!("HTTP {}: {body}", status.as_u16()),
        ));
    }

    let mut stdout = io::stdout();
    collect_reply_with(response.bytes_stream(), |fragment| {
        let _ = write!(stdout, "{fragment}");
        let _ = stdout.flush();
    })
    .await?;
    println!();
    Ok(())
}
