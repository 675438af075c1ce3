// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory resources over a mocked AI gateway plus token helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `coach_ia_server`

use std::sync::{Arc, Once};

use axum::Router;
use coach_ia_server::config::{AiGatewayConfig, ServerConfig};
use coach_ia_server::database::Database;
use coach_ia_server::resources::ServerResources;
use coach_ia_server::routes::build_router;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::MockServer;

static INIT_LOGGER: Once = Once::new();

/// Scheduler secret configured on every test server
pub const TEST_SERVICE_SECRET: &str = "test-cron-secret";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration pointing the AI gateway at `gateway`
pub fn test_config(gateway: &MockServer) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.ai = AiGatewayConfig {
        base_url: format!("{}/v1", gateway.uri()),
        api_key: Some("test-key".to_owned()),
        ..AiGatewayConfig::default()
    };
    config.voice.base_url = format!("{}/voice", gateway.uri());
    config.voice.api_key = Some("xi-test".to_owned());
    config.reminders.enabled = false;
    config.reminders.service_secret = Some(TEST_SERVICE_SECRET.to_owned());
    config
}

/// Router, resources and the mocked gateway behind them
pub struct TestApp {
    pub resources: Arc<ServerResources>,
    pub gateway: MockServer,
}

impl TestApp {
    /// In-memory database, default config and a fresh mock gateway
    pub async fn spawn() -> Self {
        init_test_logging();
        let gateway = MockServer::start().await;
        let config = Arc::new(test_config(&gateway));
        let database = Database::in_memory().await.unwrap();
        let resources = Arc::new(ServerResources::new(config, database).unwrap());
        Self { resources, gateway }
    }

    /// Fresh router over the shared resources
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.resources))
    }

    /// Storage behind the router
    pub fn database(&self) -> &Database {
        &self.resources.database
    }

    /// Signed token for a new random user
    pub fn new_user(&self) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let token = self
            .resources
            .auth
            .generate_token(user_id, Some("atleta@example.com"))
            .unwrap();
        (user_id, token)
    }
}

/// `Authorization` value for `token`
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Gateway reply carrying a forced tool call
pub fn tool_call_response(name: &str, arguments: &Value) -> Value {
    json!({
        "model": "google/gemini-2.5-flash",
        "choices": [{
            "message": {"tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": name, "arguments": arguments.to_string()}
            }]},
            "finish_reason": "tool_calls"
        }]
    })
}

/// Gateway reply carrying plain text
pub fn text_response(content: &str) -> Value {
    json!({
        "model": "google/gemini-2.5-flash",
        "choices": [{
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

/// Routine arguments as the model returns them
pub fn routine_arguments() -> Value {
    json!({
        "name": "Fuerza total",
        "description": "Rutina de cuerpo completo",
        "target_muscle_groups": ["piernas", "pecho", "espalda"],
        "estimated_duration_minutes": 45,
        "difficulty_level": "intermediate",
        "exercises": [
            {"name": "Sentadilla", "sets": 4, "reps": "8-10", "weight_suggestion": "60 kg", "rest_seconds": 90},
            {"name": "Press banca", "sets": 3, "reps": "10", "rest_seconds": 60},
            {"name": "Remo con barra", "sets": 3, "reps": "12", "rest_seconds": 60}
        ]
    })
}
