// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into a typed ServerConfig shared read-only by services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! Environment-based configuration.
//!
//! `ServerConfig::from_env` runs once at process start. The result is wrapped
//! in an `Arc` inside `ServerResources` and never mutated afterwards.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{warn, Level};

use super::database::DatabaseConfig;
use crate::constants::{ports, push};
use crate::errors::{AppError, AppResult};

/// Secret used when `JWT_SECRET` is unset outside production
const DEVELOPMENT_JWT_SECRET: &str = "coach-ia-development-secret";

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational (default)
    #[default]
    Info,
    /// Debug output
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> Level {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        })
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Test runs
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Testing => "testing",
        })
    }
}

/// Bearer token validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 shared secret
    pub jwt_secret: String,
    /// Expected `aud` claim
    pub jwt_audience: String,
    /// Lifetime of tokens minted by the CLI
    pub jwt_expiry_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_owned(),
            jwt_audience: "authenticated".to_owned(),
            jwt_expiry_hours: 24,
        }
    }
}

/// OpenAI-compatible chat completion gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiGatewayConfig {
    /// Base URL ending before `/chat/completions`
    pub base_url: String,
    /// Bearer API key
    pub api_key: Option<String>,
    /// Model used by every proxy endpoint
    pub model: String,
    /// TCP connect timeout
    pub connect_timeout_secs: u64,
    /// Whole-request timeout, applied per call to non-streaming completions only
    pub request_timeout_secs: u64,
}

impl Default for AiGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ai.gateway.lovable.dev/v1".to_owned(),
            api_key: None,
            model: "google/gemini-2.5-flash".to_owned(),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
        }
    }
}

/// Speech synthesis and transcription provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Provider base URL
    pub base_url: String,
    /// `xi-api-key` value
    pub api_key: Option<String>,
    /// Voice used for synthesis
    pub voice_id: String,
    /// Synthesis model
    pub tts_model: String,
    /// Transcription model
    pub stt_model: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io/v1".to_owned(),
            api_key: None,
            voice_id: "nPczCjzI2devNBz1zQrb".to_owned(),
            tts_model: "eleven_turbo_v2_5".to_owned(),
            stt_model: "scribe_v1".to_owned(),
        }
    }
}

/// Web Push settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Uncompressed P-256 public key, base64url
    pub vapid_public_key: Option<String>,
    /// Raw 32-byte P-256 private scalar, base64url
    pub vapid_private_key: Option<String>,
    /// `sub` claim of VAPID tokens
    pub subject: String,
    /// `TTL` header sent to push services
    pub ttl_seconds: u32,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            vapid_public_key: None,
            vapid_private_key: None,
            subject: push::DEFAULT_VAPID_SUBJECT.to_owned(),
            ttl_seconds: push::DEFAULT_TTL_SECONDS,
        }
    }
}

/// Reminder job settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Run the background job inside the server process
    pub enabled: bool,
    /// Seconds between runs
    pub interval_secs: u64,
    /// Bearer secret accepted from schedulers on the cron and send-push endpoints
    pub service_secret: Option<String>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            service_secret: None,
        }
    }
}

/// CORS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// `*` or explicit origins
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_owned()],
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Deployment environment
    pub environment: Environment,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// AI gateway configuration
    pub ai: AiGatewayConfig,
    /// Voice provider configuration
    pub voice: VoiceConfig,
    /// Web Push configuration
    pub push: PushConfig,
    /// Reminder job configuration
    pub reminders: ReminderConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            http_port: ports::DEFAULT_HTTP_PORT,
            log_level: LogLevel::default(),
            environment: Environment::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            ai: AiGatewayConfig::default(),
            voice: VoiceConfig::default(),
            push: PushConfig::default(),
            reminders: ReminderConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean variable fails to parse, or if
    /// `JWT_SECRET` is missing in production
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();
        let environment =
            Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development"));

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => return Err(AppError::config_missing("JWT_SECRET")),
            _ => {
                warn!("JWT_SECRET not set, using development secret");
                defaults.auth.jwt_secret.clone()
            }
        };

        Ok(Self {
            host: env_var_or("HOST", &defaults.host),
            http_port: parse_env("HTTP_PORT", defaults.http_port)?,
            log_level: LogLevel::from_str_or_default(&env_var_or("LOG_LEVEL", "info")),
            environment,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig {
                jwt_secret,
                jwt_audience: env_var_or("JWT_AUDIENCE", &defaults.auth.jwt_audience),
                jwt_expiry_hours: parse_env("JWT_EXPIRY_HOURS", defaults.auth.jwt_expiry_hours)?,
            },
            ai: AiGatewayConfig {
                base_url: env_var_or("AI_GATEWAY_URL", &defaults.ai.base_url),
                api_key: optional_env("AI_GATEWAY_API_KEY"),
                model: env_var_or("AI_MODEL", &defaults.ai.model),
                connect_timeout_secs: parse_env(
                    "AI_CONNECT_TIMEOUT_SECS",
                    defaults.ai.connect_timeout_secs,
                )?,
                request_timeout_secs: parse_env(
                    "AI_REQUEST_TIMEOUT_SECS",
                    defaults.ai.request_timeout_secs,
                )?,
            },
            voice: VoiceConfig {
                base_url: env_var_or("ELEVENLABS_BASE_URL", &defaults.voice.base_url),
                api_key: optional_env("ELEVENLABS_API_KEY"),
                voice_id: env_var_or("ELEVENLABS_VOICE_ID", &defaults.voice.voice_id),
                tts_model: env_var_or("ELEVENLABS_TTS_MODEL", &defaults.voice.tts_model),
                stt_model: env_var_or("ELEVENLABS_STT_MODEL", &defaults.voice.stt_model),
            },
            push: PushConfig {
                vapid_public_key: optional_env("VAPID_PUBLIC_KEY"),
                vapid_private_key: optional_env("VAPID_PRIVATE_KEY"),
                subject: env_var_or("VAPID_SUBJECT", &defaults.push.subject),
                ttl_seconds: parse_env("PUSH_TTL_SECONDS", defaults.push.ttl_seconds)?,
            },
            reminders: ReminderConfig {
                enabled: parse_env("REMINDERS_ENABLED", defaults.reminders.enabled)?,
                interval_secs: parse_env(
                    "REMINDER_INTERVAL_SECS",
                    defaults.reminders.interval_secs,
                )?,
                service_secret: optional_env("CRON_SECRET"),
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&env_var_or("CORS_ALLOWED_ORIGINS", "*")),
            },
        })
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Coach IA Server Configuration: http={}:{} env={} log={} db={} ai_model={} ai_key={} voice={} vapid={} reminders={} every {}s cors={}",
            self.host,
            self.http_port,
            self.environment,
            self.log_level,
            self.database.url,
            self.ai.model,
            presence(self.ai.api_key.as_ref()),
            presence(self.voice.api_key.as_ref()),
            presence(self.push.vapid_private_key.as_ref()),
            if self.reminders.enabled { "on" } else { "off" },
            self.reminders.interval_secs,
            self.cors.allowed_origins.join(","),
        )
    }
}

const fn presence<T>(value: Option<&T>) -> &'static str {
    if value.is_some() {
        "configured"
    } else {
        "missing"
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Non-empty environment variable
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str.trim() == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("https://a.app, https://b.app,"),
            vec!["https://a.app", "https://b.app"]
        );
    }

    #[test]
    fn test_log_level_fallback() {
        assert_eq!(LogLevel::from_str_or_default("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::from_str_or_default("verbose"), LogLevel::Info);
    }

    #[test]
    #[serial]
    fn test_production_requires_jwt_secret() {
        env::set_var("ENVIRONMENT", "production");
        env::remove_var("JWT_SECRET");
        let result = ServerConfig::from_env();
        env::remove_var("ENVIRONMENT");

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        env::set_var("HTTP_PORT", "9090");
        env::set_var("AI_MODEL", "test/model");
        env::set_var("CORS_ALLOWED_ORIGINS", "https://coach.app");
        let config = ServerConfig::from_env().unwrap();
        env::remove_var("HTTP_PORT");
        env::remove_var("AI_MODEL");
        env::remove_var("CORS_ALLOWED_ORIGINS");

        assert_eq!(config.http_port, 9090);
        assert_eq!(config.ai.model, "test/model");
        assert_eq!(config.cors.allowed_origins, vec!["https://coach.app"]);
        assert!(!config.summary().contains(&config.auth.jwt_secret));
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_rejected() {
        env::set_var("HTTP_PORT", "not-a-port");
        let result = ServerConfig::from_env();
        env::remove_var("HTTP_PORT");

        assert!(result.is_err());
    }
}
