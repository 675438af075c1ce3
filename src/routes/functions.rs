// ABOUTME: Serverless-style function endpoints under /functions/v1
// ABOUTME: Routine generation, streaming coach, form analysis, voice, push and reminder cron
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! Function routes
//!
//! Each handler authenticates, delegates to its service on
//! [`ServerResources`] and shapes the response the browser client expects.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::AuthMethod;
use crate::coach::UserContext;
use crate::errors::{AppError, AppResult};
use crate::llm::ChatMessage;
use crate::push::{PushMessage, PushOutcome};
use crate::resources::ServerResources;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `ai-coach`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachRequest {
    /// Conversation so far
    pub messages: Vec<ChatMessage>,
    /// Client-assembled context; loaded from storage when absent
    #[serde(default)]
    pub user_context: Option<UserContext>,
}

/// Body of `analyze-form`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeFormRequest {
    /// JPEG frame, base64 or data URL
    #[serde(default)]
    pub image_base64: Option<String>,
    /// Exercise being performed
    #[serde(default)]
    pub exercise_name: Option<String>,
    /// Ask for longer corrections
    #[serde(default)]
    pub detailed: bool,
}

/// Body of `tts-coach`
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    /// Text to speak
    #[serde(default)]
    pub text: Option<String>,
}

/// Body of `stt-coach`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SttRequest {
    /// Recorded audio, base64 or data URL
    #[serde(default)]
    pub audio: Option<String>,
    /// Recording MIME type
    #[serde(default = "default_audio_mime")]
    pub mime_type: String,
}

fn default_audio_mime() -> String {
    "audio/webm".to_owned()
}

/// Body of `send-push`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPushRequest {
    /// Recipient; defaults to the caller for user tokens
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Notification content
    #[serde(flatten)]
    pub message: PushMessage,
}

/// Response of `coach-reminder-cron`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronResponse {
    /// Always true when the pass ran
    pub success: bool,
    /// Deliveries accepted by push services
    pub notifications_sent: usize,
}

// ============================================================================
// Function Routes
// ============================================================================

/// Function routes handler
pub struct FunctionRoutes;

impl FunctionRoutes {
    /// Create all function routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/functions/v1/generate-workout", post(Self::generate_workout))
            .route("/functions/v1/ai-coach", post(Self::ai_coach))
            .route("/functions/v1/analyze-form", post(Self::analyze_form))
            .route("/functions/v1/tts-coach", post(Self::tts_coach))
            .route("/functions/v1/stt-coach", post(Self::stt_coach))
            .route("/functions/v1/send-push", post(Self::send_push))
            .route(
                "/functions/v1/coach-reminder-cron",
                post(Self::coach_reminder_cron),
            )
            .with_state(resources)
    }

    #[instrument(skip_all)]
    async fn generate_workout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<Value>> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        info!(user_id = %user_id, "Generating workout");
        let routine = resources.routines.generate(user_id).await?;
        Ok(Json(json!({ "routine": routine })))
    }

    #[instrument(skip_all)]
    async fn ai_coach(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CoachRequest>,
    ) -> AppResult<Response> {
        let user_id = resources.auth.authenticate_user(&headers)?;
        let stream = resources
            .coach
            .stream_reply(user_id, request.messages, request.user_context)
            .await?;

        Ok((
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream")),
                (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            ],
            Body::from_stream(stream),
        )
            .into_response())
    }

    #[instrument(skip_all)]
    async fn analyze_form(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<AnalyzeFormRequest>,
    ) -> AppResult<Json<Value>> {
        resources.auth.authenticate_user(&headers)?;
        let outcome = resources
            .vision
            .analyze(
                request.image_base64.as_deref().unwrap_or_default(),
                request.exercise_name.as_deref(),
                request.detailed,
            )
            .await?;
        Ok(Json(serde_json::to_value(outcome.into_analysis())?))
    }

    #[instrument(skip_all)]
    async fn tts_coach(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<TtsRequest>,
    ) -> AppResult<Response> {
        resources.auth.authenticate_user(&headers)?;
        let audio = resources
            .voice
            .synthesize(request.text.as_deref().unwrap_or_default())
            .await?;
        Ok((
            [(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"))],
            audio,
        )
            .into_response())
    }

    #[instrument(skip_all)]
    async fn stt_coach(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SttRequest>,
    ) -> AppResult<Json<Value>> {
        resources.auth.authenticate_user(&headers)?;
        let text = resources
            .voice
            .transcribe(
                request.audio.as_deref().unwrap_or_default(),
                &request.mime_type,
            )
            .await?;
        Ok(Json(json!({ "text": text })))
    }

    #[instrument(skip_all)]
    async fn send_push(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SendPushRequest>,
    ) -> AppResult<Json<PushOutcome>> {
        let auth = resources.auth.authenticate_user_or_service(&headers)?;
        let recipient = match (auth.method, auth.user_id, request.user_id) {
            (AuthMethod::ServiceSecret, _, Some(target)) => target,
            (AuthMethod::ServiceSecret, _, None) => {
                return Err(AppError::missing_field("userId is required"));
            }
            (AuthMethod::UserToken, Some(caller), target) => {
                if target.is_some_and(|target| target != caller) {
                    return Err(AppError::permission_denied(
                        "Users may only send notifications to themselves",
                    ));
                }
                caller
            }
            (AuthMethod::UserToken, None, _) => auth.require_user()?,
        };

        let outcome = resources.push.send(recipient, request.message).await?;
        Ok(Json(outcome))
    }

    #[instrument(skip_all)]
    async fn coach_reminder_cron(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> AppResult<Json<CronResponse>> {
        resources.auth.authenticate_service(&headers)?;
        let report = resources.reminders.run_once(Utc::now()).await?;
        Ok(Json(CronResponse {
            success: true,
            notifications_sent: report.notifications_sent,
        }))
    }
}
