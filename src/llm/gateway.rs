// ABOUTME: OpenAI-compatible chat-completions client for the hosted AI gateway
// ABOUTME: Implements plain, forced-tool and raw streaming calls with status classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, instrument, warn};

use super::{
    ByteStream, ChatMessage, ChatRequest, ChatResponse, GatewayError, LlmCapabilities,
    LlmProvider, ToolCall, ToolDefinition,
};
use crate::config::AiGatewayConfig;
use crate::errors::{AppError, UpstreamFailure};

const SERVICE_NAME: &str = "AI gateway";

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Serialize)]
struct OpenAiTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: &'a ToolDefinition,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCall {
    function: OpenAiFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

// ============================================================================
// Gateway Client
// ============================================================================

/// Client for the OpenAI-compatible AI gateway
#[derive(Clone)]
pub struct AiGateway {
    client: Client,
    config: AiGatewayConfig,
}

impl AiGateway {
    /// Build a client with the configured connect timeout
    ///
    /// The whole-request timeout is applied per call and only to
    /// non-streaming completions, so relayed replies are never cut short.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &AiGatewayConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::config_missing("AI_GATEWAY_API_KEY"))
    }

    fn model<'a>(&'a self, request: &'a ChatRequest) -> &'a str {
        request.model.as_deref().unwrap_or(&self.config.model)
    }

    /// POST to chat/completions, classifying non-2xx statuses
    async fn send(&self, body: &OpenAiRequest<'_>) -> Result<Response, GatewayError> {
        let api_key = self.api_key()?;
        let streaming = body.stream == Some(true);
        let accept = if streaming {
            "text/event-stream"
        } else {
            "application/json"
        };

        let mut builder = self
            .client
            .post(self.api_url("chat/completions"))
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, accept)
            .json(body);
        if !streaming {
            builder = builder.timeout(Duration::from_secs(self.config.request_timeout_secs));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to {SERVICE_NAME}: {e}");
                AppError::from(e)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "{SERVICE_NAME} returned an error");
        Err(GatewayError::Upstream(UpstreamFailure::classify(
            status.as_u16(),
            &text,
        )))
    }

    async fn parse_json(response: Response) -> Result<OpenAiResponse, GatewayError> {
        let body = response.text().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("Failed to read response: {e}"))
        })?;
        serde_json::from_str(&body).map_err(|e| {
            let mut end = body.len().min(500);
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            error!("Failed to parse {SERVICE_NAME} response: {e} - body: {}", &body[..end]);
            GatewayError::Other(AppError::external_service(
                SERVICE_NAME,
                format!("Failed to parse response: {e}"),
            ))
        })
    }
}

#[async_trait]
impl LlmProvider for AiGateway {
    fn name(&self) -> &'static str {
        "ai-gateway"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::full_featured()
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip(self, request), fields(model = %self.model(request)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        let model = self.model(request);
        let body = OpenAiRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: None,
            tools: None,
            tool_choice: None,
        };

        let parsed = Self::parse_json(self.send(&body).await?).await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service(SERVICE_NAME, "API returned no choices"))?;

        debug!(finish_reason = ?choice.finish_reason, "Completion received");
        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            model: parsed.model.unwrap_or_else(|| model.to_owned()),
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip(self, request, tool), fields(model = %self.model(request), tool = %tool.name))]
    async fn complete_with_tool(
        &self,
        request: &ChatRequest,
        tool: &ToolDefinition,
    ) -> Result<Option<ToolCall>, GatewayError> {
        let body = OpenAiRequest {
            model: self.model(request),
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: None,
            tools: Some(vec![OpenAiTool {
                tool_type: "function",
                function: tool,
            }]),
            tool_choice: Some(json!({ "type": "function", "function": { "name": tool.name } })),
        };

        let parsed = Self::parse_json(self.send(&body).await?).await?;
        let call = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.tool_calls)
            .and_then(|calls| calls.into_iter().find(|call| call.function.name == tool.name))
            .map(|call| ToolCall {
                name: call.function.name,
                arguments: call.function.arguments,
            });

        debug!(found = call.is_some(), "Tool call response received");
        Ok(call)
    }

    #[instrument(skip(self, request), fields(model = %self.model(request)))]
    async fn stream_raw(&self, request: &ChatRequest) -> Result<ByteStream, GatewayError> {
        let body = OpenAiRequest {
            model: self.model(request),
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: Some(true),
            tools: None,
            tool_choice: None,
        };

        let response = self.send(&body).await?;
        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                AppError::external_service(SERVICE_NAME, format!("Stream read error: {e}"))
            })
        });
        Ok(Box::pin(stream))
    }
}
