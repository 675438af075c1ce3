// ABOUTME: AI gateway abstraction used by routine generation, chat coach and form analysis
// ABOUTME: Defines message, tool and streaming types plus the LlmProvider contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! # LLM Gateway
//!
//! All AI features talk to one OpenAI-compatible chat-completions gateway.
//! Three call shapes are needed:
//!
//! - **Forced tool call**: routine generation asks for structured arguments
//! - **Plain completion** with image content parts: form analysis
//! - **Raw stream**: the chat coach relays upstream SSE bytes untouched
//!
//! Non-2xx upstream responses surface as [`GatewayError::Upstream`] so each
//! endpoint can pick its own localized message.

mod gateway;
pub mod sse_parser;

pub use gateway::AiGateway;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio_stream::Stream;

use crate::errors::{AppError, UpstreamFailure, UpstreamMessages};

// ============================================================================
// Capability Flags
// ============================================================================

bitflags::bitflags! {
    /// Features a gateway model supports
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// Server-sent event streaming
        const STREAMING = 0b0000_0001;
        /// Function/tool calling
        const FUNCTION_CALLING = 0b0000_0010;
        /// Image content parts
        const VISION = 0b0000_0100;
        /// System messages
        const SYSTEM_MESSAGES = 0b0000_1000;
    }
}

impl LlmCapabilities {
    /// Everything the coaching features rely on
    #[must_use]
    pub const fn full_featured() -> Self {
        Self::STREAMING
            .union(Self::FUNCTION_CALLING)
            .union(Self::VISION)
            .union(Self::SYSTEM_MESSAGES)
    }

    /// Check if streaming is supported
    #[must_use]
    pub const fn supports_streaming(&self) -> bool {
        self.contains(Self::STREAMING)
    }

    /// Check if function calling is supported
    #[must_use]
    pub const fn supports_function_calling(&self) -> bool {
        self.contains(Self::FUNCTION_CALLING)
    }

    /// Check if vision is supported
    #[must_use]
    pub const fn supports_vision(&self) -> bool {
        self.contains(Self::VISION)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

/// Image reference inside a content part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// `https:` or `data:` URL
    pub url: String,
}

/// One part of a multi-part message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text segment
    Text {
        /// Text content
        text: String,
    },
    /// Image segment
    ImageUrl {
        /// Image location
        image_url: ImageUrl,
    },
}

/// Plain text or a list of parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text
    Text(String),
    /// Mixed text and image parts
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Text of the message, joining text parts
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A single message in a chat conversation, already in gateway wire shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a text message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// User message carrying text followed by an inline base64 JPEG
    #[must_use]
    pub fn user_with_jpeg(text: impl Into<String>, jpeg_base64: &str) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/jpeg;base64,{jpeg_base64}"),
                    },
                },
            ]),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Configuration for a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Model identifier, gateway default when absent
    pub model: Option<String>,
    /// Temperature for response randomness
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the model to use
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated message content
    pub content: String,
    /// Model used for generation
    pub model: String,
    /// Finish reason (stop, length, etc.)
    pub finish_reason: Option<String>,
}

/// Function tool offered to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Function name
    pub name: String,
    /// What the function does
    pub description: String,
    /// JSON schema of the arguments
    pub parameters: Value,
}

/// Function call returned by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Function name
    pub name: String,
    /// Raw JSON arguments string
    pub arguments: String,
}

/// Raw upstream bytes, relayed as-is
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, AppError>> + Send>>;

// ============================================================================
// Errors
// ============================================================================

/// Failure of a gateway call
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Gateway answered with a non-success status
    #[error("AI gateway returned HTTP {}", .0.status())]
    Upstream(UpstreamFailure),
    /// Transport, configuration or decoding failure
    #[error(transparent)]
    Other(#[from] AppError),
}

impl GatewayError {
    /// Convert with the calling endpoint's localized upstream messages
    #[must_use]
    pub fn into_app_error(self, messages: &UpstreamMessages) -> AppError {
        match self {
            Self::Upstream(failure) => failure.into_app_error(messages),
            Self::Other(error) => error,
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Chat-completions provider used by every AI feature
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider identifier for logs
    fn name(&self) -> &'static str;

    /// Provider capabilities
    fn capabilities(&self) -> LlmCapabilities;

    /// Model used when the request names none
    fn default_model(&self) -> &str;

    /// Non-streaming completion
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError>;

    /// Completion that must call `tool`; returns the first matching call
    async fn complete_with_tool(
        &self,
        request: &ChatRequest,
        tool: &ToolDefinition,
    ) -> Result<Option<ToolCall>, GatewayError>;

    /// Streaming completion returning the upstream SSE bytes untouched
    async fn stream_raw(&self, request: &ChatRequest) -> Result<ByteStream, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::messages;
    use serde_json::json;

    #[test]
    fn test_vision_message_wire_shape() {
        let message = ChatMessage::user_with_jpeg("Analiza", "AAAA");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "Analiza"},
                    {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AAAA"}}
                ]
            })
        );
    }

    #[test]
    fn test_client_history_deserializes_as_text() {
        let message: ChatMessage =
            serde_json::from_value(json!({"role": "assistant", "content": "Hola"})).unwrap();
        assert_eq!(message, ChatMessage::assistant("Hola"));
        assert_eq!(message.content.as_text(), "Hola");
    }

    #[test]
    fn test_gateway_error_uses_endpoint_messages() {
        let error = GatewayError::Upstream(UpstreamFailure::PaymentRequired)
            .into_app_error(&messages::AI_COACH);
        assert_eq!(error.http_status(), 402);
        assert_eq!(error.message, "Se agotaron los créditos de IA. Recarga tu cuenta.");
    }

    #[test]
    fn test_capabilities() {
        let caps = LlmCapabilities::full_featured();
        assert!(caps.supports_streaming());
        assert!(caps.supports_function_calling());
        assert!(caps.supports_vision());
    }
}
