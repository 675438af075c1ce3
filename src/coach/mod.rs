// ABOUTME: Streaming chat coach built on the AI gateway
// ABOUTME: Prepends the persona and user context, then relays upstream SSE bytes untouched
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! # Chat Coach
//!
//! The server side builds `[system, ...history]` and returns the gateway's
//! byte stream as-is. The client side ([`stream`]) turns those bytes back
//! into one growing assistant message.

mod context;
mod prompt;
pub mod stream;

pub use context::{
    ExerciseSnapshot, ProfileSnapshot, RoutineSnapshot, SessionSnapshot, UserContext,
    CONTEXT_HEADING,
};
pub use prompt::{build_system_prompt, SYSTEM_PROMPT};
pub use stream::{collect_reply, collect_reply_with, ChatStreamAccumulator};

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::constants::messages;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::llm::{ByteStream, ChatMessage, ChatRequest, LlmProvider, MessageRole};

/// Upper bound on client-supplied history
const MAX_HISTORY_MESSAGES: usize = 50;

/// Chat coach service
pub struct CoachService {
    llm: Arc<dyn LlmProvider>,
    database: Database,
}

impl CoachService {
    /// Create a coach over a provider and database
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, database: Database) -> Self {
        Self { llm, database }
    }

    /// Start a streamed reply for the conversation
    ///
    /// When `context` is `None` it is assembled from storage. Client-sent
    /// system messages are dropped; the persona always comes first.
    ///
    /// # Errors
    ///
    /// Returns 400 for an empty conversation, localized upstream errors from
    /// the gateway, and database errors while loading context
    #[instrument(skip(self, history, context), fields(user_id = %user_id, messages = history.len()))]
    pub async fn stream_reply(
        &self,
        user_id: Uuid,
        history: Vec<ChatMessage>,
        context: Option<UserContext>,
    ) -> AppResult<ByteStream> {
        let mut history: Vec<ChatMessage> = history
            .into_iter()
            .filter(|m| m.role != MessageRole::System)
            .collect();
        if history.is_empty() {
            return Err(AppError::invalid_input("messages must not be empty"));
        }
        if history.len() > MAX_HISTORY_MESSAGES {
            history.drain(..history.len() - MAX_HISTORY_MESSAGES);
        }

        let now = Utc::now();
        let context = match context {
            Some(context) => context,
            None => UserContext::load(&self.database, user_id, now).await?,
        };

        let mut conversation = Vec::with_capacity(history.len() + 1);
        conversation.push(ChatMessage::system(build_system_prompt(Some(&context), now)));
        conversation.extend(history);

        let stream = self
            .llm
            .stream_raw(&ChatRequest::new(conversation))
            .await
            .map_err(|e| e.into_app_error(&messages::AI_COACH))?;
        info!("Coach stream started");
        Ok(stream)
    }
}
