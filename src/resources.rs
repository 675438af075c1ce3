// ABOUTME: Shared resource container injected into every route and background task
// ABOUTME: Builds the database-backed services and the AI gateway once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! # Server Resources
//!
//! Every expensive object is created once here and shared through `Arc`.
//! Handlers receive `State<Arc<ServerResources>>` instead of reaching for
//! globals.

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::coach::CoachService;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::llm::{AiGateway, LlmProvider};
use crate::push::PushSender;
use crate::reminders::ReminderJob;
use crate::routines::RoutineGenerator;
use crate::vision::FormAnalyzer;
use crate::voice::VoiceService;

/// Centralized resource container
#[derive(Clone)]
pub struct ServerResources {
    /// Read-only configuration
    pub config: Arc<ServerConfig>,
    /// Storage
    pub database: Database,
    /// Bearer token validation
    pub auth: Arc<AuthManager>,
    /// AI gateway shared by every AI feature
    pub llm: Arc<dyn LlmProvider>,
    /// Routine generation
    pub routines: Arc<RoutineGenerator>,
    /// Streaming chat coach
    pub coach: Arc<CoachService>,
    /// Exercise form analysis
    pub vision: Arc<FormAnalyzer>,
    /// Text-to-speech and speech-to-text
    pub voice: Arc<VoiceService>,
    /// Web Push delivery
    pub push: PushSender,
    /// Reminder job
    pub reminders: Arc<ReminderJob>,
}

impl ServerResources {
    /// Build resources over the configured AI gateway
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the VAPID keys
    /// are invalid
    pub fn new(config: Arc<ServerConfig>, database: Database) -> AppResult<Self> {
        let llm: Arc<dyn LlmProvider> = Arc::new(AiGateway::new(&config.ai)?);
        Self::with_provider(config, database, llm)
    }

    /// Build resources over an explicit provider
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`]
    pub fn with_provider(
        config: Arc<ServerConfig>,
        database: Database,
        llm: Arc<dyn LlmProvider>,
    ) -> AppResult<Self> {
        let auth = Arc::new(AuthManager::new(
            &config.auth,
            config.reminders.service_secret.clone(),
        ));
        let push = PushSender::new(&config.push, database.clone())?;
        let reminders = Arc::new(ReminderJob::new(database.clone(), push.clone()));

        Ok(Self {
            routines: Arc::new(RoutineGenerator::new(Arc::clone(&llm), database.clone())),
            coach: Arc::new(CoachService::new(Arc::clone(&llm), database.clone())),
            vision: Arc::new(FormAnalyzer::new(Arc::clone(&llm))),
            voice: Arc::new(VoiceService::new(&config.voice)?),
            config,
            database,
            auth,
            llm,
            push,
            reminders,
        })
    }
}
