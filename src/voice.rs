// ABOUTME: Speech synthesis and transcription proxies for the voice coach
// ABOUTME: Forwards to ElevenLabs text-to-speech and speech-to-text with the configured voice
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::VoiceConfig;
use crate::constants::messages;
use crate::errors::{AppError, AppResult, UpstreamFailure};

/// Longest text sent to synthesis, in characters
pub const MAX_TTS_CHARS: usize = 2000;

const SERVICE_NAME: &str = "ElevenLabs";
const API_KEY_HEADER: &str = "xi-api-key";
const TTS_OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Voice settings sent with every synthesis request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    /// Voice stability
    pub stability: f32,
    /// Similarity to the reference voice
    pub similarity_boost: f32,
    /// Style exaggeration
    pub style: f32,
    /// Speaker boost toggle
    pub use_speaker_boost: bool,
    /// Speaking rate
    pub speed: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.4,
            use_speaker_boost: true,
            speed: 1.05,
        }
    }
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Deserialize)]
struct SttResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Truncate to at most [`MAX_TTS_CHARS`] characters on a char boundary
#[must_use]
pub fn truncate_for_tts(text: &str) -> &str {
    text.char_indices()
        .nth(MAX_TTS_CHARS)
        .map_or(text, |(index, _)| &text[..index])
}

/// Decode client audio, accepting plain base64 or a `data:` URL
///
/// # Errors
///
/// Returns 400 when the input is empty or not valid base64
pub fn decode_audio(encoded: &str) -> AppResult<Vec<u8>> {
    let trimmed = encoded.trim();
    let payload = if trimmed.starts_with("data:") {
        trimmed.split_once(',').map_or("", |(_, data)| data)
    } else {
        trimmed
    };
    if payload.is_empty() {
        return Err(AppError::invalid_input(messages::AUDIO_REQUIRED));
    }
    let audio = STANDARD
        .decode(payload)
        .map_err(|e| AppError::invalid_input(format!("Invalid base64 audio: {e}")))?;
    if audio.is_empty() {
        return Err(AppError::invalid_input(messages::AUDIO_REQUIRED));
    }
    Ok(audio)
}

/// File extension the provider uses to sniff the container
fn extension_for(mime_type: &str) -> &'static str {
    let base = mime_type.split(';').next().unwrap_or_default().trim();
    match base {
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/ogg" => "ogg",
        "audio/wav" | "audio/x-wav" => "wav",
        _ => "webm",
    }
}

/// Client for the voice provider
#[derive(Clone)]
pub struct VoiceService {
    client: Client,
    config: VoiceConfig,
}

impl VoiceService {
    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(config: &VoiceConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build voice client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn api_key(&self) -> AppResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::config_missing("ELEVENLABS_API_KEY"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn check(response: Response, operation: &str) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), body = %body, "{SERVICE_NAME} {operation} error");
        Err(UpstreamFailure::classify(status.as_u16(), &body).into_app_error(&messages::VOICE))
    }

    /// Synthesize `text` as MP3 audio
    ///
    /// # Errors
    ///
    /// Returns 400 for blank text, 500 when the API key is missing, and the
    /// classified upstream error when synthesis fails
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn synthesize(&self, text: &str) -> AppResult<Bytes> {
        if text.trim().is_empty() {
            return Err(AppError::invalid_input(messages::TEXT_REQUIRED));
        }
        let api_key = self.api_key()?;
        let url = self.url(&format!(
            "text-to-speech/{}?output_format={TTS_OUTPUT_FORMAT}",
            self.config.voice_id
        ));

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&TtsRequest {
                text: truncate_for_tts(text),
                model_id: &self.config.tts_model,
                voice_settings: VoiceSettings::default(),
            })
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, format!("TTS request failed: {e}")))?;

        let audio = Self::check(response, "TTS").await?.bytes().await?;
        info!(bytes = audio.len(), "Speech synthesized");
        Ok(audio)
    }

    /// Transcribe base64 audio; `None` when nothing was understood
    ///
    /// # Errors
    ///
    /// Returns 400 for empty or invalid audio, 500 when the API key is
    /// missing, and the classified upstream error when transcription fails
    #[instrument(skip(self, audio_base64))]
    pub async fn transcribe(&self, audio_base64: &str, mime_type: &str) -> AppResult<Option<String>> {
        let audio = decode_audio(audio_base64)?;
        let api_key = self.api_key()?;
        let mime = if mime_type.trim().is_empty() {
            "audio/webm"
        } else {
            mime_type.trim()
        };

        let file = Part::bytes(audio)
            .file_name(format!("audio.{}", extension_for(mime)))
            .mime_str(mime)
            .map_err(|e| AppError::invalid_input(format!("Invalid mimeType: {e}")))?;
        let form = Form::new()
            .part("file", file)
            .text("model_id", self.config.stt_model.clone());

        let response = self
            .client
            .post(self.url("speech-to-text"))
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, format!("STT request failed: {e}")))?;

        let parsed: SttResponse = Self::check(response, "STT").await?.json().await?;
        let text = parsed
            .text
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());
        info!(transcribed = text.is_some(), "Audio transcribed");
        Ok(text)
    }
}
