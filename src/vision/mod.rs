// ABOUTME: Exercise form analysis through a vision-capable model on the AI gateway
// ABOUTME: Sends one JPEG frame with a strict-JSON prompt and never fails on malformed output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! # Form Analysis
//!
//! The model is asked for a strict JSON document. Whatever text comes back is
//! run through [`parse_form_analysis`], which yields either the decoded
//! analysis or a fixed placeholder. Upstream failures are still errors.

mod analysis;
pub mod auto;

pub use analysis::{
    parse_form_analysis, BodyPoint, Depth, DepthScore, FormAnalysis, FormAnalysisOutcome,
    FormIssue, Severity,
};
pub use auto::{AutoAnalyzer, AutoAnalyzerHandle, AUTO_ANALYSIS_INTERVAL};

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::constants::messages;
use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

const DEFAULT_EXERCISE: &str = "ejercicio";

/// System prompt for one frame of `exercise_name`
#[must_use]
pub fn build_form_prompt(exercise_name: &str, detailed: bool) -> String {
    let detail = if detailed {
        "\nModo detallado: cada corrección debe explicar la causa del problema y dar dos o tres pasos concretos para corregirlo."
    } else {
        ""
    };
    format!(
        r#"Eres un entrenador personal experto en análisis de forma y técnica de ejercicios.
Analiza la imagen del usuario realizando el ejercicio "{exercise_name}" y proporciona retroalimentación detallada.

DEBES responder SOLO con un JSON válido, sin texto adicional. El formato es:
{{
  "overallScore": <número 0-100>,
  "issues": [
    {{
      "bodyPart": "<parte del cuerpo>",
      "severity": "<warning|error|good>",
      "message": "<problema detectado>",
      "correction": "<cómo corregirlo>",
      "angle": <ángulo actual opcional>,
      "idealAngle": <ángulo ideal opcional>
    }}
  ],
  "bodyPoints": [
    {{ "name": "<punto corporal>", "status": "<good|warning|error>" }}
  ],
  "tempo": <segundos estimados de la rep>,
  "depth": "<shallow|parallel|deep>",
  "depthScore": "<Malo|Regular|Bueno|Excelente>"
}}

Analiza:
1. Posición de la espalda (neutral, arqueada, redondeada)
2. Posición de las rodillas (alineadas con pies, hacia dentro, hacia fuera)
3. Posición de los pies (ancho correcto, rotación)
4. Profundidad del movimiento
5. Posición de la cabeza y cuello
6. Si aplica: agarre, posición de codos, activación del core

Sé específico y útil. Si la imagen no muestra claramente un ejercicio, indica que necesitas mejor ángulo.{detail}"#
    )
}

/// Analyzes exercise frames
pub struct FormAnalyzer {
    llm: Arc<dyn LlmProvider>,
}

impl FormAnalyzer {
    /// Create an analyzer over a provider
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Analyze one base64 JPEG frame
    ///
    /// # Errors
    ///
    /// Returns 400 when no image is given, localized 429/402 errors for
    /// upstream limits and 502 for other upstream failures or an empty reply.
    /// Unparseable model output is not an error.
    #[instrument(skip(self, image_base64), fields(exercise = exercise_name.unwrap_or(DEFAULT_EXERCISE), detailed))]
    pub async fn analyze(
        &self,
        image_base64: &str,
        exercise_name: Option<&str>,
        detailed: bool,
    ) -> AppResult<FormAnalysisOutcome> {
        let image = image_base64.trim();
        if image.is_empty() {
            return Err(AppError::invalid_input(messages::NO_IMAGE_PROVIDED));
        }
        let exercise = exercise_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_EXERCISE);

        let request = ChatRequest::new(vec![
            ChatMessage::system(build_form_prompt(exercise, detailed)),
            ChatMessage::user_with_jpeg(
                format!("Analiza la forma de este ejercicio: {exercise}. Responde SOLO con JSON válido."),
                image,
            ),
        ]);

        let response = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| e.into_app_error(&messages::ANALYZE_FORM))?;
        if response.content.trim().is_empty() {
            return Err(AppError::external_service("AI gateway", "No response from AI"));
        }
        debug!(
            preview = %response.content.chars().take(200).collect::<String>(),
            "Form analysis response"
        );

        let outcome = parse_form_analysis(&response.content);
        info!(fallback = outcome.is_fallback(), "Form analysis completed");
        Ok(outcome)
    }
}
