// ABOUTME: Localized (Spanish) messages shown to end users
// ABOUTME: Upstream failure texts differ per endpoint and are kept verbatim here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use crate::errors::UpstreamMessages;

/// Upstream failures while generating a routine
pub const GENERATE_WORKOUT: UpstreamMessages = UpstreamMessages {
    rate_limited: "Límite de solicitudes excedido, intenta de nuevo más tarde.",
    payment_required: "Se requiere pago, añade fondos a tu cuenta.",
    other: "Error al generar la rutina",
};

/// Upstream failures while streaming the chat coach
pub const AI_COACH: UpstreamMessages = UpstreamMessages {
    rate_limited: "Demasiadas solicitudes. Espera un momento e inténtalo de nuevo.",
    payment_required: "Se agotaron los créditos de IA. Recarga tu cuenta.",
    other: "Error del servicio de IA",
};

/// Upstream failures while analyzing exercise form
pub const ANALYZE_FORM: UpstreamMessages = UpstreamMessages {
    rate_limited: "Límite de solicitudes excedido",
    payment_required: "Créditos agotados",
    other: "Error del servicio de IA",
};

/// Upstream failures from the voice provider
pub const VOICE: UpstreamMessages = UpstreamMessages {
    rate_limited: "Límite de solicitudes de voz excedido",
    payment_required: "Créditos de voz agotados",
    other: "Error del servicio de voz",
};

/// Tool call missing or malformed
pub const INVALID_AI_RESPONSE: &str = "Invalid AI response format";
/// analyze-form called without an image
pub const NO_IMAGE_PROVIDED: &str = "No image provided";
/// tts-coach called with empty text
pub const TEXT_REQUIRED: &str = "Text is required";
/// stt-coach called without audio
pub const AUDIO_REQUIRED: &str = "Audio is required";
/// Token present but rejected
pub const UNAUTHORIZED: &str = "Unauthorized";
/// send-push target has no usable subscription
pub const NO_SUBSCRIPTION: &str = "No subscription or disabled";
/// Toast shown when a completed set could not be stored
pub const SET_SAVE_FAILED: &str = "No se pudo guardar la serie";
/// Toast shown when the session could not be closed
pub const SESSION_SAVE_FAILED: &str = "No se pudo guardar el entrenamiento";
/// Toast shown when XP or streak could not be applied
pub const PROGRESS_SAVE_FAILED: &str = "No se pudo actualizar tu progreso";
