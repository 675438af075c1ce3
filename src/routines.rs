// ABOUTME: AI routine generation through a forced function call on the gateway
// ABOUTME: Builds Spanish prompts from the profile, validates tool arguments and stores the routine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! # Routine Generation
//!
//! The model is forced to call `create_workout_routine`. Its arguments are
//! validated before anything is written; then the previous active routine is
//! deactivated and the new one inserted. Those two writes are sequential, not
//! transactional, so two concurrent generations can both end up active.

use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::constants::messages;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider, ToolDefinition};
use crate::models::{
    Difficulty, ExperienceLevel, GeneratedExercise, GeneratedRoutine, Goal, Profile, WorkoutRoutine,
};

/// Name of the forced tool
pub const TOOL_NAME: &str = "create_workout_routine";

/// Accepted exercise count in a generated routine
const EXERCISE_COUNT_RANGE: RangeInclusive<usize> = 1..=10;

/// Tool schema sent with every generation request
#[must_use]
pub fn routine_tool() -> ToolDefinition {
    ToolDefinition {
        name: TOOL_NAME.to_owned(),
        description: "Crea una rutina de entrenamiento personalizada".to_owned(),
        parameters: json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Nombre de la rutina" },
                "description": { "type": "string", "description": "Descripción breve de la rutina" },
                "target_muscle_groups": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Grupos musculares objetivo"
                },
                "estimated_duration_minutes": { "type": "number", "description": "Duración estimada en minutos" },
                "difficulty_level": {
                    "type": "string",
                    "enum": ["beginner", "intermediate", "advanced"],
                    "description": "Nivel de dificultad"
                },
                "exercises": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "sets": { "type": "number" },
                            "reps": { "type": "string" },
                            "weight_suggestion": { "type": "string" },
                            "rest_seconds": { "type": "number" },
                            "notes": { "type": "string" }
                        },
                        "required": ["name", "sets", "reps", "rest_seconds"]
                    }
                }
            },
            "required": [
                "name", "description", "target_muscle_groups",
                "estimated_duration_minutes", "difficulty_level", "exercises"
            ]
        }),
    }
}

/// System and user prompts for a profile, or defaults when there is none
#[must_use]
pub fn build_prompts(profile: Option<&Profile>) -> (String, String) {
    let goal = profile.map_or(Goal::BuildMuscle, Profile::goal_or_default);
    let level = profile.map_or(ExperienceLevel::Intermediate, Profile::level_or_default);
    let (goal, level) = (goal.label_es(), level.label_es());

    let system = format!(
        "Eres un entrenador personal experto. Genera rutinas de entrenamiento personalizadas en español.\n\
         El usuario tiene el objetivo de \"{goal}\" y su nivel de experiencia es \"{level}\".\n\
         Debes generar una rutina de entrenamiento adaptada a su perfil."
    );

    let mut user = format!(
        "Genera una rutina de entrenamiento para hoy. La rutina debe incluir:\n\
         - Un nombre descriptivo para la rutina\n\
         - Una breve descripción\n\
         - Los grupos musculares objetivo\n\
         - Un estimado de duración en minutos\n\
         - Una lista de 4-6 ejercicios con: nombre, sets, reps, peso sugerido (si aplica), \
         tiempo de descanso en segundos, y notas opcionales.\n\n\
         El nivel del usuario es {level} y su objetivo es {goal}."
    );
    if let Some(weight) = profile.and_then(|p| p.weight_kg) {
        user.push_str(&format!(" Su peso corporal es {weight} kg; ajusta los pesos sugeridos."));
    }
    (system, user)
}

// ============================================================================
// Tool argument validation
// ============================================================================

/// Lenient mirror of the tool arguments; models send numbers as floats or strings
#[derive(Debug, Deserialize)]
struct RawRoutine {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    target_muscle_groups: Vec<String>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    estimated_duration_minutes: Option<u32>,
    #[serde(default)]
    difficulty_level: Option<String>,
    exercises: Vec<RawExercise>,
}

#[derive(Debug, Deserialize)]
struct RawExercise {
    name: String,
    #[serde(deserialize_with = "lenient_u32")]
    sets: u32,
    #[serde(deserialize_with = "lenient_string")]
    reps: String,
    #[serde(default)]
    weight_suggestion: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    rest_seconds: u32,
    #[serde(default)]
    notes: Option<String>,
}

fn value_to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| n.as_f64().and_then(float_to_u32)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_u32(value: f64) -> Option<u32> {
    let rounded = value.round();
    (0.0..=f64::from(u32::MAX))
        .contains(&rounded)
        .then_some(rounded as u32)
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_to_u32(&value)
        .ok_or_else(|| DeError::custom(format!("expected a non-negative integer, got {value}")))
}

fn lenient_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_u32(&value))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(DeError::custom(format!("expected a string, got {other}"))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Validate the raw tool arguments into a [`GeneratedRoutine`]
///
/// # Errors
///
/// Returns 500 "Invalid AI response format" when the JSON does not match the
/// tool schema, the name is blank, or the exercise count is out of range
pub fn parse_tool_arguments(arguments: &str) -> AppResult<GeneratedRoutine> {
    let raw: RawRoutine = serde_json::from_str(arguments).map_err(|e| {
        warn!("Routine tool arguments rejected: {e}");
        AppError::internal(messages::INVALID_AI_RESPONSE)
    })?;

    if raw.name.trim().is_empty()
        || !EXERCISE_COUNT_RANGE.contains(&raw.exercises.len())
        || raw.exercises.iter().any(|e| e.name.trim().is_empty() || e.sets == 0)
    {
        warn!(
            exercises = raw.exercises.len(),
            "Routine tool arguments failed validation"
        );
        return Err(AppError::internal(messages::INVALID_AI_RESPONSE));
    }

    let difficulty_level = raw.difficulty_level.as_deref().and_then(|d| {
        serde_json::from_value::<Difficulty>(Value::String(d.to_lowercase())).ok()
    });

    Ok(GeneratedRoutine {
        name: raw.name,
        description: non_empty(raw.description),
        target_muscle_groups: raw.target_muscle_groups,
        estimated_duration_minutes: raw.estimated_duration_minutes,
        difficulty_level,
        exercises: raw
            .exercises
            .into_iter()
            .map(|e| GeneratedExercise {
                name: e.name,
                sets: e.sets,
                reps: e.reps,
                weight_suggestion: non_empty(e.weight_suggestion),
                rest_seconds: e.rest_seconds,
                notes: non_empty(e.notes),
            })
            .collect(),
    })
}

// ============================================================================
// Generator
// ============================================================================

/// Generates and stores a routine for a user
pub struct RoutineGenerator {
    llm: Arc<dyn LlmProvider>,
    database: Database,
}

impl RoutineGenerator {
    /// Create a generator over a provider and database
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, database: Database) -> Self {
        Self { llm, database }
    }

    /// Generate a routine and make it the user's only active one
    ///
    /// # Errors
    ///
    /// Returns localized 429/402 errors for upstream limits, 502 for other
    /// upstream failures, 500 "Invalid AI response format" for a missing or
    /// malformed tool call, and database errors from the writes
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn generate(&self, user_id: Uuid) -> AppResult<WorkoutRoutine> {
        let profile = self.database.profiles().get(user_id).await?;
        let (system, user) = build_prompts(profile.as_ref());
        info!(
            goal = profile.as_ref().map_or("default", |p| p.goal_or_default().as_str()),
            "Generating workout routine"
        );

        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)]);
        let call = self
            .llm
            .complete_with_tool(&request, &routine_tool())
            .await
            .map_err(|e| e.into_app_error(&messages::GENERATE_WORKOUT))?
            .ok_or_else(|| AppError::internal(messages::INVALID_AI_RESPONSE))?;

        let generated = parse_tool_arguments(&call.arguments)?;

        let routines = self.database.routines();
        let deactivated = routines.deactivate_all(user_id).await?;
        let routine = routines.insert_generated(user_id, &generated).await?;
        info!(
            routine_id = %routine.id,
            deactivated,
            exercises = routine.routine_exercises.len(),
            "Routine saved"
        );
        Ok(routine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OnboardingInput;

    const VALID_ARGS: &str = r#"{
        "name": "Fuerza total",
        "description": "Rutina de cuerpo completo",
        "target_muscle_groups": ["piernas", "pecho"],
        "estimated_duration_minutes": 45.0,
        "difficulty_level": "intermediate",
        "exercises": [
            {"name": "Sentadilla", "sets": 4, "reps": "8-10", "weight_suggestion": "60 kg", "rest_seconds": 90},
            {"name": "Press banca", "sets": 3.0, "reps": 10, "rest_seconds": "60", "notes": ""}
        ]
    }"#;

    #[test]
    fn test_parse_lenient_numbers() {
        let routine = parse_tool_arguments(VALID_ARGS).unwrap();
        assert_eq!(routine.estimated_duration_minutes, Some(45));
        assert_eq!(routine.difficulty_level, Some(Difficulty::Intermediate));
        assert_eq!(routine.exercises[1].sets, 3);
        assert_eq!(routine.exercises[1].reps, "10");
        assert_eq!(routine.exercises[1].rest_seconds, 60);
        assert_eq!(routine.exercises[1].notes, None);
    }

    #[test]
    fn test_empty_exercise_list_is_invalid() {
        let error = parse_tool_arguments(r#"{"name": "x", "exercises": []}"#).unwrap_err();
        assert_eq!(error.http_status(), 500);
        assert_eq!(error.message, "Invalid AI response format");
    }

    #[test]
    fn test_non_json_is_invalid() {
        assert!(parse_tool_arguments("not json").is_err());
    }

    #[tokio::test]
    async fn test_prompts_use_profile_labels_and_weight() {
        let db = Database::in_memory().await.unwrap();
        let user_id = Uuid::new_v4();
        let profile = db
            .profiles()
            .upsert_onboarding(
                user_id,
                &OnboardingInput {
                    goal: Some(Goal::LoseFat),
                    experience_level: Some(ExperienceLevel::Beginner),
                    weight_kg: Some(72.5),
                    ..OnboardingInput::default()
                },
            )
            .await
            .unwrap();

        let (system, user) = build_prompts(Some(&profile));
        assert!(system.contains(Goal::LoseFat.label_es()));
        assert!(user.contains(ExperienceLevel::Beginner.label_es()));
        assert!(user.contains("72.5 kg"));
    }

    #[test]
    fn test_prompts_without_profile_use_defaults() {
        let (system, _) = build_prompts(None);
        assert!(system.contains(Goal::BuildMuscle.label_es()));
        assert!(system.contains(ExperienceLevel::Intermediate.label_es()));
    }
}
