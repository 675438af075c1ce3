// ABOUTME: User context snapshot embedded into the coach system prompt
// ABOUTME: Sent by the client or assembled from storage, rendered as a Spanish text block
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{ExperienceLevel, Goal, Profile, WorkoutRoutine, WorkoutSession};

/// Heading of the rendered block
pub const CONTEXT_HEADING: &str = "CONTEXTO DEL USUARIO";

/// Profile fields the coach cares about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    /// Display name
    #[serde(default, alias = "full_name")]
    pub full_name: Option<String>,
    /// Training goal
    #[serde(default)]
    pub goal: Option<Goal>,
    /// Experience level
    #[serde(default, alias = "experience_level")]
    pub experience_level: Option<ExperienceLevel>,
    /// Body weight in kilograms
    #[serde(default, alias = "weight_kg")]
    pub weight_kg: Option<f64>,
    /// Current streak
    #[serde(default, alias = "streak_days")]
    pub streak_days: u32,
    /// Accumulated XP
    #[serde(default, alias = "total_xp")]
    pub total_xp: u32,
}

impl From<&Profile> for ProfileSnapshot {
    fn from(profile: &Profile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            goal: profile.goal,
            experience_level: profile.experience_level,
            weight_kg: profile.weight_kg,
            streak_days: profile.streak_days,
            total_xp: profile.total_xp,
        }
    }
}

/// One planned exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSnapshot {
    /// Exercise name
    pub name: String,
    /// Planned sets
    pub sets: u32,
    /// Planned reps
    pub reps: String,
}

/// Active routine summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineSnapshot {
    /// Routine name
    pub name: String,
    /// Exercises in order
    #[serde(default)]
    pub exercises: Vec<ExerciseSnapshot>,
}

impl From<&WorkoutRoutine> for RoutineSnapshot {
    fn from(routine: &WorkoutRoutine) -> Self {
        Self {
            name: routine.name.clone(),
            exercises: routine
                .routine_exercises
                .iter()
                .map(|e| ExerciseSnapshot {
                    name: e.name.clone(),
                    sets: e.sets,
                    reps: e.reps.clone(),
                })
                .collect(),
        }
    }
}

/// Most recent completed session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Completion time
    #[serde(alias = "completed_at")]
    pub completed_at: DateTime<Utc>,
    /// Duration in seconds
    #[serde(default, alias = "duration_seconds")]
    pub duration_seconds: Option<u32>,
    /// XP earned
    #[serde(default, alias = "xp_earned")]
    pub xp_earned: u32,
}

impl SessionSnapshot {
    fn from_session(session: &WorkoutSession) -> Option<Self> {
        Some(Self {
            completed_at: session.completed_at?,
            duration_seconds: session.duration_seconds,
            xp_earned: session.xp_earned,
        })
    }
}

/// Snapshot of the user's state for the coach
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    /// Profile, if onboarded
    #[serde(default)]
    pub profile: Option<ProfileSnapshot>,
    /// Active routine
    #[serde(default, alias = "active_routine")]
    pub active_routine: Option<RoutineSnapshot>,
    /// Last completed session
    #[serde(default, alias = "last_session")]
    pub last_session: Option<SessionSnapshot>,
    /// Sessions completed in the last 7 days
    #[serde(default, alias = "weekly_sessions")]
    pub weekly_sessions: u32,
}

impl UserContext {
    /// Assemble the context from storage
    ///
    /// # Errors
    ///
    /// Returns an error if any lookup fails
    pub async fn load(database: &Database, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Self> {
        let profile = database.profiles().get(user_id).await?;
        let routine = database.routines().active_routine(user_id).await?;
        let sessions = database.sessions();
        let last = sessions.last_completed(user_id).await?;
        let weekly = sessions
            .completed_since(user_id, now - Duration::days(7))
            .await?;

        Ok(Self {
            profile: profile.as_ref().map(ProfileSnapshot::from),
            active_routine: routine.as_ref().map(RoutineSnapshot::from),
            last_session: last.as_ref().and_then(SessionSnapshot::from_session),
            weekly_sessions: u32::try_from(weekly.len()).unwrap_or(u32::MAX),
        })
    }

    /// Render as a prompt block
    #[must_use]
    pub fn render(&self, now: DateTime<Utc>) -> String {
        let mut out = format!("{CONTEXT_HEADING}:\n");

        match &self.profile {
            Some(profile) => {
                if let Some(name) = profile.full_name.as_deref().filter(|n| !n.is_empty()) {
                    let _ = writeln!(out, "- Nombre: {name}");
                }
                if let Some(goal) = profile.goal {
                    let _ = writeln!(out, "- Objetivo: {}", goal.label_es());
                }
                if let Some(level) = profile.experience_level {
                    let _ = writeln!(out, "- Nivel: {}", level.label_es());
                }
                if let Some(weight) = profile.weight_kg {
                    let _ = writeln!(out, "- Peso: {weight} kg");
                }
                let _ = writeln!(out, "- Racha actual: {} días", profile.streak_days);
                let _ = writeln!(out, "- XP total: {}", profile.total_xp);
            }
            None => out.push_str("- Perfil: sin completar\n"),
        }

        match &self.active_routine {
            Some(routine) => {
                let _ = writeln!(out, "- Rutina activa: {}", routine.name);
                for exercise in &routine.exercises {
                    let _ = writeln!(
                        out,
                        "  - {}: {} series x {} reps",
                        exercise.name, exercise.sets, exercise.reps
                    );
                }
            }
            None => out.push_str("- Rutina activa: ninguna\n"),
        }

        match &self.last_session {
            Some(session) => {
                let days = (now - session.completed_at).num_days().max(0);
                let when = match days {
                    0 => "hoy".to_owned(),
                    1 => "ayer".to_owned(),
                    n => format!("hace {n} días"),
                };
                let _ = write!(out, "- Última sesión: {when}");
                if let Some(seconds) = session.duration_seconds {
                    let _ = write!(out, ", {} min", seconds / 60);
                }
                let _ = writeln!(out, ", {} XP", session.xp_earned);
            }
            None => out.push_str("- Última sesión: ninguna todavía\n"),
        }

        let _ = writeln!(out, "- Sesiones esta semana: {}", self.weekly_sessions);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_full_context() {
        let now = Utc::now();
        let context = UserContext {
            profile: Some(ProfileSnapshot {
                full_name: Some("Ana".to_owned()),
                goal: Some(Goal::LoseFat),
                experience_level: Some(ExperienceLevel::Beginner),
                weight_kg: Some(61.0),
                streak_days: 4,
                total_xp: 320,
            }),
            active_routine: Some(RoutineSnapshot {
                name: "Pierna".to_owned(),
                exercises: vec![ExerciseSnapshot {
                    name: "Sentadilla".to_owned(),
                    sets: 4,
                    reps: "8-10".to_owned(),
                }],
            }),
            last_session: Some(SessionSnapshot {
                completed_at: now - Duration::days(3),
                duration_seconds: Some(2400),
                xp_earned: 80,
            }),
            weekly_sessions: 2,
        };

        let text = context.render(now);
        assert!(text.starts_with("CONTEXTO DEL USUARIO:"));
        assert!(text.contains("- Nombre: Ana"));
        assert!(text.contains("Racha actual: 4 días"));
        assert!(text.contains("Sentadilla: 4 series x 8-10 reps"));
        assert!(text.contains("hace 3 días, 40 min, 80 XP"));
        assert!(text.contains("Sesiones esta semana: 2"));
    }

    #[test]
    fn test_render_empty_context() {
        let text = UserContext::default().render(Utc::now());
        assert!(text.contains("Perfil: sin completar"));
        assert!(text.contains("Rutina activa: ninguna"));
    }

    #[test]
    fn test_client_context_accepts_both_casings() {
        let context: UserContext = serde_json::from_value(json!({
            "profile": {"full_name": "Luis", "goal": "strength", "streakDays": 7},
            "weeklySessions": 3
        }))
        .unwrap();
        let profile = context.profile.unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Luis"));
        assert_eq!(profile.goal, Some(Goal::Strength));
        assert_eq!(profile.streak_days, 7);
        assert_eq!(context.weekly_sessions, 3);
    }

    #[tokio::test]
    async fn test_load_from_empty_database() {
        let db = Database::in_memory().await.unwrap();
        let context = UserContext::load(&db, Uuid::new_v4(), Utc::now()).await.unwrap();
        assert_eq!(context, UserContext::default());
    }
}
