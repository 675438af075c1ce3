// ABOUTME: Short Spanish coaching insight for the dashboard card
// ABOUTME: Chosen from days since the last session, the streak and the user's goal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use chrono::{DateTime, Utc};

use crate::models::{Goal, Profile, WorkoutSession};

/// Gap in days after which the insight turns into a comeback nudge
pub const COMEBACK_AFTER_DAYS: i64 = 2;
/// Streak that earns praise
pub const STREAK_PRAISE_MIN: u32 = 3;

const fn goal_nudge(goal: Goal) -> &'static str {
    match goal {
        Goal::LoseFat => "Cada sesión cuenta para quemar grasa, hoy es buen día para volver.",
        Goal::BuildMuscle => "El músculo crece con constancia, retoma tu rutina hoy.",
        Goal::Strength => "La fuerza se pierde rápido sin estímulo, vuelve a la barra.",
        Goal::Endurance => "Tu resistencia te espera, una sesión corta basta para retomar.",
        Goal::Maintain => "Mantenerse también exige moverse, haz una sesión ligera hoy.",
    }
}

/// Insight text for the dashboard
#[must_use]
pub fn dashboard_insight(
    profile: Option<&Profile>,
    last_session: Option<&WorkoutSession>,
    now: DateTime<Utc>,
) -> String {
    let goal = profile.map_or(Goal::BuildMuscle, Profile::goal_or_default);
    let streak = profile.map_or(0, |p| p.streak_days);
    let last_completed = last_session.and_then(|s| s.completed_at);

    let Some(completed_at) = last_completed else {
        return "Tu primer entrenamiento marca el inicio. Genera tu rutina y empieza hoy.".to_owned();
    };

    let days = (now - completed_at).num_days().max(0);
    if days >= COMEBACK_AFTER_DAYS {
        return format!("Llevas {days} días sin entrenar. {}", goal_nudge(goal));
    }
    if streak >= STREAK_PRAISE_MIN {
        return format!("{streak} días de racha. Sigue así, la constancia es tu mejor arma.");
    }
    if completed_at.date_naive() == now.date_naive() {
        return "¡Buen trabajo hoy! Descansa y recupera para la próxima sesión.".to_owned();
    }
    "Es un buen momento para tu próxima sesión. Tu rutina te espera.".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 5, 12, 0, 0).unwrap()
    }

    fn profile(goal: Goal, streak_days: u32) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: None,
            avatar_url: None,
            goal: Some(goal),
            experience_level: None,
            height_cm: None,
            weight_kg: None,
            streak_days,
            total_xp: 0,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn session_completed(at: DateTime<Utc>) -> WorkoutSession {
        WorkoutSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            routine_id: None,
            started_at: at - Duration::minutes(45),
            completed_at: Some(at),
            duration_seconds: Some(2700),
            xp_earned: 90,
            notes: None,
        }
    }

    #[test]
    fn test_gap_mentions_days_and_goal() {
        let p = profile(Goal::LoseFat, 5);
        let s = session_completed(now() - Duration::days(3));
        let text = dashboard_insight(Some(&p), Some(&s), now());
        assert!(text.contains("3 días"));
        assert!(text.contains("grasa"));
    }

    #[test]
    fn test_streak_praise() {
        let p = profile(Goal::Strength, 4);
        let s = session_completed(now() - Duration::days(1));
        assert!(dashboard_insight(Some(&p), Some(&s), now()).contains("4 días de racha"));
    }

    #[test]
    fn test_trained_today() {
        let p = profile(Goal::Maintain, 1);
        let s = session_completed(now() - Duration::hours(2));
        assert!(dashboard_insight(Some(&p), Some(&s), now()).starts_with("¡Buen trabajo"));
    }

    #[test]
    fn test_no_sessions_encourages() {
        assert!(dashboard_insight(None, None, now()).contains("primer entrenamiento"));
    }
}
