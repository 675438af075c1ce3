// ABOUTME: Coach reminder message templates and category selection
// ABOUTME: Picks a category from session recency and streak, then a random template
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Days without a session that count as inactive
pub const INACTIVE_AFTER_DAYS: i64 = 3;
/// Streak length that earns the streak message
pub const STREAK_MESSAGE_MIN: u32 = 3;

/// Message category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    /// No session yet
    Morning,
    /// Trained recently, short streak
    Reminder,
    /// Streak worth protecting
    Streak,
    /// Several days without training
    Inactive,
}

impl MessageCategory {
    /// Templates of this category
    #[must_use]
    pub const fn templates(self) -> &'static [&'static str] {
        match self {
            Self::Morning => &[
                "Buenos días. ¿A qué hora entrenas hoy?",
                "Arriba. Tu rutina te espera.",
                "Día nuevo, oportunidad nueva. ¿Vamos?",
            ],
            Self::Reminder => &[
                "¿Ya entrenaste hoy? No me hagas ir a buscarte.",
                "El gym no viene a ti. Tú vas al gym.",
                "Cada día que no entrenas, alguien más te supera.",
            ],
            Self::Streak => &[
                "Llevas {streak} días de racha. No lo tires ahora.",
                "{streak} días seguidos. Eso es disciplina.",
                "Tu racha de {streak} días es brutal. Mantén.",
            ],
            Self::Inactive => &[
                "{days} días sin entrenar. ¿Qué pasó?",
                "Te has perdido. Vuelve al gym.",
                "Las excusas no queman calorías. Vamos.",
            ],
        }
    }

    /// Category for a user's recency and streak
    ///
    /// `days_since_last_session` is `None` when the user never completed one.
    #[must_use]
    pub const fn select(days_since_last_session: Option<i64>, streak_days: u32) -> Self {
        match days_since_last_session {
            None => Self::Morning,
            Some(days) if days >= INACTIVE_AFTER_DAYS => Self::Inactive,
            Some(_) if streak_days >= STREAK_MESSAGE_MIN => Self::Streak,
            Some(_) => Self::Reminder,
        }
    }
}

/// Fill `{streak}` and `{days}` placeholders
#[must_use]
pub fn fill_template(template: &str, streak_days: u32, days_since_last_session: Option<i64>) -> String {
    let days = days_since_last_session.unwrap_or_default();
    template
        .replace("{streak}", &streak_days.to_string())
        .replace("{days}", &days.to_string())
}

/// Pick and fill a message for the user's situation
pub fn compose_message<R: Rng + ?Sized>(
    rng: &mut R,
    days_since_last_session: Option<i64>,
    streak_days: u32,
) -> (MessageCategory, String) {
    let category = MessageCategory::select(days_since_last_session, streak_days);
    let template = category
        .templates()
        .choose(rng)
        .copied()
        .unwrap_or_default();
    (
        category,
        fill_template(template, streak_days, days_since_last_session),
    )
}
