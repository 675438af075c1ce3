// ABOUTME: User profile model with training goal and experience level
// ABOUTME: Profiles carry the streak and XP counters updated on workout completion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Training goal chosen during onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Lose body fat
    LoseFat,
    /// Gain muscle mass
    BuildMuscle,
    /// Get stronger
    Strength,
    /// Improve endurance
    Endurance,
    /// Keep current shape
    Maintain,
}

impl Goal {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoseFat => "lose_fat",
            Self::BuildMuscle => "build_muscle",
            Self::Strength => "strength",
            Self::Endurance => "endurance",
            Self::Maintain => "maintain",
        }
    }

    /// Spanish phrase used inside prompts and insight texts
    #[must_use]
    pub const fn label_es(self) -> &'static str {
        match self {
            Self::LoseFat => "perder grasa",
            Self::BuildMuscle => "ganar músculo",
            Self::Strength => "ganar fuerza",
            Self::Endurance => "mejorar resistencia",
            Self::Maintain => "mantenerse en forma",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Goal {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lose_fat" => Ok(Self::LoseFat),
            "build_muscle" => Ok(Self::BuildMuscle),
            "strength" => Ok(Self::Strength),
            "endurance" => Ok(Self::Endurance),
            "maintain" => Ok(Self::Maintain),
            other => Err(AppError::invalid_input(format!("Unknown goal: {other}"))),
        }
    }
}

/// Self-reported training experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    /// Less than six months of training
    Beginner,
    /// Regular training for a while
    Intermediate,
    /// Several years of structured training
    Advanced,
    /// Competitive athlete
    Elite,
}

impl ExperienceLevel {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Elite => "elite",
        }
    }

    /// Spanish label used inside prompts
    #[must_use]
    pub const fn label_es(self) -> &'static str {
        match self {
            Self::Beginner => "principiante",
            Self::Intermediate => "intermedio",
            Self::Advanced => "avanzado",
            Self::Elite => "élite",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "elite" => Ok(Self::Elite),
            other => Err(AppError::invalid_input(format!(
                "Unknown experience level: {other}"
            ))),
        }
    }
}

/// One profile per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Row ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Display name
    pub full_name: Option<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Training goal
    pub goal: Option<Goal>,
    /// Experience level
    pub experience_level: Option<ExperienceLevel>,
    /// Height in centimeters
    pub height_cm: Option<f64>,
    /// Body weight in kilograms
    pub weight_kg: Option<f64>,
    /// Consecutive completed routine workouts
    pub streak_days: u32,
    /// Accumulated experience points
    pub total_xp: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Goal with the generation default applied
    #[must_use]
    pub fn goal_or_default(&self) -> Goal {
        self.goal.unwrap_or(Goal::BuildMuscle)
    }

    /// Experience level with the generation default applied
    #[must_use]
    pub fn level_or_default(&self) -> ExperienceLevel {
        self.experience_level.unwrap_or(ExperienceLevel::Intermediate)
    }
}

/// Fields collected by the onboarding flow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingInput {
    /// Display name
    pub full_name: Option<String>,
    /// Training goal
    pub goal: Option<Goal>,
    /// Experience level
    pub experience_level: Option<ExperienceLevel>,
    /// Height in centimeters
    pub height_cm: Option<f64>,
    /// Body weight in kilograms
    pub weight_kg: Option<f64>,
}
