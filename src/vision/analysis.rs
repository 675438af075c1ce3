// ABOUTME: Form analysis result types and extraction from free-form model text
// ABOUTME: Falls back to a fixed placeholder analysis whenever the JSON cannot be recovered
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Severity of one detected issue, also used for body point status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Needs attention
    #[serde(alias = "Warning")]
    Warning,
    /// Incorrect, risk of injury
    #[serde(alias = "Error")]
    Error,
    /// Correct
    #[serde(alias = "Good")]
    Good,
}

/// Movement depth classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    /// Above parallel
    #[serde(alias = "Shallow")]
    Shallow,
    /// At parallel
    #[serde(alias = "Parallel")]
    Parallel,
    /// Below parallel
    #[serde(alias = "Deep")]
    Deep,
}

/// Spanish depth grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthScore {
    /// Poor
    Malo,
    /// Fair
    Regular,
    /// Good
    Bueno,
    /// Excellent
    Excelente,
}

/// One issue found in the frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormIssue {
    /// Body part, e.g. "rodillas"
    pub body_part: String,
    /// How bad it is
    pub severity: Severity,
    /// What was detected
    pub message: String,
    /// How to fix it
    pub correction: String,
    /// Measured angle in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    /// Target angle in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideal_angle: Option<f64>,
}

/// Status of a tracked body point for the camera overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyPoint {
    /// Point name, e.g. "rodilla_izquierda"
    pub name: String,
    /// Point status
    pub status: Severity,
}

/// Full analysis of one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAnalysis {
    /// Score 0..=100
    pub overall_score: u8,
    /// Issues found
    #[serde(default)]
    pub issues: Vec<FormIssue>,
    /// Body point overlay
    #[serde(default)]
    pub body_points: Vec<BodyPoint>,
    /// Estimated seconds per rep
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Depth classification
    #[serde(default = "default_depth")]
    pub depth: Depth,
    /// Depth grade
    #[serde(default = "default_depth_score")]
    pub depth_score: DepthScore,
}

const fn default_tempo() -> f64 {
    2.0
}

const fn default_depth() -> Depth {
    Depth::Parallel
}

const fn default_depth_score() -> DepthScore {
    DepthScore::Regular
}

impl FormAnalysis {
    /// Placeholder returned when the model output cannot be parsed
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            overall_score: 75,
            issues: vec![FormIssue {
                body_part: "general".to_owned(),
                severity: Severity::Warning,
                message: "No se pudo analizar la imagen correctamente".to_owned(),
                correction: "Intenta con mejor iluminación y ángulo".to_owned(),
                angle: None,
                ideal_angle: None,
            }],
            body_points: Vec::new(),
            tempo: default_tempo(),
            depth: default_depth(),
            depth_score: default_depth_score(),
        }
    }
}

/// Result of interpreting the model text
#[derive(Debug, Clone, PartialEq)]
pub enum FormAnalysisOutcome {
    /// JSON was found and decoded
    Parsed(FormAnalysis),
    /// The placeholder analysis
    Fallback(FormAnalysis),
}

impl FormAnalysisOutcome {
    /// The analysis, whichever branch produced it
    #[must_use]
    pub fn into_analysis(self) -> FormAnalysis {
        match self {
            Self::Parsed(analysis) | Self::Fallback(analysis) => analysis,
        }
    }

    /// True when the placeholder was used
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Same as [`FormAnalysis`] but with a float score so out-of-range values can be clamped
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    overall_score: f64,
    #[serde(default)]
    issues: Vec<FormIssue>,
    #[serde(default)]
    body_points: Vec<BodyPoint>,
    #[serde(default = "default_tempo")]
    tempo: f64,
    #[serde(default = "default_depth")]
    depth: Depth,
    #[serde(default = "default_depth_score")]
    depth_score: DepthScore,
}

fn json_block_regex() -> Option<&'static Regex> {
    static JSON_BLOCK: OnceLock<Option<Regex>> = OnceLock::new();
    JSON_BLOCK
        .get_or_init(|| Regex::new(r"(?s)\{.*\}").ok())
        .as_ref()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

/// Extract the first `{` through the last `}` and decode it
#[must_use]
pub fn parse_form_analysis(raw: &str) -> FormAnalysisOutcome {
    let Some(block) = json_block_regex().and_then(|re| re.find(raw)) else {
        warn!("No JSON object found in form analysis response");
        return FormAnalysisOutcome::Fallback(FormAnalysis::fallback());
    };

    match serde_json::from_str::<RawAnalysis>(block.as_str()) {
        Ok(parsed) => FormAnalysisOutcome::Parsed(FormAnalysis {
            overall_score: clamp_score(parsed.overall_score),
            issues: parsed.issues,
            body_points: parsed.body_points,
            tempo: parsed.tempo,
            depth: parsed.depth,
            depth_score: parsed.depth_score,
        }),
        Err(e) => {
            warn!("Error parsing form analysis JSON: {e}");
            FormAnalysisOutcome::Fallback(FormAnalysis::fallback())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_json_yields_fallback() {
        let outcome = parse_form_analysis("Lo siento, no puedo ver bien la imagen.");
        assert!(outcome.is_fallback());
        let analysis = outcome.into_analysis();
        assert_eq!(analysis.overall_score, 75);
        assert_eq!(analysis.issues.len(), 1);
        assert_eq!(analysis.issues[0].severity, Severity::Warning);
        assert_eq!(analysis.depth, Depth::Parallel);
        assert_eq!(analysis.depth_score, DepthScore::Regular);
    }

    #[test]
    fn test_json_wrapped_in_markdown_is_extracted() {
        let raw = r#"Aquí tienes:
```json
{
  "overallScore": 82,
  "issues": [
    {"bodyPart": "rodillas", "severity": "error", "message": "Valgo", "correction": "Empuja hacia fuera", "angle": 160, "idealAngle": 175}
  ],
  "bodyPoints": [{"name": "rodilla_izquierda", "status": "error"}],
  "tempo": 2.5,
  "depth": "deep",
  "depthScore": "Bueno"
}
```"#;
        let outcome = parse_form_analysis(raw);
        assert!(!outcome.is_fallback());
        let analysis = outcome.into_analysis();
        assert_eq!(analysis.overall_score, 82);
        assert_eq!(analysis.issues[0].ideal_angle, Some(175.0));
        assert_eq!(analysis.body_points[0].status, Severity::Error);
        assert_eq!(analysis.depth, Depth::Deep);
    }

    #[test]
    fn test_score_is_clamped() {
        let analysis = parse_form_analysis(r#"{"overallScore": 140.4}"#).into_analysis();
        assert_eq!(analysis.overall_score, 100);
        let analysis = parse_form_analysis(r#"{"overallScore": -3}"#).into_analysis();
        assert_eq!(analysis.overall_score, 0);
    }

    #[test]
    fn test_invalid_enum_yields_fallback() {
        assert!(parse_form_analysis(r#"{"overallScore": 50, "depth": "profundo"}"#).is_fallback());
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(FormAnalysis::fallback()).unwrap();
        assert_eq!(value["overallScore"], 75);
        assert_eq!(value["depthScore"], "Regular");
        assert_eq!(value["issues"][0]["bodyPart"], "general");
    }
}
