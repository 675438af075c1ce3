// ABOUTME: Working weight helpers for the training screen
// ABOUTME: Parses the first integer of a suggestion such as "50-60kg" and clamps adjustments at zero
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::sync::OnceLock;

use regex::Regex;

fn first_integer_regex() -> Option<&'static Regex> {
    static FIRST_INTEGER: OnceLock<Option<Regex>> = OnceLock::new();
    FIRST_INTEGER.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()
}

fn first_integer(text: &str) -> Option<u32> {
    first_integer_regex()
        .and_then(|re| re.find(text))
        .and_then(|m| m.as_str().parse().ok())
}

/// Starting weight from a suggestion, 0 when none is found
#[must_use]
pub fn initial_weight(suggestion: Option<&str>) -> u32 {
    suggestion.and_then(first_integer).unwrap_or(0)
}

/// Apply a signed step, never going below zero
#[must_use]
pub const fn adjust_weight(current: u32, delta: i32) -> u32 {
    current.saturating_add_signed(delta)
}

/// Stored representation of a working weight
#[must_use]
pub fn format_weight(weight: u32) -> String {
    format!("{weight} kg")
}

/// Leading repetition count of a reps string such as "8-12"
#[must_use]
pub fn planned_reps(reps: &str) -> Option<u32> {
    first_integer(reps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_weight_takes_first_number() {
        assert_eq!(initial_weight(Some("50-60kg")), 50);
        assert_eq!(initial_weight(Some("12-16kg (cada mancuerna)")), 12);
        assert_eq!(initial_weight(Some("Peso corporal")), 0);
        assert_eq!(initial_weight(None), 0);
    }

    #[test]
    fn test_adjust_clamps_at_zero() {
        assert_eq!(adjust_weight(20, 5), 25);
        assert_eq!(adjust_weight(2, -5), 0);
        assert_eq!(adjust_weight(u32::MAX, 5), u32::MAX);
    }

    #[test]
    fn test_format_and_reps() {
        assert_eq!(format_weight(40), "40 kg");
        assert_eq!(planned_reps("8-12"), Some(8));
        assert_eq!(planned_reps("al fallo"), None);
    }
}
