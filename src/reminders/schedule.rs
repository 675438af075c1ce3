// ABOUTME: Decides whether a user is due for a reminder at a given instant
// ABOUTME: Matches training days, the preferred hour window and one reminder per calendar day
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use crate::models::NotificationSettings;

/// Labels that select `weekday`: its Spanish name and the frequency buckets covering it
#[must_use]
pub const fn day_labels(weekday: Weekday) -> &'static [&'static str] {
    match weekday {
        Weekday::Mon => &["2-3 días", "4-5 días", "6+ días", "lunes"],
        Weekday::Tue => &["2-3 días", "4-5 días", "6+ días", "martes"],
        Weekday::Wed => &["2-3 días", "4-5 días", "6+ días", "miércoles"],
        Weekday::Thu => &["4-5 días", "6+ días", "jueves"],
        Weekday::Fri => &["4-5 días", "6+ días", "viernes"],
        Weekday::Sat => &["6+ días", "sábado"],
        Weekday::Sun => &["6+ días", "domingo"],
    }
}

/// True when any configured day selects `weekday`
#[must_use]
pub fn is_training_day(training_days: &[String], weekday: Weekday) -> bool {
    let labels = day_labels(weekday);
    training_days
        .iter()
        .any(|day| labels.contains(&day.trim().to_lowercase().as_str()))
}

/// Hour part of "HH:MM"
#[must_use]
pub fn preferred_hour(training_time: &str) -> Option<u32> {
    training_time
        .split(':')
        .next()
        .and_then(|hour| hour.trim().parse::<u32>().ok())
        .filter(|hour| *hour < 24)
}

/// Within one hour of the preferred hour, wrapping around midnight
#[must_use]
pub fn within_hour_window(preferred: u32, current: u32) -> bool {
    let diff = preferred.abs_diff(current);
    !(diff > 1 && diff < 23)
}

/// True when the last reminder fell on the same UTC date as `now`
#[must_use]
pub fn notified_today(last_notified_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_notified_at.is_some_and(|last| last.date_naive() == now.date_naive())
}

/// Whether `settings` are due for a reminder at `now`
#[must_use]
pub fn is_due(settings: &NotificationSettings, now: DateTime<Utc>) -> bool {
    if !is_training_day(&settings.training_days, now.weekday()) {
        return false;
    }
    if notified_today(settings.last_notified_at, now) {
        return false;
    }
    preferred_hour(&settings.preferred_training_time)
        .is_none_or(|hour| within_hour_window(hour, now.hour()))
}
