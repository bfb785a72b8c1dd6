// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Human-readable age of a task, e.g. "3 minutes ago".
///
/// Tasks the backend has not stamped yet read as "just now".
pub fn relative_age(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created_at) = created_at else {
        return "just now".to_string();
    };

    let secs = (now - created_at).num_seconds().max(0);
    let minutes = secs / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    match (secs, minutes, hours, days) {
        (0..=44, _, _, _) => "a few seconds ago".to_string(),
        (_, 0..=1, _, _) => "a minute ago".to_string(),
        (_, 2..=44, _, _) => format!("{} minutes ago", minutes),
        (_, _, 0..=1, _) => "an hour ago".to_string(),
        (_, _, 2..=21, _) => format!("{} hours ago", hours),
        (_, _, _, 0..=1) => "a day ago".to_string(),
        (_, _, _, 2..=25) => format!("{} days ago", days),
        (_, _, _, 26..=45) => "a month ago".to_string(),
        (_, _, _, 46..=319) => format!("{} months ago", (days + 15) / 30),
        (_, _, _, 320..=547) => "a year ago".to_string(),
        _ => format!("{} years ago", (days + 182) / 365),
    }
}
