// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loose datetime input normalized to RFC 3339.

use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Normalize a user-supplied datetime to RFC 3339. Empty or unrecognized
/// input becomes the current time.
pub fn normalize(input: &str) -> String {
    normalize_at(input, OffsetDateTime::now_utc())
}

/// [`normalize`] with an explicit "now".
pub fn normalize_at(input: &str, now: OffsetDateTime) -> String {
    rfc3339(parse(input.trim()).unwrap_or(now))
}

/// Parse the accepted layouts. Layouts without an offset are taken as UTC.
pub fn parse(input: &str) -> Option<OffsetDateTime> {
    if input.is_empty() {
        return None;
    }
    if let Ok(t) = OffsetDateTime::parse(input, &Rfc3339) {
        return Some(t);
    }
    if let Ok(t) = OffsetDateTime::parse(input, &Rfc2822) {
        return Some(t);
    }
    let seconds = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if let Ok(t) = PrimitiveDateTime::parse(input, seconds) {
        return Some(t.assume_utc());
    }
    let minutes = format_description!("[year]-[month]-[day] [hour]:[minute]");
    if let Ok(t) = PrimitiveDateTime::parse(input, minutes) {
        return Some(t.assume_utc());
    }
    // "YYYY-MM-DD HH"
    if input.len() == 13 {
        if let Ok(t) = PrimitiveDateTime::parse(&format!("{input}:00"), minutes) {
            return Some(t.assume_utc());
        }
    }
    let day = format_description!("[year]-[month]-[day]");
    if let Ok(d) = Date::parse(input, day) {
        return Some(d.midnight().assume_utc());
    }
    None
}

pub fn rfc3339(t: OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_else(|_| t.to_string())
}

/// Current local time, or UTC when the local offset cannot be determined.
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `YYYY-MM-DD HH:MM`, the layout used in post frontmatter.
pub fn minute_stamp(t: OffsetDateTime) -> String {
    let layout = format_description!("[year]-[month]-[day] [hour]:[minute]");
    t.format(layout).unwrap_or_default()
}

#[cfg(test)]
#[path = "datetime_tests.rs"]
mod tests;
