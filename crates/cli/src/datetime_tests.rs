// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use time::macros::datetime;

use super::*;

const NOW: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

#[yare::parameterized(
    rfc3339         = { "2025-12-24T08:30:00+08:00", "2025-12-24T08:30:00+08:00" },
    rfc3339_nanos   = { "2025-12-24T08:30:00.123456789Z", "2025-12-24T08:30:00.123456789Z" },
    rfc2822         = { "Wed, 24 Dec 2025 08:30:00 +0000", "2025-12-24T08:30:00Z" },
    seconds         = { "2025-12-24 08:30:15", "2025-12-24T08:30:15Z" },
    minutes         = { "2025-12-24 08:30", "2025-12-24T08:30:00Z" },
    hour_only       = { "2025-12-24 08", "2025-12-24T08:00:00Z" },
    date_only       = { "2025-12-24", "2025-12-24T00:00:00Z" },
    padded          = { "  2025-12-24  ", "2025-12-24T00:00:00Z" },
    empty           = { "", "2026-03-01T12:00:00Z" },
    garbage         = { "next tuesday", "2026-03-01T12:00:00Z" },
)]
fn normalizes(input: &str, expected: &str) {
    assert_eq!(normalize_at(input, NOW), expected);
}

#[test]
fn minute_stamp_layout() {
    assert_eq!(minute_stamp(datetime!(2026-07-04 09:05:59 UTC)), "2026-07-04 09:05");
}

#[test]
fn normalize_defaults_to_roughly_now() {
    let before = OffsetDateTime::now_utc() - time::Duration::seconds(1);
    let out = normalize("");
    let parsed = OffsetDateTime::parse(&out, &Rfc3339).ok();
    assert!(parsed.is_some_and(|t| t >= before), "{out}");
}
