// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frontmatter scaffold for new markdown posts.

use time::OffsetDateTime;

use crate::datetime::minute_stamp;

/// YAML frontmatter block with the fields `quaily_save_post` reads back.
pub fn template(title: &str, now: OffsetDateTime) -> String {
    format!(
        "---\n\
         title: \"{title}\"\n\
         slug: \"\"\n\
         datetime: \"{datetime}\"\n\
         summary: \"\"\n\
         tags: []\n\
         theme: light\n\
         cover_image_url: \"\"\n\
         ---\n\n",
        title = escape(title),
        datetime = minute_stamp(now),
    )
}

/// Escape for a YAML double-quoted scalar.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "frontmatter_tests.rs"]
mod tests;
