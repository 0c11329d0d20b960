// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use time::macros::datetime;

use super::*;

#[test]
fn template_layout() {
    let out = template("Hello, World", datetime!(2026-04-05 06:07 UTC));
    assert_eq!(
        out,
        "---\ntitle: \"Hello, World\"\nslug: \"\"\ndatetime: \"2026-04-05 06:07\"\nsummary: \"\"\ntags: []\ntheme: light\ncover_image_url: \"\"\n---\n\n"
    );
}

#[yare::parameterized(
    quote     = { r#"Say "hi""#, r#"Say \"hi\""# },
    backslash = { r"C:\drafts", r"C:\\drafts" },
    newline   = { "two\nlines", "two\\nlines" },
)]
fn title_is_escaped(title: &str, expected: &str) {
    let out = template(title, datetime!(2026-04-05 06:07 UTC));
    assert!(out.contains(&format!("title: \"{expected}\"\n")), "{out}");
}
