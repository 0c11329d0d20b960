// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use super::*;
use crate::command::Command;

fn parse(args: &[&str]) -> Config {
    Config::parse_from(args)
}

#[test]
fn defaults() -> anyhow::Result<()> {
    let config = parse(&["quail", "status"]);
    config.validate()?;
    assert_eq!(config.api_base, "https://api.quail.ink");
    assert_eq!(config.auth_base, "https://quaily.com");
    assert_eq!(config.format_enum()?, Format::Human);
    assert_eq!(config.client_id, "quail-cli");
    assert_eq!(config.callback_port, 0);
    assert_eq!(config.login_timeout, 300);
    assert!(!config.no_browser);
    assert!(matches!(config.command, Command::Status));
    Ok(())
}

#[test]
fn global_flags_after_subcommand() -> anyhow::Result<()> {
    let config = parse(&["quail", "me", "--format", "json", "--api-base", "http://127.0.0.1:9/"]);
    config.validate()?;
    let settings = config.settings()?;
    assert_eq!(settings.format, Format::Json);
    assert_eq!(settings.api_base, "http://127.0.0.1:9");
    Ok(())
}

#[test]
fn settings_carry_login_options() -> anyhow::Result<()> {
    let config = parse(&[
        "quail",
        "login",
        "--config",
        "/tmp/q/config.json",
        "--callback-port",
        "8765",
        "--login-timeout",
        "30",
        "--no-browser",
    ]);
    config.validate()?;
    let settings = config.settings()?;
    assert_eq!(settings.store_path, PathBuf::from("/tmp/q/config.json"));
    assert_eq!(settings.callback_port, 8765);
    assert_eq!(settings.login_timeout, Duration::from_secs(30));
    assert!(!settings.open_browser);
    Ok(())
}

#[yare::parameterized(
    bad_format    = { &["quail", "status", "--format", "yaml"], "invalid format" },
    bad_api_base  = { &["quail", "status", "--api-base", "not a url"], "invalid --api-base" },
    ftp_auth_base = { &["quail", "status", "--auth-base", "ftp://quaily.com"], "--auth-base must be an http(s) URL" },
    zero_timeout  = { &["quail", "status", "--login-timeout", "0"], "greater than zero" },
    empty_client  = { &["quail", "status", "--client-id", " "], "--client-id must not be empty" },
)]
fn invalid_config(args: &[&str], expected_substr: &str) {
    let config = parse(args);
    crate::assert_err_contains!(config.validate(), expected_substr);
}

#[test]
fn public_urls() -> anyhow::Result<()> {
    let settings = Settings::test("https://quaily.com/", PathBuf::from("/unused"))?;
    assert_eq!(settings.channel_url("field-notes"), "https://quaily.com/field-notes");
    assert_eq!(settings.post_url("field-notes", "hello"), "https://quaily.com/field-notes/p/hello");
    Ok(())
}

#[yare::parameterized(
    with_p      = { "https://quaily.com/field-notes/p/hello", Some(("field-notes", "hello")) },
    without_p   = { "https://quaily.com/field-notes/hello", Some(("field-notes", "hello")) },
    with_query  = { "https://quaily.com/field-notes/p/hello?ref=x", Some(("field-notes", "hello")) },
    content     = { "https://quaily.com/field-notes/hello/content", Some(("field-notes", "hello")) },
    other_host  = { "http://localhost:3000/c/p/slug", Some(("c", "slug")) },
    channel_only = { "https://quaily.com/field-notes", None },
    not_a_url   = { "field-notes/hello", None },
)]
fn post_url_parsing(url: &str, expected: Option<(&str, &str)>) {
    let parsed = parse_post_url(url).ok().flatten();
    let expected = expected.map(|(c, p)| (c.to_owned(), p.to_owned()));
    assert_eq!(parsed, expected);
}
