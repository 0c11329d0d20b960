// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Runs the real `quail` binary as a subprocess against an isolated
//! credential store, and drives its MCP server over stdio and HTTP.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Once;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Resolve the path to the compiled `quail` binary.
pub fn quail_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("quail")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// An isolated environment for one test: its own credential store and
/// base URLs. Both bases default to a closed local port.
pub struct Sandbox {
    dir: tempfile::TempDir,
    base: String,
}

impl Sandbox {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base("http://127.0.0.1:9")
    }

    /// Point both the API and auth bases at `base`.
    pub fn with_base(base: &str) -> anyhow::Result<Self> {
        ensure_crypto();
        let binary = quail_binary();
        anyhow::ensure!(binary.exists(), "quail binary not found at {}", binary.display());
        Ok(Self { dir: tempfile::tempdir()?, base: base.to_owned() })
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("quail-cli").join("config.json")
    }

    /// A `quail` command with this sandbox's environment. Stdin is not a
    /// terminal, so the guard runs non-interactively.
    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(quail_binary());
        cmd.args(args)
            .env("QUAIL_CONFIG", self.store_path())
            .env("QUAIL_API_BASE", &self.base)
            .env("QUAIL_AUTH_BASE", &self.base)
            .env("QUAIL_NO_BROWSER", "true")
            .env("QUAIL_LOGIN_TIMEOUT", "1")
            .env("QUAIL_LOG_LEVEL", "warn")
            .env_remove("QUAIL_FORMAT")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Run `quail` to completion.
    pub async fn run(&self, args: &[&str]) -> anyhow::Result<Output> {
        let mut cmd = self.command(args);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        Ok(tokio::time::timeout(Duration::from_secs(20), cmd.output()).await??)
    }

    /// Start `quail mcp` on stdio.
    pub fn mcp_stdio(&self) -> anyhow::Result<McpStdio> {
        let mut child = self
            .command(&["mcp"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdin = child.stdin.take().ok_or_else(|| anyhow::anyhow!("no stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| anyhow::anyhow!("no stdout"))?;
        Ok(McpStdio { _child: child, stdin, stdout: BufReader::new(stdout).lines() })
    }

    /// Start `quail mcp --http` on a free port.
    pub fn mcp_http(&self) -> anyhow::Result<McpHttp> {
        let port = free_port()?;
        let child = self
            .command(&["mcp", "--http", "--port", &port.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(McpHttp { _child: child, port })
    }
}

/// Stdout as a string.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr as a string.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A running `quail mcp` process on stdio, killed on drop.
pub struct McpStdio {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl McpStdio {
    /// Send one message and read one response line.
    pub async fn request(&mut self, message: &Value) -> anyhow::Result<Value> {
        self.notify(message).await?;
        let line = tokio::time::timeout(Duration::from_secs(10), self.stdout.next_line())
            .await??
            .ok_or_else(|| anyhow::anyhow!("mcp server closed stdout"))?;
        Ok(serde_json::from_str(&line)?)
    }

    /// Send one message without waiting for a response.
    pub async fn notify(&mut self, message: &Value) -> anyhow::Result<()> {
        self.stdin.write_all(format!("{message}\n").as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }
}

/// A running `quail mcp --http` process, killed on drop.
pub struct McpHttp {
    _child: Child,
    port: u16,
}

impl McpHttp {
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/mcp", self.port)
    }

    /// Poll `/health` until the server answers.
    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("http://127.0.0.1:{}/health", self.port);
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("quail mcp did not become healthy within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
