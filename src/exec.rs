use anyhow::{Context, Result};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use crate::env::EnvMap;

/// One (format, test) pair, fully resolved and ready to launch.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// 1-based position in the matrix.
    pub index: usize,
    pub total: usize,
    pub format: String,
    pub test: PathBuf,
    pub program: String,
    /// Test path followed by the `-G` pairs.
    pub args: Vec<String>,
    pub env: EnvMap,
}

impl Invocation {
    /// The command as echoed in progress lines, without the interpreter.
    pub fn display_args(&self) -> String {
        self.args.join(" ")
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a finished child left behind.
#[derive(Debug, Clone, Default)]
pub struct Captured {
    /// `None` when the child was killed by a signal.
    pub code: Option<i32>,
    /// Stdout and stderr lines, interleaved in arrival order.
    pub lines: Vec<String>,
}

/// The seam between the matrix and the operating system.
pub trait Launcher {
    fn launch(&self, invocation: &Invocation) -> impl Future<Output = Result<Captured>> + Send;

    /// Version banner of `program`, if it can tell.
    fn probe_version(&self, _program: &str) -> impl Future<Output = Option<String>> + Send {
        async { None }
    }
}

/// Runs each invocation as a real subprocess and waits for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    async fn launch(&self, invocation: &Invocation) -> Result<Captured> {
        debug!(
            format = %invocation.format,
            test = %invocation.test.display(),
            "launching"
        );

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .env_clear()
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to launch {}", invocation.program))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let stdout = child.stdout.take().context("child stdout not captured")?;
        let stderr = child.stderr.take().context("child stderr not captured")?;
        let out_task = tokio::spawn(forward_lines(stdout, tx.clone()));
        let err_task = tokio::spawn(forward_lines(stderr, tx));

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        out_task.await??;
        err_task.await??;

        let status = child.wait().await?;
        debug!(code = ?status.code(), lines = lines.len(), "child exited");

        Ok(Captured {
            code: status.code(),
            lines,
        })
    }

    async fn probe_version(&self, program: &str) -> Option<String> {
        interpreter_version(program).await
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']).to_string();
        if tx.send(line).is_err() {
            return Ok(());
        }
    }
}

/// Asks the interpreter for its version, for the run header.
pub async fn interpreter_version(program: &str) -> Option<String> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    // Older Pythons print the version on stderr.
    let text = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    let version = String::from_utf8_lossy(&text).lines().next()?.trim().to_string();
    (!version.is_empty()).then_some(version)
}
