//! External tool runner.
//!
//! Every external invocation goes through [`ToolRunner`]: the program is
//! resolved on `PATH`, stdout/stderr are captured in full, and the child is
//! bounded by a timeout. Children are spawned with `kill_on_drop`, so a
//! timed-out or abandoned invocation never outlives its request.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Histogram of external tool wall time, labelled by tool.
pub const TOOL_DURATION_SECONDS: &str = "vgrab_tool_duration_seconds";

/// Counter of failed external tool invocations, labelled by tool and reason.
pub const TOOL_FAILURES_TOTAL: &str = "vgrab_tool_failures_total";

/// An external command-line tool, as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    name: &'static str,
    program: String,
}

impl Tool {
    /// Create a tool from its display name and configured program (a bare
    /// name looked up on `PATH`, or a path).
    pub fn new(name: &'static str, program: impl Into<String>) -> Self {
        Self {
            name,
            program: program.into(),
        }
    }

    /// The yt-dlp video-info/download tool.
    pub fn yt_dlp(program: impl Into<String>) -> Self {
        Self::new("yt-dlp", program)
    }

    /// The FFmpeg media-processing tool.
    pub fn ffmpeg(program: impl Into<String>) -> Self {
        Self::new("ffmpeg", program)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Resolve the program to an executable path.
    pub fn resolve(&self) -> MediaResult<PathBuf> {
        which::which(&self.program).map_err(|_| MediaError::ToolNotFound {
            tool: self.name,
            path: self.program.clone(),
        })
    }
}

/// Captured result of a finished tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Runs a [`Tool`] with captured output and an optional timeout.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    tool: Tool,
    timeout: Option<Duration>,
}

impl ToolRunner {
    pub fn new(tool: Tool) -> Self {
        Self { tool, timeout: None }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    /// Run the tool and return its output whatever the exit status.
    pub async fn output(&self, args: &[String]) -> MediaResult<ToolOutput> {
        let tool = self.tool.name();
        let program = self.tool.resolve()?;
        debug!(tool, "Running {} {}", program.display(), args.join(" "));

        let child = Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                record_failure(tool, "spawn");
                MediaError::SpawnFailed { tool, source }
            })?;

        let start = Instant::now();
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    // Dropping the wait future drops the child, which kills it.
                    warn!(tool, timeout_secs = limit.as_secs(), "Tool timed out, killing process");
                    record_failure(tool, "timeout");
                    return Err(MediaError::Timeout {
                        tool,
                        secs: limit.as_secs(),
                    });
                }
            },
            None => child.wait_with_output().await,
        }?;

        let elapsed = start.elapsed();
        histogram!(TOOL_DURATION_SECONDS, "tool" => tool).record(elapsed.as_secs_f64());
        debug!(
            tool,
            status = %output.status,
            duration_ms = elapsed.as_millis() as u64,
            stdout_bytes = output.stdout.len(),
            "Tool finished"
        );

        Ok(ToolOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run the tool and require a successful exit.
    pub async fn run(&self, args: &[String]) -> MediaResult<ToolOutput> {
        let output = self.output(args).await?;
        if output.success() {
            return Ok(output);
        }

        let tool = self.tool.name();
        debug!(tool, stderr = %output.stderr, "Tool exited with failure");
        record_failure(tool, "exit_status");
        Err(MediaError::tool_failed(tool, &output.stderr, output.status.code()))
    }
}

fn record_failure(tool: &'static str, reason: &'static str) {
    counter!(TOOL_FAILURES_TOTAL, "tool" => tool, "reason" => reason).increment(1);
}

/// Write `body` as an executable `sh` script named `name` in `dir` and
/// return a [`Tool`] that runs it.
#[cfg(all(test, unix))]
pub(crate) fn script_tool(dir: &std::path::Path, name: &'static str, body: &str) -> Tool {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    Tool::new(name, path.to_string_lossy().into_owned())
}
