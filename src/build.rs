//! External build tool invocation.
//!
//! The tool is launched through the shell with a fixed non-interactive
//! argument set, the workspace as working directory and both standard
//! streams fully captured. Any stderr output is fatal; the captured text is
//! classified against a prioritized table of known diagnostic fragments.
//! The exit code is not checked independently, and stdout is informational
//! only.

use crate::error::{BuildDiagnostics, PipelineError};
use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Fixed argument set passed to the build tool.
pub const BUILD_ARGS: &str = "start --color=false";

/// Captured output of one build tool run.
#[derive(Debug)]
pub struct BuildOutcome {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    ToolNotInstalled,
    ToolPermissionDenied,
}

/// Known stderr fragments, most specific first. Every fragment of an entry
/// must appear (case-insensitively) in the captured text for the entry to
/// match; the first matching entry wins. New patterns slot in here without
/// touching control flow.
const FAILURE_PATTERNS: &[(&[&str], FailureKind)] = &[
    (
        &["the system cannot find the path specified"],
        FailureKind::ToolNotInstalled,
    ),
    (&["command not found"], FailureKind::ToolNotInstalled),
    (&[": not found"], FailureKind::ToolNotInstalled),
    (&["no such file or directory"], FailureKind::ToolNotInstalled),
    (
        &["mkdir", "appdata\\roaming\\npm"],
        FailureKind::ToolPermissionDenied,
    ),
    (
        &["mkdir", "permission denied"],
        FailureKind::ToolPermissionDenied,
    ),
];

/// Launch the build tool in `workspace` and capture both streams in full,
/// blocking until the process exits.
///
/// The two pipes are drained by concurrent reader threads; draining them
/// one after the other can deadlock once either OS buffer fills.
pub fn invoke_build(workspace: &Path, tool: &str) -> Result<BuildOutcome> {
    let command_line = command_line(tool);
    debug!("running {command_line} in {}", workspace.display());

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(&command_line)
        .current_dir(workspace)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("starting build tool '{tool}'"))?;

    let stdout_pipe = child
        .stdout
        .take()
        .context("capturing build tool stdout")?;
    let stderr_pipe = child
        .stderr
        .take()
        .context("capturing build tool stderr")?;
    let stdout_reader = thread::spawn(move || drain(stdout_pipe));
    let stderr_reader = thread::spawn(move || drain(stderr_pipe));

    let stdout = stdout_reader
        .join()
        .map_err(|_| anyhow!("build tool stdout reader panicked"))??;
    let stderr = stderr_reader
        .join()
        .map_err(|_| anyhow!("build tool stderr reader panicked"))??;

    let status = child
        .wait()
        .with_context(|| format!("waiting for build tool '{tool}'"))?;
    debug!("build tool exited with {status}");

    Ok(BuildOutcome { stdout, stderr })
}

/// Treat any stderr output as fatal, classified against the known
/// patterns. An empty capture is the sole success signal.
pub fn check_outcome(outcome: &BuildOutcome, tool: &str) -> Result<(), PipelineError> {
    if outcome.stderr.is_empty() {
        return Ok(());
    }

    let diagnostics = BuildDiagnostics {
        tool: tool.to_string(),
        arguments: BUILD_ARGS.to_string(),
        user: invoking_user(),
    };
    let lowered = outcome.stderr.to_lowercase();
    for (fragments, kind) in FAILURE_PATTERNS {
        if fragments.iter().all(|fragment| lowered.contains(*fragment)) {
            return Err(match kind {
                FailureKind::ToolNotInstalled => PipelineError::ToolNotInstalled { diagnostics },
                FailureKind::ToolPermissionDenied => {
                    PipelineError::ToolPermissionDenied { diagnostics }
                }
            });
        }
    }
    Err(PipelineError::UnknownBuildFailure {
        stderr: outcome.stderr.clone(),
        diagnostics,
    })
}

fn command_line(tool: &str) -> String {
    format!("\"{tool}\" {BUILD_ARGS}")
}

fn drain(mut pipe: impl Read) -> Result<String> {
    let mut buffer = Vec::new();
    pipe.read_to_end(&mut buffer)
        .context("draining build tool stream")?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Identity the pipeline runs under, for actionable failure messages.
fn invoking_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
