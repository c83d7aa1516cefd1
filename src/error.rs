//! Pipeline failure taxonomy.
//!
//! Every variant is fatal for the run; there is no retry path anywhere in
//! the pipeline. Plain workspace I/O failures travel as `anyhow` errors
//! with context instead of a dedicated variant.

use std::path::PathBuf;
use thiserror::Error;

/// Diagnostic context captured when the build tool fails.
#[derive(Debug, Clone)]
pub struct BuildDiagnostics {
    /// Path of the invoked tool.
    pub tool: String,
    /// Fixed argument set the tool was started with.
    pub arguments: String,
    /// Identity the pipeline ran under.
    pub user: String,
}

/// Classified fatal pipeline failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Captured stderr matched a known missing-tool fragment.
    #[error("build tool '{}' not installed or missing from PATH for user {}", .diagnostics.tool, .diagnostics.user)]
    ToolNotInstalled { diagnostics: BuildDiagnostics },

    /// Captured stderr matched a known per-user data directory failure.
    #[error("build tool '{}' cannot create its per-user data directory as user {}", .diagnostics.tool, .diagnostics.user)]
    ToolPermissionDenied { diagnostics: BuildDiagnostics },

    /// Captured stderr matched no known fragment.
    #[error("build tool '{}' reported errors (arguments '{}', user '{}'):\n{}", .diagnostics.tool, .diagnostics.arguments, .diagnostics.user, .stderr)]
    UnknownBuildFailure {
        stderr: String,
        diagnostics: BuildDiagnostics,
    },

    /// The build wrote nothing to stderr yet produced no output directory.
    #[error("build produced no output directory at '{}'", .0.display())]
    BuildOutputMissing(PathBuf),

    /// No destination container exists at the rewritten path.
    #[error("missing destination container '{0}'")]
    MissingDestinationContainer(String),
}
