use std::io;
use thiserror::Error;

// Import module-level errors for AppError
use crate::config::settings::ConfigError;
use crate::gateway::request::RequestError;
use crate::security::validator::ValidationError;

/// Errors that can occur while running git itself
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Git command failed: {0}")]
    CommandFailed(String),

    #[error("Git command timed out after {seconds}s: {command}")]
    Timeout { command: String, seconds: u64 },

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("Git version {0} is too old. Minimum required: 2.28")]
    GitVersionTooOld(String),

    #[error("Failed to detect git version: {0}")]
    GitVersionDetectionFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Failure of a single gateway action
///
/// Every variant is rendered into a `success:false` envelope; none of them
/// outlive the request that produced it.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Body did not name a known action with well-typed fields
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Input rejected before any subprocess ran
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The action needs a repository and there is none
    #[error("Not a git repository")]
    NeedsInit,

    /// Repository state does not allow the action (no remote, detached HEAD, ...)
    #[error("{0}")]
    Precondition(String),

    /// git ran and exited nonzero; `output` is its combined output, verbatim
    #[error("{}", prefixed(.context.as_deref(), .output))]
    Subprocess {
        context: Option<String>,
        output: String,
    },

    /// A checkout was refused; `needs_force` when untracked files were in the way
    #[error("{output}")]
    CheckoutFailed { output: String, needs_force: bool },

    /// A multi-step operation stopped part-way; `transcript` covers the steps that ran
    #[error("{error}")]
    Aborted { error: String, transcript: String },

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl GatewayError {
    /// Subprocess failure reported with git's output only
    pub fn git_output(output: impl Into<String>) -> Self {
        GatewayError::Subprocess {
            context: None,
            output: output.into(),
        }
    }

    /// Subprocess failure with a short description of the failed step
    pub fn git_step(context: impl Into<String>, output: impl Into<String>) -> Self {
        GatewayError::Subprocess {
            context: Some(context.into()),
            output: output.into(),
        }
    }

    /// Rejected before anything ran; these are written to the audit trail
    pub fn is_rejection(&self) -> bool {
        matches!(self, GatewayError::Request(_) | GatewayError::Validation(_))
    }
}

fn prefixed(context: Option<&str>, output: &str) -> String {
    match context {
        Some(context) => format!("{}: {}", context, output),
        None => output.to_string(),
    }
}

/// Top-level application error that wraps all module-specific errors
///
/// Used by startup code (config, version gate, listener); request handling
/// never surfaces it.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for gateway actions
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
