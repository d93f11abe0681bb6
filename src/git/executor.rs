use crate::audit::AuditLogger;
use crate::error::{GitError, GitResult};
use crate::git::parser::strip_credentials;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// Default time a single git invocation may take
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Identity passed to git as `-c user.name=… -c user.email=…`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// One git invocation as a discrete argument vector
///
/// The `git` program itself and the working-directory pinning are added by
/// the runner; `args` starts at the subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    pub args: Vec<String>,
    /// Run somewhere other than the pinned repository (clone, init of a new dir)
    pub dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    /// A nonzero exit is expected and the caller carries on regardless
    pub tolerate_failure: bool,
}

impl GitCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            dir: None,
            timeout: None,
            tolerate_failure: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn tolerated(mut self) -> Self {
        self.tolerate_failure = true;
        self
    }

    /// Shell-quoted rendering with URL credentials removed, for logs and
    /// transcripts only
    pub fn display(&self) -> String {
        let args: Vec<String> = self.args.iter().map(|arg| strip_credentials(arg)).collect();
        let quoted = shlex::try_join(args.iter().map(String::as_str))
            .unwrap_or_else(|_| args.join(" "));
        format!("git {}", quoted)
    }
}

/// Result of executing a git command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl CommandOutput {
    /// stdout followed by stderr, trimmed; what `2>&1` would have captured
    pub fn combined(&self) -> String {
        [self.stdout.trim(), self.stderr.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Trimmed stdout when the command succeeded, empty otherwise
    pub fn value(&self) -> String {
        if self.success {
            self.stdout.trim().to_string()
        } else {
            String::new()
        }
    }
}

/// Something that can run git commands against a pinned repository
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// The repository every command runs in unless it names its own directory
    fn repo_path(&self) -> &Path;

    /// Run a command to completion. A nonzero exit is reported through
    /// `CommandOutput::success`, not as an error.
    async fn run(&self, command: &GitCommand) -> GitResult<CommandOutput>;
}

/// Executes git commands within a repository
#[derive(Debug, Clone)]
pub struct GitExecutor {
    repo_path: PathBuf,
    identity: Identity,
    timeout: Duration,
    trust_directory: bool,
    audit: Option<Arc<AuditLogger>>,
}

impl GitExecutor {
    /// Create a new GitExecutor for the given repository path
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            identity: Identity::default(),
            timeout: DEFAULT_TIMEOUT,
            trust_directory: false,
            audit: None,
        }
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mark the working directory as safe for this invocation only
    pub fn trust_directory(mut self, trust: bool) -> Self {
        self.trust_directory = trust;
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Build the full argument vector, without the `git` program name
    pub fn full_args(&self, command: &GitCommand) -> Vec<String> {
        let dir = command.dir.as_deref().unwrap_or(&self.repo_path);
        let dir = dir.to_string_lossy().replace('\\', "/");

        let mut args = vec!["-C".to_string(), dir.clone()];
        if self.trust_directory {
            args.push("-c".to_string());
            args.push(format!("safe.directory={}", dir));
        }
        if let Some(name) = &self.identity.user_name {
            args.push("-c".to_string());
            args.push(format!("user.name={}", name));
        }
        if let Some(email) = &self.identity.user_email {
            args.push("-c".to_string());
            args.push(format!("user.email={}", email));
        }
        args.extend(command.args.iter().cloned());
        args
    }

    /// Process command output into CommandOutput struct
    fn process_output(&self, output: Output) -> CommandOutput {
        CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            success: output.status.success(),
        }
    }

    fn audit(&self, command: &GitCommand, exit_code: i32) {
        if let Some(audit) = &self.audit {
            let dir = command.dir.as_deref().unwrap_or(&self.repo_path);
            if let Err(e) = audit.log_command(&command.display(), dir, exit_code) {
                tracing::warn!("Failed to write audit log: {}", e);
            }
        }
    }
}

#[async_trait]
impl GitRunner for GitExecutor {
    fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    async fn run(&self, command: &GitCommand) -> GitResult<CommandOutput> {
        if command.args.is_empty() {
            return Err(GitError::CommandFailed("Empty command".to_string()));
        }

        let timeout = command.timeout.unwrap_or(self.timeout);
        tracing::debug!(command = %command.display(), "running git");

        let child = Command::new("git")
            .args(self.full_args(command))
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GitError::CommandFailed(format!("Failed to execute git: {}", e)))?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                self.audit(command, -1);
                return Err(GitError::Timeout {
                    command: command.display(),
                    seconds: timeout.as_secs(),
                });
            }
        };

        let output = self.process_output(output);
        self.audit(command, output.exit_code);

        if !output.success && command.tolerate_failure {
            tracing::debug!(
                command = %command.display(),
                exit_code = output.exit_code,
                "git exited nonzero (tolerated)"
            );
        } else if !output.success {
            tracing::debug!(
                command = %command.display(),
                exit_code = output.exit_code,
                "git exited nonzero"
            );
        }

        Ok(output)
    }
}
