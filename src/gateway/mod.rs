pub mod branches;
pub mod clone;
pub mod envelope;
pub mod gitignore;
pub mod remote;
pub mod request;
pub mod reset_remote;
pub mod working_tree;
pub mod workspace;

pub use envelope::Envelope;
pub use request::{Action, Request, RequestError, ACTIONS};

use crate::audit::AuditLogger;
use crate::config::settings::{CloneConfig, Config};
use crate::error::{GatewayError, GatewayResult};
use crate::git::executor::{CommandOutput, GitCommand, Identity};
use crate::git::Repository;
use crate::security::ValidationError;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Values the handlers read from configuration
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub identity: Identity,
    pub max_history_items: usize,
    pub max_file_log_items: usize,
    pub parent_dir: PathBuf,
    pub clone_timeout: Duration,
    pub clone: CloneConfig,
}

impl GatewaySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            identity: config.identity(),
            max_history_items: config.display.max_history_items,
            max_file_log_items: config.display.max_file_log_items,
            parent_dir: config.parent_dir(),
            clone_timeout: config.clone_timeout(),
            clone: config.clone.clone(),
        }
    }
}

/// Dispatches decoded requests to their handlers against the pinned repository
pub struct Gateway {
    repo: Repository,
    settings: GatewaySettings,
    audit: Option<Arc<AuditLogger>>,
    /// One action at a time; git takes `index.lock` and concurrent actions would trip over it
    serial: Mutex<()>,
}

impl Gateway {
    pub fn new(repo: Repository, settings: GatewaySettings) -> Self {
        Self {
            repo,
            settings,
            audit: None,
            serial: Mutex::new(()),
        }
    }

    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Handle a raw JSON body; never fails, every outcome is an envelope
    pub async fn handle(&self, body: Value) -> Envelope {
        let requested = body
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let request = match Request::from_json(body) {
            Ok(request) => request,
            Err(e) => {
                let error = GatewayError::from(e);
                self.reject(&requested, &error);
                return error.into();
            }
        };

        self.execute(request).await
    }

    /// Run one decoded request
    pub async fn execute(&self, request: Request) -> Envelope {
        let _guard = self.serial.lock().await;

        match self.dispatch(request.action).await {
            Ok(envelope) => {
                tracing::info!(action = request.name, "action succeeded");
                envelope
            }
            Err(error) => {
                if error.is_rejection() {
                    self.reject(request.name, &error);
                } else {
                    tracing::warn!(action = request.name, error = %error, "action failed");
                }
                error.into()
            }
        }
    }

    async fn dispatch(&self, action: Action) -> GatewayResult<Envelope> {
        if !action.is_repository_free() && !self.repo.is_git_repo() {
            return Err(GatewayError::NeedsInit);
        }

        match action {
            Action::CheckRepo => self.check_repo(),
            Action::Init => self.init().await,
            Action::Clone(params) => self.clone_repository(params).await,
            Action::ListFolders => self.list_folders(),
            Action::ListRemoteBranches => self.list_remote_branches().await,
            Action::ResetRemote(params) => self.reset_remote(params).await,
            Action::Status => self.status().await,
            Action::RepoInfo => self.repo_info().await,
            Action::AddRemote(params) => self.add_remote(params).await,
            Action::RemoveRemote => self.remove_remote().await,
            Action::Log => self.log().await,
            Action::FileLog(params) => self.file_log(params).await,
            Action::StageFiles(params) => self.stage_files(params).await,
            Action::UnstageFiles(params) => self.unstage_files(params).await,
            Action::Commit(params) => self.commit(params).await,
            Action::CommitAndPush(params) => self.commit_and_push(params).await,
            Action::Push => self.push().await,
            Action::Pull => self.pull().await,
            Action::Fetch => self.fetch().await,
            Action::Checkout(params) => self.checkout_file(params).await,
            Action::DiscardAll => self.discard_all().await,
            Action::Diff(params) => self.diff(params).await,
            Action::GetGitignore => self.get_gitignore().await,
            Action::AddToGitignore(params) => self.add_to_gitignore(params),
            Action::RemoveFromGitignore(params) => self.remove_from_gitignore(params),
            Action::RemoveFromRepo(params) => self.remove_from_repo(params).await,
            Action::UntrackFile(params) => self.untrack_file(params).await,
            Action::Branches => self.branches().await,
            Action::SwitchBranch(params) => self.switch_branch(params).await,
            Action::CreateBranch(params) => self.create_branch(params).await,
            Action::RenameBranch(params) => self.rename_branch(params).await,
            Action::DeleteBranch(params) => self.delete_branch(params).await,
            Action::MergeBranch(params) => self.merge_branch(params).await,
            Action::PushBranch(params) => self.push_branch(params).await,
            Action::DeleteRemoteBranch(params) => self.delete_remote_branch(params).await,
        }
    }

    fn reject(&self, action: &str, error: &GatewayError) {
        tracing::warn!(action, reason = %error, "request rejected");

        if let Some(audit) = &self.audit
            && let Err(e) = audit.log_rejection(action, &error.to_string(), self.repo.path())
        {
            tracing::warn!("Failed to write audit log: {}", e);
        }
    }

    /// Run `git <args>` and require a zero exit
    async fn git_ok<I, S>(&self, args: I) -> GatewayResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        require_success(self.repo.git(args).await?)
    }

    async fn run_ok(&self, command: GitCommand) -> GatewayResult<CommandOutput> {
        require_success(self.repo.run(command).await?)
    }
}

/// Turn a nonzero exit into a subprocess error carrying git's output
fn require_success(output: CommandOutput) -> GatewayResult<CommandOutput> {
    if output.success {
        Ok(output)
    } else {
        Err(GatewayError::git_output(output.combined()))
    }
}

/// A required string field, present and non-empty
fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ValidationError> {
    match value.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// Git's own output when it printed any, otherwise a fixed message
fn output_or(output: &CommandOutput, fallback: impl Into<String>) -> String {
    let text = output.combined();
    if text.is_empty() { fallback.into() } else { text }
}
