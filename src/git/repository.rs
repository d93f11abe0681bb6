use crate::error::GitResult;
use crate::git::executor::{CommandOutput, GitCommand, GitRunner};
use crate::git::parser;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The pinned repository and the runner that executes git inside it
#[derive(Clone)]
pub struct Repository {
    path: PathBuf,
    runner: Arc<dyn GitRunner>,
}

impl Repository {
    /// Create a Repository over the runner's pinned directory
    pub fn new(runner: Arc<dyn GitRunner>) -> Self {
        let path = runner.repo_path().to_path_buf();
        Self { path, runner }
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the pinned directory already holds a `.git` directory
    pub fn is_git_repo(&self) -> bool {
        self.path.join(".git").is_dir()
    }

    /// Run a prepared command
    pub async fn run(&self, command: GitCommand) -> GitResult<CommandOutput> {
        self.runner.run(&command).await
    }

    /// Run `git <args>` in the repository
    pub async fn git<I, S>(&self, args: I) -> GitResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner.run(&GitCommand::new(args)).await
    }

    /// Get the current branch name; empty in detached HEAD state
    pub async fn current_branch(&self) -> GitResult<String> {
        Ok(self.git(["branch", "--show-current"]).await?.value())
    }

    /// URL of the `origin` remote, if one is configured
    pub async fn remote_url(&self) -> GitResult<Option<String>> {
        let url = self
            .git(["config", "--get", "remote.origin.url"])
            .await?
            .value();
        Ok((!url.is_empty()).then_some(url))
    }

    /// Remote a local branch pushes to, if it has one
    pub async fn branch_remote(&self, branch: &str) -> GitResult<Option<String>> {
        let key = format!("branch.{}.remote", branch);
        let remote = self.git(["config", "--get", key.as_str()]).await?.value();
        Ok((!remote.is_empty()).then_some(remote))
    }

    pub async fn local_branch_exists(&self, name: &str) -> GitResult<bool> {
        let output = self.git(["branch", "--list", name]).await?;
        Ok(!output.value().is_empty())
    }

    /// Abbreviated hash of HEAD
    pub async fn short_head(&self) -> GitResult<String> {
        Ok(self.git(["rev-parse", "--short", "HEAD"]).await?.value())
    }

    /// Files not tracked and not ignored
    pub async fn untracked_files(&self) -> GitResult<Vec<String>> {
        let output = self
            .git(["ls-files", "--others", "--exclude-standard"])
            .await?;
        Ok(parser::parse_name_list(&output.stdout))
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
