//! Replace the remote history with a single empty commit
//!
//! The sequence is irreversible once the force push lands, so each step runs
//! at most once and the first failure stops everything after it.

use super::request::ResetRemoteParams;
use super::{Envelope, Gateway};
use crate::error::{GatewayError, GatewayResult};
use crate::git::executor::{CommandOutput, GitCommand};
use crate::git::Repository;
use crate::security::{validate_branch_name, BranchPattern};

const RESET_COMMIT_MESSAGE: &str = "Initial commit (reset repository)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    Start,
    OrphanCreated,
    IndexCleared,
    EmptyCommitMade,
    ForcePushed,
    OtherBranchesDeleted,
    Done,
}

/// Runs the reset one step at a time, keeping a transcript of what ran
pub struct RemoteReset<'a> {
    repo: &'a Repository,
    branch: String,
    branches_to_delete: Vec<String>,
    step: ResetStep,
    transcript: Vec<String>,
}

impl<'a> RemoteReset<'a> {
    pub fn new(repo: &'a Repository, branch: impl Into<String>) -> Self {
        Self {
            repo,
            branch: branch.into(),
            branches_to_delete: Vec::new(),
            step: ResetStep::Start,
            transcript: Vec::new(),
        }
    }

    /// Remote branches to delete after the push; the reset branch itself is skipped
    pub fn delete_branches(mut self, branches: Vec<String>) -> Self {
        self.branches_to_delete = branches;
        self
    }

    pub fn step(&self) -> ResetStep {
        self.step
    }

    pub fn transcript(&self) -> String {
        self.transcript.join("\n")
    }

    /// Run to completion, returning the full transcript
    pub async fn run(mut self) -> GatewayResult<String> {
        while self.step != ResetStep::Done {
            self.step = self.advance().await?;
            tracing::debug!(step = ?self.step, branch = %self.branch, "reset remote");
        }
        Ok(self.transcript())
    }

    async fn advance(&mut self) -> GatewayResult<ResetStep> {
        let branch = self.branch.clone();

        match self.step {
            ResetStep::Start => {
                self.header(format!("→ Creating orphan branch '{}'...", branch));
                let output = self.git(["checkout", "--orphan", branch.as_str()]).await?;
                self.require(output, "Failed to create orphan branch")?;
                Ok(ResetStep::OrphanCreated)
            }
            ResetStep::OrphanCreated => {
                self.header("\n→ Removing all files from the index...");
                // Nonzero when nothing is tracked; not a reason to stop
                let output = self
                    .repo
                    .run(GitCommand::new(["rm", "-rf", "--cached", "."]).tolerated())
                    .await?;
                self.record(&output);
                Ok(ResetStep::IndexCleared)
            }
            ResetStep::IndexCleared => {
                self.header("\n→ Creating empty initial commit...");
                let output = self
                    .git(["commit", "--allow-empty", "-m", RESET_COMMIT_MESSAGE])
                    .await?;
                self.require(output, "Commit failed")?;
                Ok(ResetStep::EmptyCommitMade)
            }
            ResetStep::EmptyCommitMade => {
                self.header(format!("\n→ Force pushing to origin/{}...", branch));
                let output = self.git(["push", "-f", "origin", branch.as_str()]).await?;
                self.require(output, "Push failed")?;
                Ok(ResetStep::ForcePushed)
            }
            ResetStep::ForcePushed => {
                if self.branches_to_delete.is_empty() {
                    return Ok(ResetStep::Done);
                }
                self.delete_other_branches().await?;
                Ok(ResetStep::OtherBranchesDeleted)
            }
            ResetStep::OtherBranchesDeleted | ResetStep::Done => Ok(ResetStep::Done),
        }
    }

    /// Best effort: failures are written to the transcript and the reset carries on
    async fn delete_other_branches(&mut self) -> GatewayResult<()> {
        self.header("\n→ Deleting other remote branches...");

        let branches = std::mem::take(&mut self.branches_to_delete);
        let target = self.branch.clone();
        let mut deleted = 0;

        for name in branches.iter().filter(|name| **name != target) {
            if validate_branch_name(name, BranchPattern::Plain).is_err() {
                self.transcript
                    .push(format!("  ✗ Skipped '{}': invalid branch name", name));
                continue;
            }

            let output = self.git(["push", "origin", "--delete", name.as_str()]).await?;
            if output.success {
                deleted += 1;
                self.transcript.push(format!("  ✓ Branch '{}' deleted", name));
            } else {
                let reason = output.combined().lines().collect::<Vec<_>>().join(" ");
                self.transcript
                    .push(format!("  ✗ Failed to delete '{}': {}", name, reason));
            }
        }

        if deleted > 0 {
            self.transcript.push(format!(
                "\n{} branch(es) deleted from the remote.",
                deleted
            ));
        }

        Ok(())
    }

    async fn git<const N: usize>(&self, args: [&str; N]) -> GatewayResult<CommandOutput> {
        Ok(self.repo.git(args).await?)
    }

    fn header(&mut self, line: impl Into<String>) {
        self.transcript.push(line.into());
    }

    fn record(&mut self, output: &CommandOutput) {
        self.transcript.push(output.combined());
    }

    /// Record the step's output and stop the sequence if it failed
    fn require(&mut self, output: CommandOutput, context: &str) -> GatewayResult<()> {
        self.record(&output);
        if output.success {
            return Ok(());
        }

        Err(GatewayError::Aborted {
            error: format!("{}:\n{}", context, output.combined()),
            transcript: self.transcript(),
        })
    }
}

impl Gateway {
    pub(super) async fn reset_remote(&self, params: ResetRemoteParams) -> GatewayResult<Envelope> {
        let branch = params
            .branch_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("main");
        validate_branch_name(branch, BranchPattern::Plain)?;

        if self.repo.remote_url().await?.is_none() {
            return Err(GatewayError::Precondition(
                "No remote origin configured".to_string(),
            ));
        }

        tracing::warn!(branch, "resetting remote history");

        let mut reset = RemoteReset::new(&self.repo, branch);
        if params.delete_other_branches {
            reset = reset.delete_branches(params.branches_to_delete);
        }

        let mut transcript = reset.run().await?;
        transcript.push_str(&format!(
            "\n\n✓ Remote repository reset.\n\
             Branch '{branch}' on origin now holds a single empty commit.\n\n\
             NOTE: your local files are still on disk but no longer tracked.\n\
             Stage them to create a new commit."
        ));

        Ok(Envelope::ok(transcript))
    }
}
