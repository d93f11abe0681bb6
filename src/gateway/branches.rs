//! Branch listing and management handlers

use super::request::{
    BranchParams, CreateBranchParams, DeleteBranchParams, RenameBranchParams, SwitchBranchParams,
};
use super::{output_or, required, Envelope, Gateway};
use crate::error::{GatewayError, GatewayResult};
use crate::error_translation::ErrorTranslator;
use crate::git::executor::GitCommand;
use crate::git::parser::{self, BranchEntry, BRANCH_FORMAT};
use crate::security::{reject_protected, validate_branch_name, BranchPattern};
use serde::Serialize;

const ORPHAN_COMMIT_MESSAGE: &str = "Initial commit (empty branch)";
const FRESH_START_COMMIT_MESSAGE: &str = "Fresh start - new beginning without history";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchesData {
    pub current: String,
    pub local: Vec<BranchEntry>,
    pub remote: Vec<String>,
    pub is_detached: bool,
    pub detached_at: String,
}

impl Gateway {
    pub(super) async fn branches(&self) -> GatewayResult<Envelope> {
        let current = self.repo.current_branch().await?;
        let is_detached = current.is_empty();
        let detached_at = if is_detached {
            self.repo.short_head().await?
        } else {
            String::new()
        };

        let local_output = self.repo.git(["branch", BRANCH_FORMAT]).await?;
        let local = parser::parse_branch_list(&local_output.stdout, &current);

        let remote_output = self
            .repo
            .git(["branch", "-r", "--format=%(refname:short)"])
            .await?;
        // Remote branches already tracked by a local branch are shown with it
        let remote = parser::parse_remote_refs(&remote_output.stdout)
            .into_iter()
            .filter(|name| !local.iter().any(|branch| branch.upstream == *name))
            .collect();

        Envelope::data(BranchesData {
            current,
            local,
            remote,
            is_detached,
            detached_at,
        })
    }

    pub(super) async fn switch_branch(&self, params: SwitchBranchParams) -> GatewayResult<Envelope> {
        let branch = required(&params.branch, "Branch name")?;
        validate_branch_name(branch, BranchPattern::WithSlash)?;

        let mut command = GitCommand::new(["checkout"]);
        if params.force {
            command = command.arg("-f");
        }

        let message = match branch.strip_prefix("origin/").filter(|local| !local.is_empty()) {
            // Never both: an existing local branch is checked out as is
            Some(local) => {
                validate_branch_name(local, BranchPattern::WithSlash)?;
                if self.repo.local_branch_exists(local).await? {
                    command = command.arg(local);
                    format!("Switched to branch '{}'", local)
                } else {
                    command = command.args(["-b", local, "--track", branch]);
                    format!("Created local branch '{}' tracking '{}'", local, branch)
                }
            }
            None => {
                command = command.arg(branch);
                format!("Switched to branch '{}'", branch)
            }
        };

        let output = self.repo.run(command).await?;
        if !output.success {
            let output = output.combined();
            return Err(GatewayError::CheckoutFailed {
                needs_force: ErrorTranslator::needs_force(&output),
                output,
            });
        }

        Ok(Envelope::ok(message))
    }

    pub(super) async fn create_branch(&self, params: CreateBranchParams) -> GatewayResult<Envelope> {
        let branch = required(&params.branch, "Branch name")?;
        validate_branch_name(branch, BranchPattern::Plain)?;

        let source = params.source_branch.as_deref().filter(|s| !s.is_empty());
        if let Some(source) = source {
            validate_branch_name(source, BranchPattern::WithSlash)?;
        }

        if params.orphan {
            self.git_ok(["checkout", "--orphan", branch]).await?;

            // Fails harmlessly when the index is already empty
            self.repo
                .run(GitCommand::new(["rm", "-rf", "--cached", "."]).tolerated())
                .await?;

            let commit = self
                .repo
                .git(["commit", "--allow-empty", "-m", ORPHAN_COMMIT_MESSAGE])
                .await?;
            if !commit.success {
                return Err(GatewayError::git_step(
                    "Branch created but the initial commit failed",
                    commit.combined(),
                ));
            }

            return Ok(Envelope::ok(format!(
                "Orphan branch '{}' created (empty, no history)",
                branch
            )));
        }

        if params.fresh_start {
            self.git_ok(["checkout", "--orphan", branch]).await?;

            self.repo
                .run(GitCommand::new(["add", "-A"]).tolerated())
                .await?;

            let commit = self
                .repo
                .git(["commit", "-m", FRESH_START_COMMIT_MESSAGE])
                .await?;
            if !commit.success {
                return Err(GatewayError::git_step(
                    "Branch created but the commit failed",
                    commit.combined(),
                ));
            }

            return Ok(Envelope::ok(format!(
                "Branch '{}' created with all current files (no history)",
                branch
            )));
        }

        let checkout = params.checkout.unwrap_or(true);
        let mut command = if checkout {
            GitCommand::new(["checkout", "-b", branch])
        } else {
            GitCommand::new(["branch", branch])
        };
        if let Some(source) = source {
            command = command.arg(source);
        }
        self.run_ok(command).await?;

        let message = match (checkout, source) {
            (true, Some(source)) => {
                format!("Branch '{}' created from '{}' and checked out", branch, source)
            }
            (true, None) => format!("Branch '{}' created and checked out", branch),
            (false, Some(source)) => format!("Branch '{}' created from '{}'", branch, source),
            (false, None) => format!("Branch '{}' created", branch),
        };

        Ok(Envelope::ok(message))
    }

    pub(super) async fn rename_branch(&self, params: RenameBranchParams) -> GatewayResult<Envelope> {
        let old_name = required(&params.old_name, "Old branch name")?;
        let new_name = required(&params.new_name, "New branch name")?;
        validate_branch_name(old_name, BranchPattern::WithSlash)?;
        validate_branch_name(new_name, BranchPattern::WithSlash)?;

        if self.repo.current_branch().await? == old_name {
            self.git_ok(["branch", "-m", new_name]).await?;
        } else {
            self.git_ok(["branch", "-m", old_name, new_name]).await?;
        }

        Ok(Envelope::ok(format!(
            "Branch '{}' renamed to '{}'",
            old_name, new_name
        )))
    }

    pub(super) async fn delete_branch(&self, params: DeleteBranchParams) -> GatewayResult<Envelope> {
        let branch = required(&params.branch, "Branch name")?;
        validate_branch_name(branch, BranchPattern::WithSlash)?;
        reject_protected(branch)?;

        let flag = if params.force { "-D" } else { "-d" };
        self.git_ok(["branch", flag, branch]).await?;

        Ok(Envelope::ok(format!("Branch '{}' deleted", branch)))
    }

    pub(super) async fn merge_branch(&self, params: BranchParams) -> GatewayResult<Envelope> {
        let branch = required(&params.branch, "Branch name")?;
        validate_branch_name(branch, BranchPattern::WithSlash)?;

        let output = self.git_ok(["merge", branch]).await?;
        Ok(Envelope::ok(output_or(
            &output,
            format!("Branch '{}' merged", branch),
        )))
    }

    pub(super) async fn push_branch(&self, params: BranchParams) -> GatewayResult<Envelope> {
        let branch = required(&params.branch, "Branch name")?;
        validate_branch_name(branch, BranchPattern::Plain)?;

        self.git_ok(["push", "-u", "origin", branch]).await?;
        Ok(Envelope::ok(format!("Branch '{}' published to origin", branch)))
    }

    pub(super) async fn delete_remote_branch(&self, params: BranchParams) -> GatewayResult<Envelope> {
        let branch = required(&params.branch, "Branch name")?;
        validate_branch_name(branch, BranchPattern::Plain)?;
        reject_protected(branch)?;

        self.git_ok(["push", "origin", "--delete", branch]).await?;
        Ok(Envelope::ok(format!(
            "Branch '{}' deleted from the remote",
            branch
        )))
    }
}
