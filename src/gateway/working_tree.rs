//! Status, history, staging and commit handlers

use super::request::{CheckoutParams, CommitParams, FileParams, FilesParams};
use super::{output_or, required, Envelope, Gateway};
use crate::error::{GatewayError, GatewayResult};
use crate::git::parser::{self, FILE_LOG_FORMAT, LOG_FORMAT};
use crate::security::{sanitize_source_ref, validate_path, validate_paths, ValidationError};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    pub branch: String,
    pub modified: Vec<String>,
    pub staged: Vec<String>,
    pub staged_deleted: Vec<String>,
    pub untracked: Vec<String>,
    pub ahead: u32,
    pub behind: u32,
    pub all_files: Vec<String>,
}

impl Gateway {
    pub(super) async fn status(&self) -> GatewayResult<Envelope> {
        let branch = self.repo.current_branch().await?;

        let modified = self.name_list(["diff", "--name-only"]).await?;
        let staged = self
            .name_list(["diff", "--cached", "--name-only", "--diff-filter=AM"])
            .await?;
        let staged_deleted = self
            .name_list(["diff", "--cached", "--name-only", "--diff-filter=D"])
            .await?;
        let untracked = self.repo.untracked_files().await?;

        // No upstream (or detached HEAD) reads as level
        let (ahead, behind) = if branch.is_empty() {
            (0, 0)
        } else {
            let range = format!("origin/{}...{}", branch, branch);
            let output = self
                .repo
                .git(["rev-list", "--left-right", "--count", range.as_str()])
                .await?;
            parser::parse_ahead_behind(&output.value())
        };

        let all_files = self.name_list(["ls-files"]).await?;

        Envelope::data(StatusData {
            branch,
            modified,
            staged,
            staged_deleted,
            untracked,
            ahead,
            behind,
            all_files,
        })
    }

    async fn name_list<const N: usize>(&self, args: [&str; N]) -> GatewayResult<Vec<String>> {
        let output = self.repo.git(args).await?;
        Ok(parser::parse_name_list(&output.stdout))
    }

    pub(super) async fn log(&self) -> GatewayResult<Envelope> {
        let limit = self.settings.max_history_items.to_string();
        let output = self
            .repo
            .git(["log", "-n", limit.as_str(), LOG_FORMAT, "--date=short"])
            .await?;

        // An unborn branch has no history; that is an empty list, not an error
        Envelope::data(parser::parse_log(&output.stdout))
    }

    pub(super) async fn file_log(&self, params: FileParams) -> GatewayResult<Envelope> {
        let file = validate_path(required(&params.file, "File")?)?;
        let limit = self.settings.max_file_log_items.to_string();

        let output = self
            .repo
            .git([
                "log",
                "-n",
                limit.as_str(),
                FILE_LOG_FORMAT,
                "--date=short",
                "--",
                file.as_str(),
            ])
            .await?;

        Envelope::data(parser::parse_file_log(&output.stdout))
    }

    pub(super) async fn stage_files(&self, params: FilesParams) -> GatewayResult<Envelope> {
        let files = validate_paths(&params.files)?;
        self.add_files(&files).await?;

        Ok(Envelope::ok(format!(
            "{} file(s) staged for the next commit",
            files.len()
        )))
    }

    pub(super) async fn unstage_files(&self, params: FilesParams) -> GatewayResult<Envelope> {
        let files = validate_paths(&params.files)?;

        let output = self
            .repo
            .git(["reset", "HEAD", "--"].into_iter().map(String::from).chain(files.iter().cloned()))
            .await?;
        if !output.success {
            return Err(GatewayError::git_step("git reset failed", output.combined()));
        }

        Ok(Envelope::ok(format!(
            "{} file(s) removed from staging",
            files.len()
        )))
    }

    async fn add_files(&self, files: &[String]) -> GatewayResult<()> {
        let output = self
            .repo
            .git(["add", "--"].into_iter().map(String::from).chain(files.iter().cloned()))
            .await?;
        if !output.success {
            return Err(GatewayError::git_step("git add failed", output.combined()));
        }
        Ok(())
    }

    /// Stage the requested files (if any) and commit; returns git's commit summary
    async fn stage_and_commit(&self, params: &CommitParams) -> GatewayResult<String> {
        let message = required(&params.message, "Commit message")?;

        if params.files.is_empty() && !params.has_staged {
            return Err(ValidationError::NoFiles.into());
        }

        if !params.files.is_empty() {
            let files = validate_paths(&params.files)?;
            self.add_files(&files).await?;
        }

        let output = self.repo.git(["commit", "-m", message]).await?;
        if !output.success {
            return Err(GatewayError::git_step("git commit failed", output.combined()));
        }

        Ok(output.combined())
    }

    pub(super) async fn commit(&self, params: CommitParams) -> GatewayResult<Envelope> {
        let summary = self.stage_and_commit(&params).await?;
        Ok(Envelope::ok(summary))
    }

    pub(super) async fn commit_and_push(&self, params: CommitParams) -> GatewayResult<Envelope> {
        let summary = self.stage_and_commit(&params).await?;

        let pushed = match self.push_current_branch().await {
            Ok(pushed) => pushed,
            Err(e) => {
                return Err(GatewayError::Precondition(format!(
                    "Commit succeeded but push failed: {}",
                    e
                )));
            }
        };

        Ok(Envelope::ok(format!(
            "Commit:\n{}\n\nPush:\n{}",
            summary, pushed.output
        )))
    }

    pub(super) async fn checkout_file(&self, params: CheckoutParams) -> GatewayResult<Envelope> {
        let file = validate_path(required(&params.file, "File")?)?;
        let source = sanitize_source_ref(params.source.as_deref());

        let output = self
            .git_ok(["checkout", source, "--", file.as_str()])
            .await?;

        Ok(Envelope::ok(output_or(&output, "File restored")))
    }

    pub(super) async fn discard_all(&self) -> GatewayResult<Envelope> {
        self.git_ok(["checkout", "--", "."]).await?;
        Ok(Envelope::ok("Changes discarded"))
    }

    pub(super) async fn diff(&self, params: FileParams) -> GatewayResult<Envelope> {
        let file = validate_path(required(&params.file, "File")?)?;

        // Whatever git printed, including its complaints, is the answer
        let output = self.repo.git(["diff", "--", file.as_str()]).await?;
        Ok(Envelope::ok(output.combined()))
    }

    pub(super) async fn remove_from_repo(&self, params: FileParams) -> GatewayResult<Envelope> {
        let file = validate_path(required(&params.file, "File")?)?;

        let output = self.git_ok(["rm", "--", file.as_str()]).await?;
        Ok(Envelope::ok(output_or(
            &output,
            format!("File '{}' removed from the repository and from disk", file),
        )))
    }

    pub(super) async fn untrack_file(&self, params: FileParams) -> GatewayResult<Envelope> {
        let file = validate_path(required(&params.file, "File")?)?;

        let output = self.git_ok(["rm", "--cached", "--", file.as_str()]).await?;
        Ok(Envelope::ok(output_or(
            &output,
            format!("File '{}' is no longer tracked (kept on disk)", file),
        )))
    }
}
