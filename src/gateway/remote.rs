//! Handlers that talk to the `origin` remote

use super::request::UrlParams;
use super::{output_or, required, Envelope, Gateway};
use crate::error::{GatewayError, GatewayResult};
use crate::git::parser;
use crate::security::validate_remote_arg;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoInfoData {
    pub url: String,
    pub name: String,
    pub path: String,
    pub has_remote: bool,
}

/// Outcome of pushing the checked-out branch
#[derive(Debug, Clone)]
pub(super) struct Pushed {
    pub branch: String,
    /// Upstream had to be set with `-u`
    pub published: bool,
    pub output: String,
}

impl Gateway {
    pub(super) async fn repo_info(&self) -> GatewayResult<Envelope> {
        let url = self
            .repo
            .remote_url()
            .await?
            .map(|url| parser::strip_credentials(&url))
            .unwrap_or_default();

        Envelope::data(RepoInfoData {
            name: parser::repo_name_from_url(&url),
            path: self.repo.path().display().to_string(),
            has_remote: !url.is_empty(),
            url,
        })
    }

    pub(super) async fn add_remote(&self, params: UrlParams) -> GatewayResult<Envelope> {
        let url = validate_remote_arg(required(&params.url, "Repository URL")?)?;

        let message = if self.repo.remote_url().await?.is_some() {
            self.git_ok(["remote", "set-url", "origin", url.as_str()])
                .await?;
            "Remote origin updated"
        } else {
            self.git_ok(["remote", "add", "origin", url.as_str()]).await?;
            "Remote origin added"
        };

        let mut envelope = Envelope::ok(format!("{}: {}", message, url));

        let fetch = self.repo.git(["fetch", "origin"]).await?;
        if !fetch.success {
            tracing::warn!(url = %parser::strip_credentials(&url), "fetch after adding remote failed");
            envelope = envelope.with_fetch_error(fetch.combined()).with_warning(
                "Remote added but could not fetch branches (check SSH or HTTPS authentication)",
            );
        }

        Ok(envelope)
    }

    pub(super) async fn remove_remote(&self) -> GatewayResult<Envelope> {
        self.git_ok(["remote", "remove", "origin"]).await?;
        Ok(Envelope::ok("Remote origin removed"))
    }

    /// Push the checked-out branch, publishing it with `-u` when it has no remote yet
    pub(super) async fn push_current_branch(&self) -> GatewayResult<Pushed> {
        let branch = self.repo.current_branch().await?;
        if branch.is_empty() {
            return Err(GatewayError::Precondition(
                "Detached HEAD, cannot push".to_string(),
            ));
        }

        let published = self.repo.branch_remote(&branch).await?.is_none();
        let output = if published {
            self.git_ok(["push", "-u", "origin", branch.as_str()]).await?
        } else {
            self.git_ok(["push", "origin"]).await?
        };

        Ok(Pushed {
            output: output.combined(),
            branch,
            published,
        })
    }

    pub(super) async fn push(&self) -> GatewayResult<Envelope> {
        let pushed = self.push_current_branch().await?;

        if !pushed.output.is_empty() {
            return Ok(Envelope::ok(pushed.output));
        }

        Ok(Envelope::ok(if pushed.published {
            format!("Branch '{}' published and pushed", pushed.branch)
        } else {
            "Push complete".to_string()
        }))
    }

    pub(super) async fn pull(&self) -> GatewayResult<Envelope> {
        let output = self.git_ok(["pull", "origin"]).await?;
        Ok(Envelope::ok(output.combined()))
    }

    pub(super) async fn fetch(&self) -> GatewayResult<Envelope> {
        let output = self.git_ok(["fetch", "origin"]).await?;
        Ok(Envelope::ok(output_or(&output, "Fetch complete")))
    }

    pub(super) async fn list_remote_branches(&self) -> GatewayResult<Envelope> {
        // A failed fetch still leaves the last known refs to list
        let fetch = self.repo.git(["fetch", "--prune"]).await?;

        let output = self
            .repo
            .git(["branch", "-r", "--format=%(refname:short)"])
            .await?;
        let branches = parser::parse_origin_branches(&output.stdout);

        let mut envelope = Envelope::data(serde_json::json!({ "branches": branches }))?;
        if !fetch.success {
            envelope = envelope.with_fetch_error(fetch.combined());
        }
        Ok(envelope)
    }
}
