//! Clone a remote next to the pinned repository

use super::request::CloneParams;
use super::{required, Envelope, Gateway};
use crate::error::{GatewayError, GatewayResult};
use crate::git::executor::GitCommand;
use crate::git::parser;
use crate::security::{is_valid_remote_url, sanitize_folder_name, ValidationError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Folder name used when none can be derived from the URL
const FALLBACK_FOLDER: &str = "cloned-repo";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneData {
    pub path: String,
    pub folder_name: String,
    pub subfolder: String,
    pub copied_files: Vec<String>,
    pub copy_errors: Vec<String>,
}

/// Result of copying the companion files, never fatal to the clone
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied: Vec<String>,
    pub errors: Vec<String>,
}

/// Folder name for a clone: the requested one, or the URL's last segment
///
/// Anything outside `[A-Za-z0-9_.-]` is stripped; names that end up empty or
/// made only of dots are refused.
pub fn target_folder(url: &str, requested: Option<&str>) -> Result<String, ValidationError> {
    let name = match requested.filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => parser::clone_dir_name(url).unwrap_or_else(|| FALLBACK_FOLDER.to_string()),
    };

    let name = sanitize_folder_name(&name);
    if name.is_empty() || name.chars().all(|c| c == '.') {
        return Err(ValidationError::InvalidFolderName);
    }
    Ok(name)
}

/// Copy `files` from `source` into `destination`, creating it first
pub fn copy_companions(source: &Path, destination: &Path, files: &[String]) -> CopyReport {
    let mut report = CopyReport::default();

    if let Err(e) = fs::create_dir_all(destination) {
        tracing::warn!(error = %e, "could not create companion folder");
        report
            .errors
            .push(format!("Could not create folder: {}", destination.display()));
        return report;
    }

    for file in files {
        let from = source.join(file);
        if !from.is_file() {
            report.errors.push(format!("Source not found: {}", file));
            continue;
        }

        match fs::copy(&from, destination.join(file)) {
            Ok(_) => report.copied.push(file.clone()),
            Err(e) => {
                tracing::warn!(file = %file, error = %e, "companion copy failed");
                report.errors.push(format!("Copy failed: {}", file));
            }
        }
    }

    report
}

impl Gateway {
    pub(super) async fn clone_repository(&self, params: CloneParams) -> GatewayResult<Envelope> {
        let url = required(&params.url, "Repository URL")?;
        if !is_valid_remote_url(url) {
            return Err(ValidationError::InvalidUrl(url.to_string()).into());
        }

        let folder = target_folder(url, params.target_dir.as_deref())?;
        let parent = &self.settings.parent_dir;
        let target = parent.join(&folder);

        if target.exists() {
            return Err(GatewayError::Precondition(format!(
                "Folder '{}' already exists",
                folder
            )));
        }

        tracing::info!(url = %parser::strip_credentials(url), target = %target.display(), "cloning");

        // Runs inside the parent directory, so the bare folder name is the destination
        let clone = GitCommand::new(["clone", "--", url, folder.as_str()])
            .in_dir(parent)
            .timeout(self.settings.clone_timeout);
        self.run_ok(clone).await?;

        self.write_identity(&target).await?;

        let clone_settings = &self.settings.clone;
        let subfolder = params
            .subfolder
            .as_deref()
            .map(sanitize_folder_name)
            .filter(|name| !name.is_empty() && !name.chars().all(|c| c == '.'))
            .unwrap_or_else(|| clone_settings.default_subfolder.clone());

        let report = if params.copy_git_manager.unwrap_or(clone_settings.copy_companions) {
            copy_companions(
                &self.companion_source(),
                &target.join(&subfolder),
                &clone_settings.companion_files,
            )
        } else {
            CopyReport::default()
        };

        let mut message = format!("Repository cloned into '{}'", folder);
        if !report.copied.is_empty() {
            message.push_str(&format!(
                "\nFiles copied to {}/: {}",
                subfolder,
                report.copied.join(", ")
            ));
        }
        if !report.errors.is_empty() {
            message.push_str(&format!("\nErrors: {}", report.errors.join(", ")));
        }

        let envelope = Envelope::data(CloneData {
            path: target.display().to_string(),
            folder_name: folder,
            subfolder,
            copied_files: report.copied,
            copy_errors: report.errors,
        })?;
        Ok(envelope.with_output(message))
    }

    /// Where the admin-page files are copied from
    fn companion_source(&self) -> PathBuf {
        match &self.settings.clone.companion_source {
            Some(dir) => dir.clone(),
            None => self
                .repo
                .path()
                .join(&self.settings.clone.default_subfolder),
        }
    }
}
