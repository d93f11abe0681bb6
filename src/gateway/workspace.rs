//! Actions available before the pinned directory is a repository

use super::{Envelope, Gateway};
use crate::error::{GatewayError, GatewayResult};
use crate::git::executor::GitCommand;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    pub name: String,
    pub is_git_repo: bool,
}

/// Directories directly under `parent`, sorted by name
pub fn list_folders(parent: &Path) -> std::io::Result<Vec<FolderEntry>> {
    if !parent.is_dir() {
        return Ok(Vec::new());
    }

    let mut folders = Vec::new();
    for entry in fs::read_dir(parent)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        folders.push(FolderEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_git_repo: path.join(".git").is_dir(),
        });
    }

    folders.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(folders)
}

impl Gateway {
    pub(super) fn check_repo(&self) -> GatewayResult<Envelope> {
        Envelope::data(json!({
            "isGitRepo": self.repo.is_git_repo(),
            "path": self.repo.path().display().to_string(),
        }))
    }

    pub(super) async fn init(&self) -> GatewayResult<Envelope> {
        if self.repo.is_git_repo() {
            return Err(GatewayError::Precondition(
                "This folder is already a git repository".to_string(),
            ));
        }

        self.git_ok(["init", "-b", "main"]).await?;
        self.write_identity(self.repo.path()).await?;

        let path = self.repo.path().display().to_string();
        tracing::info!(path = %path, "initialized repository");
        Ok(Envelope::ok(format!("Initialized git repository in {}", path)))
    }

    pub(super) fn list_folders(&self) -> GatewayResult<Envelope> {
        let parent = &self.settings.parent_dir;
        let folders = list_folders(parent)?;

        Envelope::data(json!({
            "parentDir": parent.display().to_string(),
            "folders": folders,
        }))
    }

    /// Persist the configured identity in the repository at `dir`
    pub(super) async fn write_identity(&self, dir: &Path) -> GatewayResult<()> {
        let identity = &self.settings.identity;
        let entries = [
            ("user.name", identity.user_name.as_deref()),
            ("user.email", identity.user_email.as_deref()),
        ];

        for (key, value) in entries {
            let Some(value) = value else { continue };
            let output = self
                .repo
                .run(GitCommand::new(["config", key, value]).in_dir(dir))
                .await?;
            if !output.success {
                tracing::warn!(key, output = %output.combined(), "could not write identity");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_folders_sorted_and_flagged() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("site-b/.git")).unwrap();
        fs::create_dir(temp.path().join("site-a")).unwrap();
        fs::write(temp.path().join("notes.txt"), "not a folder").unwrap();

        let folders = list_folders(temp.path()).unwrap();
        let names: Vec<_> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["site-a", "site-b"]);
        assert!(!folders[0].is_git_repo);
        assert!(folders[1].is_git_repo);
    }

    #[test]
    fn test_list_folders_missing_parent() {
        let temp = TempDir::new().unwrap();
        assert!(list_folders(&temp.path().join("absent")).unwrap().is_empty());
    }
}
