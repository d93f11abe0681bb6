//! `.gitignore` pattern list handling

use super::request::PatternParams;
use super::{required, Envelope, Gateway};
use crate::error::{GatewayError, GatewayResult};
use crate::security::{validate_pattern, ValidationError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct GitignoreData {
    pub patterns: Vec<String>,
    pub untracked: Vec<String>,
}

/// Active patterns: trimmed, without blank lines and comments
pub fn patterns(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// New file content with `pattern` appended on its own line
pub fn add_pattern(content: &str, pattern: &str) -> GatewayResult<String> {
    if content.split('\n').any(|line| line.trim() == pattern) {
        return Err(GatewayError::Precondition(
            "Pattern already present".to_string(),
        ));
    }

    let mut updated = content.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(pattern);
    updated.push('\n');
    Ok(updated)
}

/// New file content with every line matching `pattern` removed
///
/// Trailing blank lines are dropped and a non-empty result ends with exactly
/// one newline.
pub fn remove_pattern(content: &str, pattern: &str) -> GatewayResult<String> {
    let mut lines: Vec<&str> = Vec::new();
    let mut found = false;

    for line in content.split('\n') {
        if line.trim() == pattern {
            found = true;
        } else {
            lines.push(line);
        }
    }

    if !found {
        return Err(GatewayError::Precondition("Pattern not found".to_string()));
    }

    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    let mut updated = lines.join("\n");
    if !updated.is_empty() {
        updated.push('\n');
    }
    Ok(updated)
}

fn gitignore_path(repo_path: &Path) -> PathBuf {
    repo_path.join(".gitignore")
}

impl Gateway {
    pub(super) async fn get_gitignore(&self) -> GatewayResult<Envelope> {
        let path = gitignore_path(self.repo.path());
        let patterns = if path.is_file() {
            patterns(&fs::read_to_string(&path)?)
        } else {
            Vec::new()
        };

        let untracked = self.repo.untracked_files().await?;

        Envelope::data(GitignoreData {
            patterns,
            untracked,
        })
    }

    pub(super) fn add_to_gitignore(&self, params: PatternParams) -> GatewayResult<Envelope> {
        let pattern = validate_pattern(required(&params.pattern, "Pattern")?)?;
        let path = gitignore_path(self.repo.path());

        let content = if path.exists() {
            fs::read_to_string(&path)?
        } else {
            String::new()
        };

        fs::write(&path, add_pattern(&content, &pattern)?)?;
        tracing::debug!(pattern = %pattern, "pattern added to .gitignore");

        Ok(Envelope::ok("Pattern added"))
    }

    pub(super) fn remove_from_gitignore(&self, params: PatternParams) -> GatewayResult<Envelope> {
        let pattern = required(&params.pattern, "Pattern")?.trim();
        if pattern.is_empty() {
            return Err(ValidationError::MissingField("Pattern").into());
        }

        let path = gitignore_path(self.repo.path());
        if !path.exists() {
            return Err(GatewayError::Precondition(
                "File .gitignore does not exist".to_string(),
            ));
        }

        let content = fs::read_to_string(&path)?;
        fs::write(&path, remove_pattern(&content, pattern)?)?;
        tracing::debug!(pattern, "pattern removed from .gitignore");

        Ok(Envelope::ok("Pattern removed"))
    }
}
