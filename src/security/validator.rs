use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use crate::security::{ALLOWED_SOURCE_REFS, PROTECTED_BRANCHES};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-.]+$").expect("valid regex"));
static IDENTIFIER_WITH_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-./]+$").expect("valid regex"));
static RELATIVE_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^HEAD~[0-9]+$").expect("valid regex"));
static COMMIT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{7,40}$").expect("valid regex"));
static REMOTE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://|git@)").expect("valid regex"));
static FOLDER_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\-.]").expect("valid regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("No files selected")]
    NoFiles,

    #[error("Invalid file name: {0}")]
    InvalidPath(String),

    #[error("Invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("Invalid URL '{0}'. Use an HTTPS or SSH URL")]
    InvalidUrl(String),

    #[error("Invalid folder name")]
    InvalidFolderName,

    #[error("Cannot delete branch '{0}' (protected)")]
    ProtectedBranch(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Which identifier shape a branch-like value must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchPattern {
    /// Plain name such as `feature-x`
    Plain,
    /// Name that may contain `/`, such as `origin/feature-x` or `team/topic`
    WithSlash,
}

/// Validate a repository-relative file path
///
/// Backslashes are normalised to `/` first; any `..` is rejected no matter
/// where it appears. Returns the normalised path.
pub fn validate_path(path: &str) -> Result<String, ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::MissingField("File"));
    }

    let normalized = path.replace('\\', "/");
    if normalized.contains("..") || normalized.contains('\0') {
        return Err(ValidationError::InvalidPath(path.to_string()));
    }

    Ok(normalized)
}

/// Validate a non-empty list of file paths, failing on the first bad one
pub fn validate_paths(paths: &[String]) -> Result<Vec<String>, ValidationError> {
    if paths.is_empty() {
        return Err(ValidationError::NoFiles);
    }

    paths.iter().map(|path| validate_path(path)).collect()
}

/// Validate a branch (or tag-like) identifier
///
/// Leading `-` is refused as well, since the value is passed to git as a
/// discrete argument and would otherwise be read as an option.
pub fn validate_branch_name(name: &str, pattern: BranchPattern) -> Result<(), ValidationError> {
    let regex = match pattern {
        BranchPattern::Plain => &*IDENTIFIER,
        BranchPattern::WithSlash => &*IDENTIFIER_WITH_SLASH,
    };

    if !regex.is_match(name) || name.starts_with('-') {
        return Err(ValidationError::InvalidBranchName(name.to_string()));
    }

    Ok(())
}

/// Refuse protected branch names
pub fn reject_protected(name: &str) -> Result<(), ValidationError> {
    if PROTECTED_BRANCHES.contains(&name) {
        return Err(ValidationError::ProtectedBranch(name.to_string()));
    }
    Ok(())
}

/// Resolve a checkout source, silently falling back to `HEAD`
pub fn sanitize_source_ref(source: Option<&str>) -> &str {
    match source {
        Some(source)
            if ALLOWED_SOURCE_REFS.contains(&source)
                || RELATIVE_HEAD.is_match(source)
                || COMMIT_HASH.is_match(source) =>
        {
            source
        }
        _ => "HEAD",
    }
}

/// Check a clone URL against the HTTP(S)/SSH prefixes
pub fn is_valid_remote_url(url: &str) -> bool {
    REMOTE_URL.is_match(url)
}

/// Validate a remote URL passed to `git remote add/set-url`
///
/// Local paths and other transports are allowed here, option-like values are not.
pub fn validate_remote_arg(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::MissingField("Repository URL"));
    }
    if url.starts_with('-') || url.contains('\0') {
        return Err(ValidationError::InvalidUrl(url.to_string()));
    }
    Ok(url.to_string())
}

/// Strip every character outside `[A-Za-z0-9_.-]`
pub fn sanitize_folder_name(name: &str) -> String {
    FOLDER_UNSAFE.replace_all(name, "").into_owned()
}

/// Validate a `.gitignore` pattern, returning it trimmed
pub fn validate_pattern(pattern: &str) -> Result<String, ValidationError> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(ValidationError::MissingField("Pattern"));
    }
    if pattern.contains("..") || pattern.contains('\n') {
        return Err(ValidationError::InvalidPattern(pattern.to_string()));
    }
    Ok(pattern.to_string())
}
