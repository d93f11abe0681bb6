use crate::error::{GitError, GitResult};
use regex::Regex;
use std::fmt;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^git version (\d+)\.(\d+)(?:\.(\d+))?").expect("valid regex")
});

const DETECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Installed git version, ordered field by field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Oldest git the gateway runs against; `git init -b` arrived in 2.28
    pub const MINIMUM: GitVersion = GitVersion {
        major: 2,
        minor: 28,
        patch: 0,
    };

    /// Ask the `git` on PATH for its version
    pub async fn detect() -> GitResult<Self> {
        let child = Command::new("git")
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GitError::GitVersionDetectionFailed(format!("Failed to execute git: {}", e)))?;

        let output = tokio::time::timeout(DETECT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| GitError::GitVersionDetectionFailed("git --version timed out".to_string()))??;

        if !output.status.success() {
            return Err(GitError::GitVersionDetectionFailed(
                "git --version command failed".to_string(),
            ));
        }

        Self::parse(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parse `git version 2.39.2`, tolerating vendor suffixes such as
    /// `.windows.1` or ` (Apple Git-146)`
    pub fn parse(version_str: &str) -> GitResult<Self> {
        let caps = VERSION_LINE.captures(version_str.trim()).ok_or_else(|| {
            GitError::ParseError(format!("Unexpected git version format: {}", version_str.trim()))
        })?;

        let number = |index: usize| -> u32 {
            caps.get(index)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };

        Ok(Self {
            major: number(1),
            minor: number(2),
            patch: number(3),
        })
    }

    pub fn is_supported(&self) -> bool {
        *self >= Self::MINIMUM
    }

    /// Detect the installed version and refuse anything older than [`Self::MINIMUM`]
    pub async fn require() -> GitResult<Self> {
        let version = Self::detect().await?;

        if !version.is_supported() {
            return Err(GitError::GitVersionTooOld(version.to_string()));
        }

        Ok(version)
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(major: u32, minor: u32, patch: u32) -> GitVersion {
        GitVersion {
            major,
            minor,
            patch,
        }
    }

    #[test]
    fn test_parse_vendor_suffixes() {
        assert_eq!(GitVersion::parse("git version 2.39.2\n").unwrap(), version(2, 39, 2));
        assert_eq!(
            GitVersion::parse("git version 2.39.2.windows.1").unwrap(),
            version(2, 39, 2)
        );
        assert_eq!(
            GitVersion::parse("git version 2.39.3 (Apple Git-146)").unwrap(),
            version(2, 39, 3)
        );
        assert_eq!(GitVersion::parse("git version 2.43").unwrap(), version(2, 43, 0));
    }

    #[test]
    fn test_parse_rejects_other_output() {
        assert!(GitVersion::parse("version 2.39.2").is_err());
        assert!(GitVersion::parse("git 2.39.2").is_err());
        assert!(GitVersion::parse("git version two").is_err());
    }

    #[test]
    fn test_minimum() {
        assert!(GitVersion::MINIMUM.is_supported());
        assert!(version(2, 43, 0).is_supported());
        assert!(version(3, 0, 0).is_supported());

        assert!(!version(2, 27, 9).is_supported());
        assert!(!version(2, 20, 0).is_supported());
        assert!(!version(1, 9, 9).is_supported());
    }

    #[test]
    fn test_display() {
        assert_eq!(version(2, 39, 2).to_string(), "2.39.2");
    }

    #[tokio::test]
    async fn test_installed_git_is_supported() {
        let installed = GitVersion::require().await.unwrap();
        assert!(installed >= GitVersion::MINIMUM);
    }
}
