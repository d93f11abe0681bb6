use crate::error::{GatewayError, GitError};

/// Phrases git prints when a checkout would clobber untracked files
const UNTRACKED_OVERWRITE: &[&str] = &[
    "untracked working tree files would be overwritten",
    "Please move or remove them",
];

pub struct ErrorTranslator;

impl ErrorTranslator {
    /// Remediation hint for a failed action, if one applies
    pub fn translate(error: &GatewayError) -> Option<String> {
        match error {
            GatewayError::Request(_)
            | GatewayError::Validation(_)
            | GatewayError::Precondition(_)
            | GatewayError::Encode(_) => None,
            GatewayError::NeedsInit => {
                Some("Initialize the repository first (action \"init\")".to_string())
            }
            GatewayError::Subprocess { output, .. }
            | GatewayError::CheckoutFailed { output, .. } => Self::match_error_patterns(output),
            GatewayError::Aborted { error, .. } => Self::match_error_patterns(error),
            GatewayError::Git(git_err) => Self::translate_git(git_err),
            GatewayError::Io(_) => {
                Some("Check file permissions and disk space on the server".to_string())
            }
        }
    }

    fn translate_git(error: &GitError) -> Option<String> {
        match error {
            GitError::Timeout { .. } => Some(
                "The remote may be slow or waiting for credentials; check authentication and retry"
                    .to_string(),
            ),
            other => Self::match_error_patterns(&other.to_string()),
        }
    }

    /// Whether git refused a checkout because untracked files would be overwritten
    ///
    /// Matched case-sensitively on git's exact wording.
    pub fn needs_force(output: &str) -> bool {
        UNTRACKED_OVERWRITE
            .iter()
            .any(|phrase| output.contains(phrase))
    }

    /// Match common git error patterns and provide a hint
    fn match_error_patterns(error_text: &str) -> Option<String> {
        let lower = error_text.to_lowercase();

        // Checked before the generic "would be overwritten" case below
        if Self::needs_force(error_text) {
            return Some(
                "Untracked files would be overwritten; move them or retry with force".to_string(),
            );
        }

        if lower.contains("no upstream") || lower.contains("does not have an upstream") {
            return Some("Publish the branch first (action \"pushBranch\")".to_string());
        }

        if lower.contains("merge conflict") || lower.contains("conflict (") {
            return Some(
                "Resolve the conflicts in the listed files, stage them and commit".to_string(),
            );
        }

        if lower.contains("nothing to commit") || lower.contains("working tree clean") {
            return Some("No changes to commit; the working tree is clean".to_string());
        }

        if lower.contains("pathspec") && lower.contains("did not match") {
            return Some("The file is not known to git; refresh the status and retry".to_string());
        }

        if lower.contains("already exists") && (lower.contains("branch") || lower.contains("ref"))
        {
            return Some("Use a different branch name or delete the existing one".to_string());
        }

        if lower.contains("not fully merged") {
            return Some("Merge the branch first, or delete it with force".to_string());
        }

        if lower.contains("could not read from remote")
            || lower.contains("does not appear to be a git repository")
            || (lower.contains("repository") && lower.contains("not found"))
        {
            return Some("Check the remote URL and that the server can reach it".to_string());
        }

        if lower.contains("authentication failed")
            || lower.contains("permission denied")
            || lower.contains("could not read username")
        {
            return Some(
                "Authentication failed; check the SSH key or access token used by the server"
                    .to_string(),
            );
        }

        if lower.contains("uncommitted changes") || lower.contains("would be overwritten") {
            return Some("Commit or discard local changes first".to_string());
        }

        if lower.contains("non-fast-forward")
            || lower.contains("fetch first")
            || lower.contains("diverged")
        {
            return Some("The remote has new commits; pull before pushing".to_string());
        }

        if lower.contains("no such remote") || lower.contains("'origin' does not appear") {
            return Some("Add a remote first (action \"addRemote\")".to_string());
        }

        if lower.contains("unknown revision") || lower.contains("does not have any commits") {
            return Some("The branch has no commits yet".to_string());
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::ValidationError;

    fn subprocess(output: &str) -> GatewayError {
        GatewayError::git_output(output)
    }

    #[test]
    fn test_translate_no_upstream() {
        let hint = ErrorTranslator::translate(&subprocess(
            "fatal: The current branch topic has no upstream branch.",
        ));
        assert!(hint.unwrap().contains("pushBranch"));
    }

    #[test]
    fn test_translate_merge_conflict() {
        let hint = ErrorTranslator::translate(&subprocess(
            "CONFLICT (content): Merge conflict in index.html",
        ));
        assert!(hint.unwrap().contains("Resolve the conflicts"));
    }

    #[test]
    fn test_translate_nothing_to_commit() {
        let hint =
            ErrorTranslator::translate(&subprocess("nothing to commit, working tree clean"));
        assert!(hint.unwrap().contains("clean"));
    }

    #[test]
    fn test_translate_branch_exists() {
        let hint = ErrorTranslator::translate(&subprocess(
            "fatal: a branch named 'feature' already exists",
        ));
        assert!(hint.unwrap().contains("different branch name"));
    }

    #[test]
    fn test_untracked_overwrite_takes_precedence() {
        let output = "error: The following untracked working tree files would be overwritten by checkout:\n\tpage.html\nPlease move or remove them before you switch branches.\nAborting";
        assert!(ErrorTranslator::needs_force(output));

        let hint = ErrorTranslator::translate(&subprocess(output)).unwrap();
        assert!(hint.contains("retry with force"));
    }

    #[test]
    fn test_needs_force_only_for_untracked() {
        assert!(!ErrorTranslator::needs_force(
            "error: Your local changes to the following files would be overwritten by checkout"
        ));
        assert!(ErrorTranslator::needs_force("Please move or remove them before you merge."));
    }

    #[test]
    fn test_translate_authentication_failed() {
        let hint = ErrorTranslator::translate(&subprocess(
            "remote: Invalid username or password.\nfatal: Authentication failed for 'https://example.com/o/r.git/'",
        ));
        assert!(hint.unwrap().contains("Authentication failed"));
    }

    #[test]
    fn test_translate_rejected_push() {
        let hint = ErrorTranslator::translate(&subprocess(
            " ! [rejected]        main -> main (fetch first)\nerror: failed to push some refs",
        ));
        assert!(hint.unwrap().contains("pull before pushing"));
    }

    #[test]
    fn test_translate_aborted_uses_error_text() {
        let error = GatewayError::Aborted {
            error: "Force push failed: fatal: Authentication failed".to_string(),
            transcript: "→ Creating orphan branch 'main'...".to_string(),
        };
        assert!(ErrorTranslator::translate(&error).is_some());
    }

    #[test]
    fn test_translate_timeout() {
        let error = GatewayError::Git(GitError::Timeout {
            command: "git fetch origin".to_string(),
            seconds: 30,
        });
        assert!(ErrorTranslator::translate(&error).unwrap().contains("credentials"));
    }

    #[test]
    fn test_no_hint_for_validation() {
        let error = GatewayError::Validation(ValidationError::NoFiles);
        assert_eq!(ErrorTranslator::translate(&error), None);
    }

    #[test]
    fn test_translate_unknown_error() {
        assert_eq!(
            ErrorTranslator::translate(&subprocess("Some unknown error message")),
            None
        );
    }
}
