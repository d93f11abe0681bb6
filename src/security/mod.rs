pub mod validator;

pub use validator::{
    BranchPattern, ValidationError, is_valid_remote_url, sanitize_folder_name, sanitize_source_ref,
    validate_branch_name, validate_path, validate_paths, validate_pattern, validate_remote_arg,
    reject_protected,
};

/// Branches that can never be deleted through the gateway, locally or on the remote
pub const PROTECTED_BRANCHES: &[&str] = &["main", "master"];

/// Checkout sources accepted verbatim; anything else must match a `HEAD~N` or
/// commit-hash shape or is replaced by `HEAD`
pub const ALLOWED_SOURCE_REFS: &[&str] = &["HEAD", "origin/main", "origin/master"];
