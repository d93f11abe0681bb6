use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Every action name the gateway answers to
pub const ACTIONS: &[&str] = &[
    "checkRepo",
    "init",
    "clone",
    "listFolders",
    "listRemoteBranches",
    "resetRemote",
    "status",
    "repoInfo",
    "addRemote",
    "removeRemote",
    "log",
    "fileLog",
    "stageFiles",
    "unstageFiles",
    "commit",
    "commitAndPush",
    "push",
    "pull",
    "fetch",
    "checkout",
    "discardAll",
    "diff",
    "getGitignore",
    "addToGitignore",
    "removeFromGitignore",
    "removeFromRepo",
    "untrackFile",
    "branches",
    "switchBranch",
    "createBranch",
    "renameBranch",
    "deleteBranch",
    "mergeBranch",
    "pushBranch",
    "deleteRemoteBranch",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing action")]
    MissingAction,

    #[error("Unrecognized action: {0}")]
    UnknownAction(String),

    #[error("Invalid parameters for {action}: {message}")]
    InvalidParams {
        action: &'static str,
        message: String,
    },
}

/// A decoded request: the catalog name of the action and its typed fields
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub name: &'static str,
    pub action: Action,
}

impl Request {
    /// Decode a JSON body into a known action
    pub fn from_json(body: Value) -> Result<Self, RequestError> {
        let requested = body
            .get("action")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or(RequestError::MissingAction)?;

        let name = ACTIONS
            .iter()
            .copied()
            .find(|known| *known == requested)
            .ok_or_else(|| RequestError::UnknownAction(requested.to_string()))?;

        let action = serde_json::from_value(body).map_err(|e| RequestError::InvalidParams {
            action: name,
            message: e.to_string(),
        })?;

        Ok(Self { name, action })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    CheckRepo,
    Init,
    Clone(CloneParams),
    ListFolders,
    ListRemoteBranches,
    ResetRemote(ResetRemoteParams),
    Status,
    RepoInfo,
    AddRemote(UrlParams),
    RemoveRemote,
    Log,
    FileLog(FileParams),
    StageFiles(FilesParams),
    UnstageFiles(FilesParams),
    Commit(CommitParams),
    CommitAndPush(CommitParams),
    Push,
    Pull,
    Fetch,
    Checkout(CheckoutParams),
    DiscardAll,
    Diff(FileParams),
    GetGitignore,
    AddToGitignore(PatternParams),
    RemoveFromGitignore(PatternParams),
    RemoveFromRepo(FileParams),
    UntrackFile(FileParams),
    Branches,
    SwitchBranch(SwitchBranchParams),
    CreateBranch(CreateBranchParams),
    RenameBranch(RenameBranchParams),
    DeleteBranch(DeleteBranchParams),
    MergeBranch(BranchParams),
    PushBranch(BranchParams),
    DeleteRemoteBranch(BranchParams),
}

impl Action {
    /// Actions that make sense before the pinned directory is a repository
    pub fn is_repository_free(&self) -> bool {
        matches!(
            self,
            Action::CheckRepo | Action::Init | Action::Clone(_) | Action::ListFolders
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloneParams {
    pub url: Option<String>,
    pub target_dir: Option<String>,
    pub copy_git_manager: Option<bool>,
    pub subfolder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetRemoteParams {
    pub branch_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub delete_other_branches: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub branches_to_delete: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UrlParams {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileParams {
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilesParams {
    #[serde(deserialize_with = "null_as_default")]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommitParams {
    #[serde(deserialize_with = "null_as_default")]
    pub files: Vec<String>,
    pub message: Option<String>,
    /// Files are already staged, so an empty `files` list is fine
    #[serde(deserialize_with = "null_as_default")]
    pub has_staged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CheckoutParams {
    pub file: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PatternParams {
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BranchParams {
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SwitchBranchParams {
    pub branch: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub force: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateBranchParams {
    pub branch: Option<String>,
    pub checkout: Option<bool>,
    pub source_branch: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub orphan: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub fresh_start: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenameBranchParams {
    pub old_name: Option<String>,
    pub new_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeleteBranchParams {
    pub branch: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub force: bool,
}

/// Treat an explicit `null` like an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unit_action() {
        let request = Request::from_json(json!({"action": "status"})).unwrap();
        assert_eq!(request.name, "status");
        assert_eq!(request.action, Action::Status);
    }

    #[test]
    fn test_unit_action_ignores_extra_fields() {
        let request = Request::from_json(json!({"action": "pull", "force": true})).unwrap();
        assert_eq!(request.action, Action::Pull);
    }

    #[test]
    fn test_missing_action() {
        assert_eq!(
            Request::from_json(json!({"files": ["a.txt"]})),
            Err(RequestError::MissingAction)
        );
        assert_eq!(
            Request::from_json(json!({"action": ""})),
            Err(RequestError::MissingAction)
        );
        assert_eq!(
            Request::from_json(json!({"action": 42})),
            Err(RequestError::MissingAction)
        );
        assert_eq!(
            Request::from_json(json!(["status"])),
            Err(RequestError::MissingAction)
        );
    }

    #[test]
    fn test_unknown_action() {
        let err = Request::from_json(json!({"action": "rebase"})).unwrap_err();
        assert_eq!(err.to_string(), "Unrecognized action: rebase");
    }

    #[test]
    fn test_camel_case_fields() {
        let request = Request::from_json(json!({
            "action": "createBranch",
            "branch": "topic",
            "sourceBranch": "origin/main",
            "freshStart": true
        }))
        .unwrap();

        match request.action {
            Action::CreateBranch(params) => {
                assert_eq!(params.branch.as_deref(), Some("topic"));
                assert_eq!(params.source_branch.as_deref(), Some("origin/main"));
                assert!(params.fresh_start);
                assert!(!params.orphan);
                assert_eq!(params.checkout, None);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_nulls_read_as_defaults() {
        let request = Request::from_json(json!({
            "action": "commit",
            "files": null,
            "message": "fix",
            "hasStaged": null
        }))
        .unwrap();

        assert_eq!(
            request.action,
            Action::Commit(CommitParams {
                files: vec![],
                message: Some("fix".to_string()),
                has_staged: false,
            })
        );
    }

    #[test]
    fn test_wrong_field_type() {
        let err = Request::from_json(json!({"action": "stageFiles", "files": "a.txt"})).unwrap_err();
        assert!(matches!(
            err,
            RequestError::InvalidParams { action: "stageFiles", .. }
        ));
        assert!(err.to_string().starts_with("Invalid parameters for stageFiles:"));
    }

    #[test]
    fn test_every_catalog_name_decodes() {
        for name in ACTIONS {
            let request = Request::from_json(json!({ "action": name }));
            assert!(request.is_ok(), "action should decode with defaults: {}", name);
        }
    }

    #[test]
    fn test_repository_free_actions() {
        assert!(Action::CheckRepo.is_repository_free());
        assert!(Action::ListFolders.is_repository_free());
        assert!(Action::Clone(CloneParams::default()).is_repository_free());
        assert!(!Action::Status.is_repository_free());
        assert!(!Action::ResetRemote(ResetRemoteParams::default()).is_repository_free());
    }
}
