#![allow(dead_code)]

use async_trait::async_trait;
use git_gateway::config::Config;
use git_gateway::error::GitResult;
use git_gateway::git::{CommandOutput, GitCommand, GitExecutor, GitRunner, Identity};
use git_gateway::{Gateway, GatewaySettings, Repository};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Run git in `dir`, asserting it succeeds
pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Helper to create a test git repository inside a parent folder
///
/// Returns the temp root (the parent) and the repository path `<root>/site`.
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().join("site");
    fs::create_dir(&repo_path).unwrap();

    git(&repo_path, &["init", "-b", "main"]);
    git(&repo_path, &["config", "user.name", "Test User"]);
    git(&repo_path, &["config", "user.email", "test@example.com"]);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "-m", message]);
}

/// Bare repository next to the working one, registered as `origin`
pub fn create_bare_remote(root: &Path, repo_path: &Path) -> PathBuf {
    let remote = root.join("remote.git");
    git(root, &["init", "--bare", "-b", "main", "remote.git"]);
    git(
        repo_path,
        &["remote", "add", "origin", remote.to_str().unwrap()],
    );
    remote
}

pub fn settings_for(repo_path: &Path) -> GatewaySettings {
    let mut config = Config::default_config();
    config.repository.path = repo_path.to_path_buf();
    config.identity.user_name = Some("Gateway Bot".to_string());
    config.identity.user_email = Some("bot@example.com".to_string());
    GatewaySettings::from_config(&config)
}

/// Gateway over a real git executor pinned to `repo_path`
pub fn gateway_for(repo_path: &Path) -> Gateway {
    let settings = settings_for(repo_path);
    let executor = GitExecutor::new(repo_path).with_identity(settings.identity.clone());
    Gateway::new(Repository::new(Arc::new(executor)), settings)
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: 0,
        success: true,
    }
}

pub fn fail(stderr: &str) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code: 1,
        success: false,
    }
}

/// Runner that records every command and answers from a script
///
/// Commands whose arguments start with a scripted prefix get that output;
/// everything else succeeds with empty output.
pub struct ScriptedRunner {
    root: TempDir,
    repo_path: PathBuf,
    script: Vec<(Vec<String>, CommandOutput)>,
    calls: Mutex<Vec<GitCommand>>,
}

impl ScriptedRunner {
    /// Pinned directory that looks like a repository
    pub fn new() -> Self {
        let runner = Self::uninitialized();
        fs::create_dir(runner.repo_path.join(".git")).unwrap();
        runner
    }

    /// Pinned directory without `.git`
    pub fn uninitialized() -> Self {
        let root = TempDir::new().unwrap();
        let repo_path = root.path().join("site");
        fs::create_dir(&repo_path).unwrap();

        Self {
            root,
            repo_path,
            script: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, prefix: &[&str], output: CommandOutput) -> Self {
        let prefix = prefix.iter().map(|arg| arg.to_string()).collect();
        self.script.push((prefix, output));
        self
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|command| command.args.clone())
            .collect()
    }

    /// Whether any recorded command starts with `prefix`
    pub fn ran(&self, prefix: &[&str]) -> bool {
        self.calls().iter().any(|args| starts_with(args, prefix))
    }

    pub fn count(&self, prefix: &[&str]) -> usize {
        self.calls()
            .iter()
            .filter(|args| starts_with(args, prefix))
            .count()
    }
}

fn starts_with(args: &[String], prefix: &[&str]) -> bool {
    args.len() >= prefix.len() && args.iter().zip(prefix).all(|(arg, p)| arg == p)
}

#[async_trait]
impl GitRunner for ScriptedRunner {
    fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    async fn run(&self, command: &GitCommand) -> GitResult<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());

        let scripted = self.script.iter().find(|(prefix, _)| {
            let prefix: Vec<&str> = prefix.iter().map(String::as_str).collect();
            starts_with(&command.args, &prefix)
        });

        Ok(scripted
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| ok("")))
    }
}

/// Gateway over a scripted runner; the runner is returned for inspection
pub fn scripted_gateway(runner: ScriptedRunner) -> (Arc<ScriptedRunner>, Gateway) {
    let runner = Arc::new(runner);
    let mut settings = settings_for(runner.repo_path());
    settings.identity = Identity::default();

    let repo = Repository::new(runner.clone());
    (runner, Gateway::new(repo, settings))
}

/// Trimmed stdout of a git command run in `dir`
pub fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
