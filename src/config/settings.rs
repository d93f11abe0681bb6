use crate::git::executor::Identity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Admin-page files copied into a fresh clone
pub const COMPANION_FILES: &[&str] = &[
    "git-manager.html",
    "git-api.php",
    "git-config.php",
    "git-clone.html",
    "git-reset-remote.html",
    "git-auth.html",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub repository: RepositoryConfig,
    pub identity: IdentityConfig,
    pub display: DisplayConfig,
    pub git: GitConfig,
    pub clone: CloneConfig,
    pub behavior: BehaviorConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Pinned working directory every action runs in
    pub path: PathBuf,
    /// Where clones land and folders are listed; parent of `path` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_dir: Option<PathBuf>,
    pub trust_directory: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct IdentityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub max_history_items: usize,
    pub max_file_log_items: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GitConfig {
    pub timeout_seconds: u64,
    pub clone_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CloneConfig {
    pub copy_companions: bool,
    /// Directory the companion files are copied from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companion_source: Option<PathBuf>,
    pub companion_files: Vec<String>,
    pub default_subfolder: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BehaviorConfig {
    pub log_commands: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AuditConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            parent_dir: None,
            trust_directory: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_history_items: 20,
            max_file_log_items: 10,
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            clone_timeout_seconds: 600,
        }
    }
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            copy_companions: true,
            companion_source: None,
            companion_files: COMPANION_FILES.iter().map(|f| f.to_string()).collect(),
            default_subfolder: "admin".to_string(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self { log_commands: true }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("git-gateway"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Ok(path) => Self::load_from(path),
            Err(ConfigError::DirectoryNotFound) => Ok(Self::default_config()),
            Err(e) => Err(e),
        }
    }

    /// Load configuration from a file; a missing file yields the defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default_config());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        // Validate config
        config.validate()?;

        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.max_history_items == 0 {
            return Err(ConfigError::InvalidValue(
                "max_history_items must be greater than 0".to_string(),
            ));
        }

        if self.display.max_file_log_items == 0 {
            return Err(ConfigError::InvalidValue(
                "max_file_log_items must be greater than 0".to_string(),
            ));
        }

        // Validate git timeouts
        if self.git.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.git.clone_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "clone_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.repository.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(
                "repository.path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory clones are created in and folders are listed from
    pub fn parent_dir(&self) -> PathBuf {
        if let Some(dir) = &self.repository.parent_dir {
            return dir.clone();
        }

        match self.repository.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => self.repository.path.join(".."),
        }
    }

    /// Identity applied to every invocation; blank values count as unset
    pub fn identity(&self) -> Identity {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Identity {
            user_name: non_blank(&self.identity.user_name),
            user_email: non_blank(&self.identity.user_email),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.git.timeout_seconds)
    }

    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.git.clone_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8765);
        assert_eq!(config.display.max_history_items, 20);
        assert_eq!(config.display.max_file_log_items, 10);
        assert_eq!(config.git.clone_timeout_seconds, 600);
        assert_eq!(config.clone.companion_files.len(), 6);
        assert_eq!(config.clone.default_subfolder, "admin");
        assert!(config.repository.trust_directory);
        assert!(config.behavior.log_commands);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_history_limit() {
        let mut config = Config::default_config();
        config.display.max_history_items = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeouts() {
        let mut config = Config::default_config();
        config.git.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default_config();
        config.git.clone_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_port_zero_allowed() {
        let mut config = Config::default_config();
        config.server.port = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(temp.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8765);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[repository]
path = "/srv/site"

[identity]
user_name = "Deploy Bot"

[display]
max_history_items = 50
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.repository.path, PathBuf::from("/srv/site"));
        assert_eq!(config.display.max_history_items, 50);
        assert_eq!(config.display.max_file_log_items, 10);
        assert_eq!(config.git.timeout_seconds, 30);
        assert_eq!(config.parent_dir(), PathBuf::from("/srv"));
        assert_eq!(config.identity().user_name.as_deref(), Some("Deploy Bot"));
        assert_eq!(config.identity().user_email, None);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[display]\nmax_file_log_items = 0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue(_))
        ));

        fs::write(&path, "[server\nport = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_parent_dir_override() {
        let mut config = Config::default_config();
        config.repository.path = PathBuf::from("/var/www/site");
        assert_eq!(config.parent_dir(), PathBuf::from("/var/www"));

        config.repository.parent_dir = Some(PathBuf::from("/data/clones"));
        assert_eq!(config.parent_dir(), PathBuf::from("/data/clones"));
    }

    #[test]
    fn test_blank_identity_is_unset() {
        let mut config = Config::default_config();
        config.identity.user_name = Some("   ".to_string());
        config.identity.user_email = Some("ops@example.com".to_string());

        let identity = config.identity();
        assert_eq!(identity.user_name, None);
        assert_eq!(identity.user_email.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config::default_config();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(config.server.port, parsed.server.port);
        assert_eq!(config.clone.companion_files, parsed.clone.companion_files);
    }
}
