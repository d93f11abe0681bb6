pub mod settings;

pub use settings::{
    AuditConfig, BehaviorConfig, CloneConfig, Config, ConfigError, DisplayConfig, GitConfig,
    IdentityConfig, RepositoryConfig, ServerConfig,
};
