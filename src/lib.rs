pub mod audit;
pub mod config;
pub mod error;
pub mod error_translation;
pub mod gateway;
pub mod git;
pub mod security;
pub mod server;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::{AppError, GatewayError, GitError};
pub use gateway::{Envelope, Gateway, GatewaySettings};
pub use git::{GitExecutor, GitVersion, Repository};
