pub mod executor;
pub mod parser;
pub mod repository;
pub mod version;

// Re-export commonly used types
pub use executor::{CommandOutput, GitCommand, GitExecutor, GitRunner, Identity};
pub use parser::{BranchEntry, CommitEntry};
pub use repository::Repository;
pub use version::GitVersion;
