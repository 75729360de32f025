pub mod config;
pub mod enums;
pub mod issue;
pub mod task;

// Re-export commonly used types for convenience
pub use config::{AsanaConfig, Credentials, GitLabConfig, HttpConfig, MirrorConfig};
pub use enums::{IssueState, LogFormat};
pub use issue::{IssueMetadata, IssueSnapshot, TrackerComment};
pub use task::{
    ChildTask, CustomFieldValue, MirrorComment, NewChildTask, OwningTask, StoryComment, TaskSummary,
};
