pub mod comments;
pub mod lifecycle;

pub use comments::{
    apply_comment_plan, extract_mirror_comments, plan_comment_sync, CommentPlan, CommentSyncStats,
};
pub use lifecycle::{apply_lifecycle, plan_lifecycle, LifecycleAction};
