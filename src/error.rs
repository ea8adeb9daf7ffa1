use thiserror::Error;

use crate::task_id::TaskId;

#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("not a trellis workspace (run `trellis init` first)")]
    NotInitialized,

    #[error("trellis already initialized in this directory")]
    AlreadyInitialized,

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("task {0} already exists")]
    TaskExists(TaskId),

    #[error("invalid task id '{0}': {1}")]
    InvalidTaskId(String, String),

    #[error("malformed content for task {0}: {1}")]
    MalformedContent(String, String),

    #[error("task storage unreadable at {0}: {1}")]
    StorageAccess(String, String),

    #[error("unknown status '{0}' (configured statuses: {1})")]
    UnknownStatus(String, String),

    #[error("cannot mint a task id {0}: {1}")]
    IdMintFailed(String, String),

    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    #[error("dependency cycle: task {0} would depend on itself (directly or transitively)")]
    CycleDetected(TaskId),

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("field '{0}' is managed by trellis and cannot be set directly")]
    ReservedField(String),

    #[error("invalid field '{0}': expected key=value")]
    InvalidField(String),

    #[error("task {0} has children ({1}); pass --recursive to delete the subtree")]
    HasChildren(TaskId, String),

    #[error("target parent {0} is not a top-level task")]
    NotTopLevel(TaskId),

    #[error("task {0} has children ({1}); moving a subtree is unsupported")]
    MoveSubtree(TaskId, String),

    #[error("task {0} cannot be its own parent")]
    SelfParent(TaskId),

    #[error("{original}; rollback failed: {rollback}; the stores may disagree, run `trellis check`")]
    RollbackFailed {
        original: Box<TrellisError>,
        rollback: Box<TrellisError>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrellisError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::TaskNotFound(_) => "not_found",
            Self::TaskExists(_) => "already_exists",
            Self::InvalidTaskId(_, _) | Self::MalformedContent(_, _) | Self::Json(_) => {
                "format_error"
            }
            Self::StorageAccess(_, _) => "access_error",
            Self::UnknownStatus(_, _)
            | Self::IdMintFailed(_, _)
            | Self::SelfDependency(_)
            | Self::CycleDetected(_)
            | Self::EmptyTitle
            | Self::ReservedField(_)
            | Self::InvalidField(_)
            | Self::HasChildren(_, _)
            | Self::NotTopLevel(_)
            | Self::MoveSubtree(_, _)
            | Self::SelfParent(_) => "validation_error",
            // A failed rollback never masks the triggering error.
            Self::RollbackFailed { original, .. } => original.code(),
            Self::Io(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, TrellisError>;
