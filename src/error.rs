use thiserror::Error;

use crate::task_id::TaskId;

#[derive(Debug, Error)]
pub enum DepsError {
    #[error("not a taskdeps project (run `taskdeps init` first)")]
    NotInitialized,

    #[error("taskdeps already initialized in this directory")]
    AlreadyInitialized,

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("task {0} does not depend on {1}")]
    DependencyNotFound(TaskId, TaskId),

    #[error("task {0} already depends on {1}")]
    DependencyExists(TaskId, TaskId),

    #[error("dependency cycle: making {0} depend on {1} would close a cycle")]
    CycleDetected(TaskId, TaskId),

    #[error("invalid task id '{0}': {1}")]
    InvalidTaskId(String, String),

    #[error("task store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("remote tracker returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("locked by another process: {0}")]
    Locked(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DepsError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::TaskNotFound(_) => "task_not_found",
            Self::DependencyNotFound(_, _) => "dependency_not_found",
            Self::DependencyExists(_, _) => "dependency_exists",
            Self::CycleDetected(_, _) => "cycle_detected",
            Self::InvalidTaskId(_, _) => "invalid_task_id",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Remote { .. } => "remote_error",
            Self::Config(_) => "config_error",
            Self::Locked(_) => "locked",
            Self::Logging(_) => "logging_error",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Http(_) => "http_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, DepsError>;
