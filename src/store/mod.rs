pub mod files;
pub mod jira;
pub mod lock;
pub mod memory;

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{DepsError, Result};
use crate::model::Task;
use crate::task_id::TaskId;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Local,
    Jira,
    /// Scratch copy of a snapshot; never selected by configuration.
    #[serde(skip)]
    #[value(skip)]
    Memory,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Jira => write!(f, "jira"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Read and mutate access to a task collection.
///
/// Implementations own persistence; callers only ever remove or add single
/// dependency edges through this interface.
pub trait TaskStore {
    fn backend(&self) -> Backend;

    /// All tasks in stable creation order, subtasks nested under their parent.
    fn list_tasks(&self) -> Result<Vec<Task>>;

    fn id_exists(&self, id: &TaskId) -> Result<bool>;

    /// Remove every `task_id -> dependency_id` edge.
    fn remove_dependency_edge(&self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()>;

    fn add_dependency_edge(&self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()>;
}

/// Open the store selected by the project configuration.
pub fn open(repo_root: &Path) -> Result<Box<dyn TaskStore>> {
    let config = Config::load(repo_root)?;
    open_with(repo_root, &config)
}

pub fn open_with(repo_root: &Path, config: &Config) -> Result<Box<dyn TaskStore>> {
    debug!(backend = %config.backend, "opening task store");
    match config.backend {
        Backend::Local => Ok(Box::new(files::FileStore::open(repo_root, config)?)),
        Backend::Jira => Ok(Box::new(jira::JiraStore::from_config(config)?)),
        Backend::Memory => Err(DepsError::Config(
            "the memory backend cannot be selected in config.json".into(),
        )),
    }
}
