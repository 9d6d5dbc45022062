use std::path::Path;

use crate::error::{DepsError, Result};
use crate::model::{Task, flatten};
use crate::output::{self, Format};
use crate::store::{self, TaskStore};
use crate::task_id::TaskId;

pub fn find(store: &dyn TaskStore, id: &TaskId) -> Result<Task> {
    let tasks = store.list_tasks()?;
    flatten(&tasks)
        .into_iter()
        .find(|t| &t.id == id)
        .cloned()
        .ok_or_else(|| DepsError::TaskNotFound(id.clone()))
}

pub fn run(repo_root: &Path, id: &TaskId, format: Format) -> Result<()> {
    let store = store::open(repo_root)?;
    let task = find(store.as_ref(), id)?;
    output::print_task(&task, format)
}
