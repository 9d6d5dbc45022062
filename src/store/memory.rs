//! Non-persistent store over an owned snapshot.

use std::sync::{Mutex, MutexGuard};

use super::{Backend, TaskStore};
use crate::error::{DepsError, Result};
use crate::model::{self, Task};
use crate::task_id::TaskId;

#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
        }
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Task>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TaskStore for MemoryStore {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    fn list_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.guard().clone())
    }

    fn id_exists(&self, id: &TaskId) -> Result<bool> {
        Ok(model::flatten(&self.guard()).iter().any(|t| &t.id == id))
    }

    fn remove_dependency_edge(&self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()> {
        let mut tasks = self.guard();
        let task = model::find_mut(&mut tasks, task_id)
            .ok_or_else(|| DepsError::TaskNotFound(task_id.clone()))?;

        let before = task.dependencies.len();
        task.dependencies.retain(|dep| dep != dependency_id);
        if task.dependencies.len() == before {
            return Err(DepsError::DependencyNotFound(
                task_id.clone(),
                dependency_id.clone(),
            ));
        }
        Ok(())
    }

    fn add_dependency_edge(&self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()> {
        let mut tasks = self.guard();
        let task = model::find_mut(&mut tasks, task_id)
            .ok_or_else(|| DepsError::TaskNotFound(task_id.clone()))?;

        if task.depends_on(dependency_id) {
            return Err(DepsError::DependencyExists(
                task_id.clone(),
                dependency_id.clone(),
            ));
        }
        task.dependencies.push(dependency_id.clone());
        Ok(())
    }
}
