use std::path::Path;

use tracing::info;

use super::show;
use crate::error::{DepsError, Result};
use crate::graph::DependencyGraph;
use crate::model::Task;
use crate::output::{self, Format};
use crate::store::{self, TaskStore};
use crate::task_id::TaskId;

/// Reject an edge that names an unknown task, already exists, or would close a cycle.
fn validate_dependency_plan(graph: &DependencyGraph, task: &TaskId, dependency: &TaskId) -> Result<()> {
    for id in [task, dependency] {
        if !graph.contains(id) {
            return Err(DepsError::TaskNotFound(id.clone()));
        }
    }
    if graph.dependencies(task).contains(dependency) {
        return Err(DepsError::DependencyExists(task.clone(), dependency.clone()));
    }
    if graph.would_cycle(task, dependency) {
        return Err(DepsError::CycleDetected(task.clone(), dependency.clone()));
    }
    Ok(())
}

pub fn add_dependency(store: &dyn TaskStore, task: &TaskId, dependency: &TaskId) -> Result<Task> {
    let tasks = store.list_tasks()?;
    let graph = DependencyGraph::from_tasks(&tasks);
    validate_dependency_plan(&graph, task, dependency)?;

    store.add_dependency_edge(task, dependency)?;
    info!(task = %task, dependency = %dependency, "added dependency");
    show::find(store, task)
}

pub fn remove_dependency(store: &dyn TaskStore, task: &TaskId, dependency: &TaskId) -> Result<Task> {
    store.remove_dependency_edge(task, dependency)?;
    info!(task = %task, dependency = %dependency, "removed dependency");
    show::find(store, task)
}

pub fn run_add(repo_root: &Path, task: &TaskId, dependency: &TaskId, format: Format) -> Result<()> {
    let store = store::open(repo_root)?;
    let updated = add_dependency(store.as_ref(), task, dependency)?;
    output::print_task(&updated, format)
}

pub fn run_remove(repo_root: &Path, task: &TaskId, dependency: &TaskId, format: Format) -> Result<()> {
    let store = store::open(repo_root)?;
    let updated = remove_dependency(store.as_ref(), task, dependency)?;
    output::print_task(&updated, format)
}
