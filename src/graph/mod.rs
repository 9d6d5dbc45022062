//! Adjacency view over a task snapshot.
//!
//! The graph keeps tasks in snapshot order (subtasks flattened right after
//! their parent) because that order is the tie-break used by validation
//! output and by the next-task selector.

pub mod repair;
pub mod validate;

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::model::{Task, flatten};
use crate::task_id::TaskId;

#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    order: Vec<TaskId>,
    edges: HashMap<TaskId, Vec<TaskId>>,
    known: HashSet<TaskId>,
}

fn dedup_preserving_order(deps: &[TaskId]) -> Vec<TaskId> {
    let mut seen = HashSet::with_capacity(deps.len());
    deps.iter()
        .filter(|dep| seen.insert(*dep))
        .cloned()
        .collect()
}

impl DependencyGraph {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut graph = Self::default();

        for task in flatten(tasks) {
            if !graph.known.insert(task.id.clone()) {
                warn!(task = %task.id, "duplicate task id in snapshot; keeping first occurrence");
                continue;
            }
            graph.order.push(task.id.clone());
            graph
                .edges
                .insert(task.id.clone(), dedup_preserving_order(&task.dependencies));
        }

        graph
    }

    /// Task ids in snapshot order.
    pub fn ids(&self) -> &[TaskId] {
        &self.order
    }

    /// Distinct dependency ids of `id`, in first-listed order.
    pub fn dependencies(&self, id: &TaskId) -> &[TaskId] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.known.contains(id)
    }

    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of tasks listing at least one dependency.
    pub fn with_dependencies(&self) -> usize {
        self.order
            .iter()
            .filter(|id| !self.dependencies(id).is_empty())
            .count()
    }

    /// True when `target` is reachable from `start` along dependency edges.
    pub fn has_path(&self, start: &TaskId, target: &TaskId) -> bool {
        let mut visited = HashSet::new();
        self.has_path_inner(start, target, &mut visited)
    }

    fn has_path_inner<'a>(
        &'a self,
        start: &'a TaskId,
        target: &TaskId,
        visited: &mut HashSet<&'a TaskId>,
    ) -> bool {
        if start == target {
            return true;
        }

        if !visited.insert(start) {
            return false;
        }

        self.dependencies(start)
            .iter()
            .any(|next| self.has_path_inner(next, target, visited))
    }

    /// Whether adding `task -> dependency` would introduce a self edge or a cycle.
    pub fn would_cycle(&self, task: &TaskId, dependency: &TaskId) -> bool {
        task == dependency || self.has_path(dependency, task)
    }
}
