use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::DependencyGraph;
use crate::model::Task;
use crate::task_id::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    #[serde(rename = "self")]
    SelfReference,
    Missing,
    Circular,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReference => write!(f, "self"),
            Self::Missing => write!(f, "missing"),
            Self::Circular => write!(f, "circular"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub task_id: TaskId,
    pub dependency_id: TaskId,
    pub message: String,
}

impl Violation {
    pub fn self_reference(task_id: TaskId) -> Self {
        Self {
            kind: ViolationKind::SelfReference,
            message: format!("Task {task_id} depends on itself"),
            dependency_id: task_id.clone(),
            task_id,
        }
    }

    pub fn missing(task_id: TaskId, dependency_id: TaskId) -> Self {
        Self {
            kind: ViolationKind::Missing,
            message: format!("Task {task_id} depends on non-existent task {dependency_id}"),
            task_id,
            dependency_id,
        }
    }

    pub fn circular(task_id: TaskId, dependency_id: TaskId) -> Self {
        Self {
            kind: ViolationKind::Circular,
            message: format!(
                "Task {task_id} depends on {dependency_id}, which closes a dependency cycle"
            ),
            task_id,
            dependency_id,
        }
    }

    /// The directed edge this violation is about.
    pub fn edge(&self) -> (&TaskId, &TaskId) {
        (&self.task_id, &self.dependency_id)
    }
}

/// Unordered pair of task ids; `(a, b)` and `(b, a)` share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey(TaskId, TaskId);

impl EdgeKey {
    pub fn new(a: &TaskId, b: &TaskId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Depth-first back-edge finder. Absent entries in `state` are unvisited.
struct CycleFinder<'a> {
    graph: &'a DependencyGraph,
    state: HashMap<&'a TaskId, Visit>,
    reported: HashSet<EdgeKey>,
    found: Vec<Violation>,
}

impl<'a> CycleFinder<'a> {
    fn new(graph: &'a DependencyGraph) -> Self {
        Self {
            graph,
            state: HashMap::with_capacity(graph.len()),
            reported: HashSet::new(),
            found: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Violation> {
        let graph = self.graph;
        for id in graph.ids() {
            if !self.state.contains_key(id) {
                self.visit(id);
            }
        }
        self.found
    }

    fn visit(&mut self, id: &'a TaskId) {
        let graph = self.graph;
        self.state.insert(id, Visit::InProgress);

        for dep in graph.dependencies(id) {
            // Self edges and dangling edges are classified by the first pass.
            if dep == id || !graph.contains(dep) {
                continue;
            }
            match self.state.get(dep).copied() {
                Some(Visit::InProgress) => self.report(id, dep),
                Some(Visit::Done) => {}
                None => self.visit(dep),
            }
        }

        self.state.insert(id, Visit::Done);
    }

    fn report(&mut self, from: &TaskId, to: &TaskId) {
        if self.reported.insert(EdgeKey::new(from, to)) {
            debug!(task = %from, dependency = %to, "circular dependency");
            self.found.push(Violation::circular(from.clone(), to.clone()));
        }
    }
}

/// Classify every structural defect in the dependency relation of `tasks`.
pub fn validate(tasks: &[Task]) -> Vec<Violation> {
    validate_graph(&DependencyGraph::from_tasks(tasks))
}

pub fn validate_graph(graph: &DependencyGraph) -> Vec<Violation> {
    let mut violations = Vec::new();

    for id in graph.ids() {
        for dep in graph.dependencies(id) {
            if dep == id {
                debug!(task = %id, "self dependency");
                violations.push(Violation::self_reference(id.clone()));
            } else if !graph.contains(dep) {
                debug!(task = %id, dependency = %dep, "missing dependency");
                violations.push(Violation::missing(id.clone(), dep.clone()));
            }
        }
    }

    violations.extend(CycleFinder::new(graph).run());

    info!(
        tasks = graph.len(),
        violations = violations.len(),
        "dependency validation finished"
    );
    violations
}
