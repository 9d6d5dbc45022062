use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::task_id::TaskId;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Pending,
    #[serde(alias = "in_progress")]
    InProgress,
    Done,
    Completed,
    Blocked,
    Deferred,
    Cancelled,
    Review,
}

impl Status {
    /// Statuses that release the tasks depending on this one.
    pub fn is_satisfied(self) -> bool {
        matches!(self, Self::Done | Self::Completed)
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TaskId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Task>,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Done => write!(f, "done"),
            Self::Completed => write!(f, "completed"),
            Self::Blocked => write!(f, "blocked"),
            Self::Deferred => write!(f, "deferred"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Review => write!(f, "review"),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl Task {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: Status::Pending,
            priority: Priority::Medium,
            dependencies: Vec::new(),
            subtasks: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_dependencies<I>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = TaskId>,
    {
        self.dependencies = deps.into_iter().collect();
        self
    }

    pub fn with_subtasks(mut self, subtasks: Vec<Task>) -> Self {
        self.subtasks = subtasks;
        self
    }

    /// True when `dependency` appears at least once in the dependency list.
    pub fn depends_on(&self, dependency: &TaskId) -> bool {
        self.dependencies.iter().any(|d| d == dependency)
    }
}

/// Every task and subtask in pre-order: a parent, then its subtasks, then the
/// next top-level task. Creation order is preserved at every level.
pub fn flatten(tasks: &[Task]) -> Vec<&Task> {
    fn walk<'a>(tasks: &'a [Task], out: &mut Vec<&'a Task>) {
        for task in tasks {
            out.push(task);
            walk(&task.subtasks, out);
        }
    }

    let mut out = Vec::with_capacity(tasks.len());
    walk(tasks, &mut out);
    out
}

/// Mutable lookup of a task or nested subtask by id.
pub fn find_mut<'a>(tasks: &'a mut [Task], id: &TaskId) -> Option<&'a mut Task> {
    for task in tasks.iter_mut() {
        if &task.id == id {
            return Some(task);
        }
        if let Some(found) = find_mut(&mut task.subtasks, id) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_round_trips_json() {
        let task = Task::new(1_u64, "Test task")
            .with_priority(Priority::High)
            .with_dependencies([TaskId::Task(2), TaskId::subtask(3, 1)])
            .with_subtasks(vec![Task::new(TaskId::subtask(1, 1), "child")]);

        let json = serde_json::to_string_pretty(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(task, parsed);
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, r#""in-progress""#);
        let parsed: Status = serde_json::from_str(r#""in_progress""#).unwrap();
        assert_eq!(parsed, Status::InProgress);
    }

    #[test]
    fn only_done_and_completed_are_satisfied() {
        for status in [
            Status::Pending,
            Status::InProgress,
            Status::Blocked,
            Status::Deferred,
            Status::Cancelled,
            Status::Review,
        ] {
            assert!(!status.is_satisfied(), "{status} should not satisfy");
        }
        assert!(Status::Done.is_satisfied());
        assert!(Status::Completed.is_satisfied());
    }

    #[test]
    fn priority_defaults_to_medium_and_orders_high_first() {
        let task: Task = serde_json::from_str(r#"{"id": 1, "title": "t"}"#).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, Status::Pending);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn minimal_task_omits_optional_fields() {
        let json = serde_json::to_string(&Task::new(1_u64, "Minimal")).unwrap();
        assert!(!json.contains("description"));
        assert!(!json.contains("dependencies"));
        assert!(!json.contains("subtasks"));
    }

    #[test]
    fn flatten_is_pre_order() {
        let tasks = vec![
            Task::new(1_u64, "a").with_subtasks(vec![
                Task::new(TaskId::subtask(1, 1), "a.1"),
                Task::new(TaskId::subtask(1, 2), "a.2"),
            ]),
            Task::new(2_u64, "b"),
        ];
        let ids: Vec<String> = flatten(&tasks).iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids, vec!["1", "1.1", "1.2", "2"]);
    }

    #[test]
    fn find_mut_reaches_subtasks() {
        let mut tasks = vec![Task::new(1_u64, "a").with_subtasks(vec![Task::new(
            TaskId::subtask(1, 1),
            "a.1",
        )])];
        let sub = find_mut(&mut tasks, &TaskId::subtask(1, 1)).unwrap();
        sub.status = Status::Done;
        assert_eq!(tasks[0].subtasks[0].status, Status::Done);
        assert!(find_mut(&mut tasks, &TaskId::Task(9)).is_none());
    }
}
