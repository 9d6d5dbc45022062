//! Next-task selection.
//!
//! A top-level task is eligible when it is `pending` and every dependency
//! resolves to a task or subtask that is `done` or `completed`. Eligible
//! tasks are ranked by priority, then by snapshot order.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::model::{Status, Task, flatten};
use crate::task_id::TaskId;

fn status_index(tasks: &[Task]) -> HashMap<&TaskId, Status> {
    let mut index = HashMap::new();
    for task in flatten(tasks) {
        index.entry(&task.id).or_insert(task.status);
    }
    index
}

fn is_eligible(task: &Task, statuses: &HashMap<&TaskId, Status>) -> bool {
    task.status == Status::Pending
        && task
            .dependencies
            .iter()
            .all(|dep| statuses.get(dep).is_some_and(|status| status.is_satisfied()))
}

/// All eligible top-level tasks, best first.
pub fn eligible(tasks: &[Task]) -> Vec<&Task> {
    let statuses = status_index(tasks);
    let mut ready: Vec<&Task> = tasks
        .iter()
        .filter(|task| is_eligible(task, &statuses))
        .collect();
    // Stable sort keeps snapshot order among equal priorities.
    ready.sort_by_key(|task| Reverse(task.priority));
    ready
}

pub fn select_next(tasks: &[Task]) -> Option<&Task> {
    eligible(tasks).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    fn task(id: u64, status: Status, priority: Priority, deps: &[u64]) -> Task {
        Task::new(id, format!("Task {id}"))
            .with_status(status)
            .with_priority(priority)
            .with_dependencies(deps.iter().map(|d| TaskId::Task(*d)))
    }

    #[test]
    fn satisfied_high_priority_beats_free_medium() {
        let tasks = vec![
            task(1, Status::Done, Priority::Medium, &[]),
            task(2, Status::Pending, Priority::High, &[1]),
            task(3, Status::Pending, Priority::Medium, &[]),
        ];
        assert_eq!(select_next(&tasks).unwrap().id, TaskId::Task(2));
    }

    #[test]
    fn equal_priority_falls_back_to_snapshot_order() {
        let tasks = vec![
            task(5, Status::Pending, Priority::Low, &[]),
            task(4, Status::Pending, Priority::Medium, &[]),
            task(3, Status::Pending, Priority::Medium, &[]),
        ];
        let order: Vec<TaskId> = eligible(&tasks).iter().map(|t| t.id.clone()).collect();
        assert_eq!(order, vec![TaskId::Task(4), TaskId::Task(3), TaskId::Task(5)]);
    }

    #[test]
    fn none_when_every_pending_task_is_blocked() {
        let tasks = vec![
            task(1, Status::InProgress, Priority::High, &[]),
            task(2, Status::Pending, Priority::High, &[1]),
            task(3, Status::Pending, Priority::Low, &[2]),
        ];
        assert!(select_next(&tasks).is_none());
    }

    #[test]
    fn non_pending_statuses_are_never_selected() {
        let tasks: Vec<Task> = [
            Status::InProgress,
            Status::Done,
            Status::Completed,
            Status::Blocked,
            Status::Deferred,
            Status::Cancelled,
            Status::Review,
        ]
        .into_iter()
        .enumerate()
        .map(|(i, status)| task(i as u64 + 1, status, Priority::High, &[]))
        .collect();
        assert!(select_next(&tasks).is_none());
    }

    #[test]
    fn completed_counts_as_satisfied_but_cancelled_does_not() {
        let tasks = vec![
            task(1, Status::Completed, Priority::Medium, &[]),
            task(2, Status::Cancelled, Priority::Medium, &[]),
            task(3, Status::Pending, Priority::Medium, &[2]),
            task(4, Status::Pending, Priority::Low, &[1]),
        ];
        assert_eq!(select_next(&tasks).unwrap().id, TaskId::Task(4));
    }

    #[test]
    fn unknown_dependency_blocks_selection() {
        let tasks = vec![task(1, Status::Pending, Priority::High, &[99])];
        assert!(select_next(&tasks).is_none());
    }

    #[test]
    fn dependency_on_done_subtask_is_satisfied() {
        let tasks = vec![
            task(1, Status::InProgress, Priority::Medium, &[]).with_subtasks(vec![
                Task::new(TaskId::subtask(1, 1), "sub").with_status(Status::Done),
            ]),
            Task::new(2_u64, "after sub").with_dependencies([TaskId::subtask(1, 1)]),
        ];
        assert_eq!(select_next(&tasks).unwrap().id, TaskId::Task(2));
    }

    #[test]
    fn empty_snapshot_selects_nothing() {
        assert!(select_next(&[]).is_none());
    }
}
