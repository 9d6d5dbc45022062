//! Best-effort repair of dependency violations.
//!
//! Every violation maps to exactly one edge removal issued through the
//! [`TaskStore`]. Removals run one at a time; a failed removal is recorded
//! as unfixable and the pass continues. Nothing is rolled back.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::validate::{Violation, ViolationKind, validate};
use crate::error::Result;
use crate::model::Task;
use crate::store::TaskStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairFailure {
    pub violation: Violation,
    pub code: &'static str,
    pub reason: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairResult {
    pub self_removed: usize,
    pub missing_removed: usize,
    pub circular_removed: usize,
    pub unfixable: usize,
    pub total_removed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RepairFailure>,
}

impl RepairResult {
    /// True when the pass neither removed anything nor hit a failure.
    pub fn is_noop(&self) -> bool {
        self.total_removed == 0 && self.unfixable == 0
    }

    fn record_removed(&mut self, kind: ViolationKind) {
        match kind {
            ViolationKind::SelfReference => self.self_removed += 1,
            ViolationKind::Missing => self.missing_removed += 1,
            ViolationKind::Circular => self.circular_removed += 1,
        }
        self.total_removed += 1;
    }
}

/// Self edges first, then dangling edges, then one edge per cycle. Identical
/// violations are applied once.
fn repair_order(violations: Vec<Violation>) -> Vec<Violation> {
    let mut seen = HashSet::new();
    let mut ordered: Vec<Violation> = violations
        .into_iter()
        .filter(|v| seen.insert((v.kind, v.task_id.clone(), v.dependency_id.clone())))
        .collect();
    ordered.sort_by_key(|v| v.kind);
    ordered
}

/// Repair `violations` (or the validator's findings on `tasks` when `None`).
pub fn fix(
    store: &dyn TaskStore,
    tasks: &[Task],
    violations: Option<Vec<Violation>>,
) -> RepairResult {
    let violations = violations.unwrap_or_else(|| validate(tasks));
    let mut result = RepairResult::default();

    for violation in repair_order(violations) {
        let (task_id, dependency_id) = violation.edge();
        match store.remove_dependency_edge(task_id, dependency_id) {
            Ok(()) => {
                debug!(
                    kind = %violation.kind,
                    task = %task_id,
                    dependency = %dependency_id,
                    "removed dependency edge"
                );
                result.record_removed(violation.kind);
            }
            Err(err) => {
                warn!(
                    kind = %violation.kind,
                    task = %task_id,
                    dependency = %dependency_id,
                    error = %err,
                    "could not remove dependency edge"
                );
                result.unfixable += 1;
                result.failures.push(RepairFailure {
                    code: err.code(),
                    reason: err.to_string(),
                    violation,
                });
            }
        }
    }

    info!(
        backend = %store.backend(),
        removed = result.total_removed,
        unfixable = result.unfixable,
        "dependency repair finished"
    );
    result
}

/// Read a fresh snapshot from `store` and repair it.
///
/// A failed snapshot read aborts the pass before any mutation.
pub fn repair_store(store: &dyn TaskStore) -> Result<RepairResult> {
    let tasks = store.list_tasks()?;
    Ok(fix(store, &tasks, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DepsError;
    use crate::store::Backend;
    use crate::store::memory::MemoryStore;
    use crate::task_id::TaskId;
    use std::cell::RefCell;

    fn task(id: u64, deps: &[u64]) -> Task {
        Task::new(id, format!("Task {id}")).with_dependencies(deps.iter().map(|d| TaskId::Task(*d)))
    }

    /// Store wrapper that refuses removals for selected tasks and logs calls.
    struct FlakyStore {
        inner: MemoryStore,
        refuse: Vec<TaskId>,
        calls: RefCell<Vec<(TaskId, TaskId)>>,
    }

    impl FlakyStore {
        fn new(tasks: Vec<Task>, refuse: Vec<TaskId>) -> Self {
            Self {
                inner: MemoryStore::new(tasks),
                refuse,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl TaskStore for FlakyStore {
        fn backend(&self) -> Backend {
            Backend::Memory
        }

        fn list_tasks(&self) -> Result<Vec<Task>> {
            self.inner.list_tasks()
        }

        fn id_exists(&self, id: &TaskId) -> Result<bool> {
            self.inner.id_exists(id)
        }

        fn remove_dependency_edge(&self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()> {
            self.calls
                .borrow_mut()
                .push((task_id.clone(), dependency_id.clone()));
            if self.refuse.contains(task_id) {
                return Err(DepsError::StoreUnavailable("tracker offline".into()));
            }
            self.inner.remove_dependency_edge(task_id, dependency_id)
        }

        fn add_dependency_edge(&self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()> {
            self.inner.add_dependency_edge(task_id, dependency_id)
        }
    }

    struct UnreadableStore;

    impl TaskStore for UnreadableStore {
        fn backend(&self) -> Backend {
            Backend::Memory
        }

        fn list_tasks(&self) -> Result<Vec<Task>> {
            Err(DepsError::StoreUnavailable("no credentials".into()))
        }

        fn id_exists(&self, _id: &TaskId) -> Result<bool> {
            Ok(false)
        }

        fn remove_dependency_edge(&self, _task_id: &TaskId, _dependency_id: &TaskId) -> Result<()> {
            panic!("repair must not mutate after a failed read");
        }

        fn add_dependency_edge(&self, _task_id: &TaskId, _dependency_id: &TaskId) -> Result<()> {
            unreachable!()
        }
    }

    #[test]
    fn removes_self_missing_and_one_cycle_edge() {
        let store = MemoryStore::new(vec![
            task(1, &[1, 2]),
            task(2, &[3]),
            task(3, &[2, 42]),
        ]);
        let result = repair_store(&store).unwrap();

        assert_eq!(result.self_removed, 1);
        assert_eq!(result.missing_removed, 1);
        assert_eq!(result.circular_removed, 1);
        assert_eq!(result.total_removed, 3);
        assert_eq!(result.unfixable, 0);

        let tasks = store.into_tasks();
        assert!(validate(&tasks).is_empty());
        assert_eq!(tasks[0].dependencies, vec![TaskId::Task(2)]);
    }

    #[test]
    fn missing_removal_keeps_valid_dependencies() {
        let store = MemoryStore::new(vec![task(1, &[]), task(2, &[1, 9, 1])]);
        repair_store(&store).unwrap();
        let tasks = store.into_tasks();
        assert_eq!(tasks[1].dependencies, vec![TaskId::Task(1), TaskId::Task(1)]);
    }

    #[test]
    fn second_pass_is_a_noop() {
        let store = MemoryStore::new(vec![task(1, &[2]), task(2, &[3]), task(3, &[1, 1, 5])]);
        let first = repair_store(&store).unwrap();
        assert!(!first.is_noop());

        let second = repair_store(&store).unwrap();
        assert_eq!(second, RepairResult::default());
    }

    #[test]
    fn applies_self_then_missing_then_circular() {
        let store = FlakyStore::new(vec![task(1, &[2]), task(2, &[1]), task(3, &[3, 8])], vec![]);
        let tasks = store.list_tasks().unwrap();
        fix(&store, &tasks, None);

        let calls = store.calls.borrow();
        assert_eq!(
            *calls,
            vec![
                (TaskId::Task(3), TaskId::Task(3)),
                (TaskId::Task(3), TaskId::Task(8)),
                (TaskId::Task(2), TaskId::Task(1)),
            ]
        );
    }

    #[test]
    fn failed_removal_is_counted_and_pass_continues() {
        let store = FlakyStore::new(
            vec![task(1, &[9]), task(2, &[8]), task(3, &[7])],
            vec![TaskId::Task(2)],
        );
        let tasks = store.list_tasks().unwrap();
        let result = fix(&store, &tasks, None);

        assert_eq!(result.missing_removed, 2);
        assert_eq!(result.unfixable, 1);
        assert_eq!(result.total_removed, 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].code, "store_unavailable");
        assert_eq!(result.failures[0].violation.task_id, TaskId::Task(2));
        assert_eq!(store.calls.borrow().len(), 3);

        // Applied removals stay applied.
        let after = store.list_tasks().unwrap();
        assert!(after[0].dependencies.is_empty());
        assert_eq!(after[1].dependencies, vec![TaskId::Task(8)]);
    }

    #[test]
    fn cycle_survives_only_when_its_removal_failed() {
        let store = FlakyStore::new(vec![task(1, &[2]), task(2, &[1])], vec![TaskId::Task(2)]);
        let result = repair_store(&store).unwrap();
        assert_eq!(result.unfixable, 1);

        let remaining = validate(&store.list_tasks().unwrap());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].kind, ViolationKind::Circular);
    }

    #[test]
    fn supplied_violations_are_used_and_deduplicated() {
        let store = FlakyStore::new(vec![task(1, &[5]), task(2, &[6])], vec![]);
        let tasks = store.list_tasks().unwrap();
        let only = Violation::missing(TaskId::Task(1), TaskId::Task(5));
        let result = fix(&store, &tasks, Some(vec![only.clone(), only]));

        assert_eq!(result.missing_removed, 1);
        assert_eq!(result.unfixable, 0);
        assert_eq!(store.calls.borrow().len(), 1);
    }

    #[test]
    fn unreadable_store_aborts_before_mutation() {
        let err = repair_store(&UnreadableStore).unwrap_err();
        assert!(matches!(err, DepsError::StoreUnavailable(_)));
    }

    #[test]
    fn result_serializes_camel_case_without_empty_failures() {
        let json = serde_json::to_value(RepairResult::default()).unwrap();
        assert_eq!(json["selfRemoved"], 0);
        assert_eq!(json["totalRemoved"], 0);
        assert!(json.get("failures").is_none());
    }
}
