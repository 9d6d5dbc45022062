//! Property-based tests for the validator and repair pass.
//!
//! - A graph built only from earlier-to-later edges validates clean
//! - One repair pass leaves any graph clean
//! - A second repair pass removes nothing

use proptest::prelude::*;
use taskdeps::graph::repair::{fix, repair_store};
use taskdeps::graph::validate::{ViolationKind, validate};
use taskdeps::model::{Status, Task};
use taskdeps::next::select_next;
use taskdeps::store::memory::MemoryStore;
use taskdeps::task_id::TaskId;

fn build_tasks(deps: &[Vec<u64>]) -> Vec<Task> {
    deps.iter()
        .enumerate()
        .map(|(i, deps)| {
            let id = i as u64 + 1;
            Task::new(id, format!("Task {id}")).with_dependencies(deps.iter().map(|d| TaskId::Task(*d)))
        })
        .collect()
}

/// Dependency lists where task `i + 1` may only depend on tasks `1..=i`.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<u64>>> {
    (1..=max_tasks).prop_flat_map(|count| {
        (0..count)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    proptest::collection::vec(1..=i as u64, 0..=i.min(3)).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

/// Unrestricted dependency lists: self edges, cycles, duplicates and ids
/// past the end of the snapshot all show up.
fn graph_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<u64>>> {
    (1..=max_tasks).prop_flat_map(|count| {
        proptest::collection::vec(
            proptest::collection::vec(1..=count as u64 + 2, 0..=4),
            count,
        )
    })
}

proptest! {
    #[test]
    fn acyclic_graphs_validate_clean(deps in dag_strategy(15)) {
        let tasks = build_tasks(&deps);
        let violations = validate(&tasks);
        prop_assert!(violations.is_empty(), "unexpected violations: {:?}", violations);
    }

    #[test]
    fn one_repair_pass_leaves_graph_valid(deps in graph_strategy(10)) {
        let tasks = build_tasks(&deps);
        let store = MemoryStore::new(tasks.clone());

        let result = fix(&store, &tasks, None);
        prop_assert_eq!(result.unfixable, 0);
        prop_assert_eq!(result.total_removed, validate(&tasks).len());

        let repaired = store.into_tasks();
        let left = validate(&repaired);
        prop_assert!(left.is_empty(), "violations after repair: {:?}", left);
    }

    #[test]
    fn second_repair_pass_is_a_no_op(deps in graph_strategy(10)) {
        let store = MemoryStore::new(build_tasks(&deps));

        repair_store(&store).unwrap();
        let second = repair_store(&store).unwrap();
        prop_assert!(second.is_noop(), "second pass changed the store: {:?}", second);
    }

    #[test]
    fn repair_never_touches_valid_edges(deps in dag_strategy(12)) {
        let tasks = build_tasks(&deps);
        let store = MemoryStore::new(tasks.clone());

        let result = fix(&store, &tasks, None);
        prop_assert!(result.is_noop());
        prop_assert_eq!(store.into_tasks(), tasks);
    }

    #[test]
    fn selected_task_has_satisfied_dependencies(
        deps in dag_strategy(12),
        done in proptest::collection::vec(any::<bool>(), 12),
    ) {
        let tasks: Vec<Task> = build_tasks(&deps)
            .into_iter()
            .zip(done)
            .map(|(task, done)| if done { task.with_status(Status::Done) } else { task })
            .collect();

        if let Some(next) = select_next(&tasks) {
            prop_assert_eq!(next.status, Status::Pending);
            for dep in &next.dependencies {
                let dep_task = tasks.iter().find(|t| &t.id == dep).unwrap();
                prop_assert!(dep_task.status.is_satisfied());
            }
        } else {
            // Nothing selectable means every pending task waits on a pending one.
            for task in tasks.iter().filter(|t| t.status == Status::Pending) {
                prop_assert!(!task.dependencies.is_empty());
            }
        }
    }
}

#[test]
fn circular_kinds_only_come_from_cycles() {
    let tasks = build_tasks(&[vec![2], vec![3], vec![1]]);
    let kinds: Vec<ViolationKind> = validate(&tasks).iter().map(|v| v.kind).collect();
    assert_eq!(kinds, vec![ViolationKind::Circular]);
}
