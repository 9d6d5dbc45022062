use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::graph::repair::{fix, repair_store};
use crate::output::{self, Format};
use crate::report::RepairReport;
use crate::store::memory::MemoryStore;
use crate::store::{self, TaskStore};

/// Run the repair engine. A dry run repairs a scratch copy of the snapshot.
pub fn repair(store: &dyn TaskStore, dry_run: bool) -> Result<RepairReport> {
    let result = if dry_run {
        let tasks = store.list_tasks()?;
        let scratch = MemoryStore::new(tasks.clone());
        info!(backend = %store.backend(), "dry run against in-memory copy");
        fix(&scratch, &tasks, None)
    } else {
        repair_store(store)?
    };
    Ok(RepairReport::new(result, dry_run))
}

pub fn run(repo_root: &Path, dry_run: bool, format: Format) -> Result<()> {
    let store = store::open(repo_root)?;
    let report = repair(store.as_ref(), dry_run)?;
    output::print_repair(&report, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::validate::validate;
    use crate::model::Task;
    use crate::task_id::TaskId;

    fn broken() -> Vec<Task> {
        vec![
            Task::new(1_u64, "a").with_dependencies([TaskId::Task(1), TaskId::Task(2)]),
            Task::new(2_u64, "b").with_dependencies([TaskId::Task(1), TaskId::Task(40)]),
        ]
    }

    #[test]
    fn repairs_store_in_place() {
        let store = MemoryStore::new(broken());
        let report = repair(&store, false).unwrap();

        assert_eq!(report.stats.self_deps_removed, 1);
        assert_eq!(report.stats.missing_deps_removed, 1);
        assert_eq!(report.stats.circular_deps_removed, 1);
        assert_eq!(report.stats.total_removed, 3);
        assert!(validate(&store.into_tasks()).is_empty());
    }

    #[test]
    fn dry_run_leaves_store_untouched() {
        let store = MemoryStore::new(broken());
        let report = repair(&store, true).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.stats.total_removed, 3);
        assert_eq!(store.into_tasks(), broken());
    }

    #[test]
    fn clean_store_reports_nothing_to_do() {
        let store = MemoryStore::new(vec![Task::new(1_u64, "a")]);
        let report = repair(&store, false).unwrap();
        assert_eq!(report.message, "No invalid dependencies found");
        assert_eq!(report.stats.total_removed, 0);
    }
}
