use std::path::Path;

use crate::error::Result;
use crate::model::{Status, Task};
use crate::next;
use crate::output::{self, Format};
use crate::store::{self, TaskStore};

/// Top-level tasks matching the filters. `available` yields selection order.
pub fn filter(tasks: &[Task], status: Option<Status>, available: bool) -> Vec<Task> {
    let candidates: Vec<&Task> = if available {
        next::eligible(tasks)
    } else {
        tasks.iter().collect()
    };
    candidates
        .into_iter()
        .filter(|t| status.is_none_or(|s| t.status == s))
        .cloned()
        .collect()
}

pub fn list(store: &dyn TaskStore, status: Option<Status>, available: bool) -> Result<Vec<Task>> {
    let tasks = store.list_tasks()?;
    Ok(filter(&tasks, status, available))
}

pub fn run(repo_root: &Path, status: Option<Status>, available: bool, format: Format) -> Result<()> {
    let store = store::open(repo_root)?;
    let tasks = list(store.as_ref(), status, available)?;
    output::print_tasks(&tasks, format)
}
