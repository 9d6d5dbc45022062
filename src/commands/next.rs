use std::path::Path;

use crate::error::Result;
use crate::model::Task;
use crate::next::select_next;
use crate::output::{self, Format};
use crate::store::{self, TaskStore};

pub fn select(store: &dyn TaskStore) -> Result<Option<Task>> {
    let tasks = store.list_tasks()?;
    Ok(select_next(&tasks).cloned())
}

pub fn run(repo_root: &Path, format: Format) -> Result<()> {
    let store = store::open(repo_root)?;
    match select(store.as_ref())? {
        Some(task) => output::print_task(&task, format)?,
        None if format == Format::Json => println!("null"),
        None => println!("No available tasks"),
    }
    Ok(())
}
