use std::path::Path;

use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::graph::validate::validate_graph;
use crate::output::{self, Format};
use crate::report::ValidationReport;
use crate::store::{self, TaskStore};

pub fn build_report(store: &dyn TaskStore) -> Result<ValidationReport> {
    let tasks = store.list_tasks()?;
    let graph = DependencyGraph::from_tasks(&tasks);
    let issues = validate_graph(&graph);
    Ok(ValidationReport::new(&graph, issues))
}

/// Prints the report; finding issues is not a command failure.
pub fn run(repo_root: &Path, format: Format) -> Result<()> {
    let store = store::open(repo_root)?;
    let report = build_report(store.as_ref())?;
    output::print_validation(&report, format)
}
