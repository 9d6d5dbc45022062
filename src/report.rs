//! JSON envelopes printed by `validate` and `fix`.

use serde::Serialize;

use crate::graph::DependencyGraph;
use crate::graph::repair::{RepairFailure, RepairResult};
use crate::graph::validate::Violation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total_tasks: usize,
    pub with_dependencies: usize,
    pub invalid_dependencies: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<Violation>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    /// Counts cover tasks and subtasks alike.
    pub fn new(graph: &DependencyGraph, issues: Vec<Violation>) -> Self {
        Self {
            valid: issues.is_empty(),
            stats: ValidationStats {
                total_tasks: graph.len(),
                with_dependencies: graph.with_dependencies(),
                invalid_dependencies: issues.len(),
            },
            issues,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairStats {
    pub self_deps_removed: usize,
    pub missing_deps_removed: usize,
    pub circular_deps_removed: usize,
    pub total_removed: usize,
    pub unfixable: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    pub stats: RepairStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RepairFailure>,
}

impl RepairReport {
    pub fn new(result: RepairResult, dry_run: bool) -> Self {
        let message = if result.is_noop() {
            "No invalid dependencies found".to_string()
        } else if result.unfixable == 0 {
            format!("Removed {} invalid dependencies", result.total_removed)
        } else {
            format!(
                "Removed {} invalid dependencies; {} could not be removed",
                result.total_removed, result.unfixable
            )
        };

        Self {
            message,
            dry_run,
            stats: RepairStats {
                self_deps_removed: result.self_removed,
                missing_deps_removed: result.missing_removed,
                circular_deps_removed: result.circular_removed,
                total_removed: result.total_removed,
                unfixable: result.unfixable,
            },
            failures: result.failures,
        }
    }
}
