use clap::ValueEnum;
use colored::Colorize;

use crate::error::Result;
use crate::graph::validate::{Violation, ViolationKind};
use crate::model::{Status, Task};
use crate::report::{RepairReport, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

fn join_ids<T: std::fmt::Display>(ids: &[T]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn colored_status(status: Status) -> String {
    let text = status.to_string();
    match status {
        Status::Done | Status::Completed => text.green().to_string(),
        Status::InProgress | Status::Review => text.cyan().to_string(),
        Status::Blocked => text.red().to_string(),
        Status::Deferred | Status::Cancelled => text.dimmed().to_string(),
        Status::Pending => text,
    }
}

fn print_pretty(task: &Task, indent: usize) {
    let pad = " ".repeat(indent);
    println!(
        "{pad}[{}] {} ({})",
        task.id.to_string().bold(),
        task.title,
        colored_status(task.status)
    );
    if let Some(ref desc) = task.description {
        println!("{pad}  {desc}");
    }
    println!("{pad}  priority: {}", task.priority);
    if !task.dependencies.is_empty() {
        println!("{pad}  depends on: {}", join_ids(&task.dependencies));
    }
    for sub in &task.subtasks {
        print_pretty(sub, indent + 2);
    }
}

fn minimal_row(task: &Task) -> String {
    let title = truncate_title(&task.title, 24);
    format!(
        "{:>8} {:24} {:12} {:6} {}",
        task.id.to_string(),
        title,
        task.status.to_string(),
        task.priority.to_string(),
        join_ids(&task.dependencies)
    )
}

pub fn print_task(task: &Task, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(task)?),
        Format::Pretty => print_pretty(task, 0),
        Format::Minimal => println!("{}", minimal_row(task)),
    }
    Ok(())
}

pub fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() > max_len {
        let truncated: String = title.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        title.to_string()
    }
}

pub fn print_tasks(tasks: &[Task], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(tasks)?),
        Format::Pretty => {
            for task in tasks {
                print_pretty(task, 0);
                println!();
            }
        }
        Format::Minimal => {
            println!(
                "{:>8} {:24} {:12} {:6} DEPENDS",
                "ID", "TITLE", "STATUS", "PRIO"
            );
            println!("{}", "-".repeat(64));
            for task in tasks {
                println!("{}", minimal_row(task));
            }
        }
    }
    Ok(())
}

/// Padded before coloring so escape codes do not eat the column width.
fn kind_label(kind: ViolationKind) -> String {
    let text = format!("{:<9}", kind.to_string());
    match kind {
        ViolationKind::SelfReference | ViolationKind::Missing => text.yellow().to_string(),
        ViolationKind::Circular => text.red().to_string(),
    }
}

fn violation_row(violation: &Violation) -> String {
    format!("  {} {}", kind_label(violation.kind), violation.message)
}

fn print_violation(violation: &Violation) {
    println!("{}", violation_row(violation));
}

pub fn print_validation(report: &ValidationReport, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(report)?),
        Format::Pretty => {
            if report.valid {
                println!("{} all dependencies are valid", "ok".green().bold());
            } else {
                println!(
                    "{} {} invalid dependencies",
                    "warn".yellow().bold(),
                    report.issues.len()
                );
                for issue in &report.issues {
                    print_violation(issue);
                }
            }
            println!(
                "  {} tasks, {} with dependencies",
                report.stats.total_tasks, report.stats.with_dependencies
            );
        }
        Format::Minimal => {
            for issue in &report.issues {
                println!("{} {} {}", issue.kind, issue.task_id, issue.dependency_id);
            }
        }
    }
    Ok(())
}

pub fn print_repair(report: &RepairReport, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(report)?),
        Format::Pretty => {
            let label = if report.stats.unfixable > 0 {
                "error".red().bold()
            } else {
                "ok".green().bold()
            };
            let suffix = if report.dry_run { " (dry run)" } else { "" };
            println!("{label} {}{suffix}", report.message);
            println!(
                "  self: {}  missing: {}  circular: {}",
                report.stats.self_deps_removed,
                report.stats.missing_deps_removed,
                report.stats.circular_deps_removed
            );
            for failure in &report.failures {
                print_violation(&failure.violation);
                println!("      {}", failure.reason.dimmed());
            }
        }
        Format::Minimal => println!(
            "{} {} {} {} {}",
            report.stats.self_deps_removed,
            report.stats.missing_deps_removed,
            report.stats.circular_deps_removed,
            report.stats.total_removed,
            report.stats.unfixable
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_id::TaskId;

    #[test]
    fn truncate_title_keeps_short_titles() {
        assert_eq!(truncate_title("short", 12), "short");
        assert_eq!(truncate_title("a considerably longer title", 12), "a conside...");
    }

    #[test]
    fn violation_labels_share_one_column() {
        colored::control::set_override(true);
        let rows: Vec<String> = [
            Violation::self_reference(TaskId::Task(1)),
            Violation::missing(TaskId::Task(2), TaskId::Task(9)),
            Violation::circular(TaskId::Task(3), TaskId::Task(4)),
        ]
        .iter()
        .map(violation_row)
        .collect();
        colored::control::unset_override();

        for (row, label) in rows.iter().zip(["self", "missing", "circular"]) {
            // Padding sits inside the escape sequence, before the reset code.
            assert!(row.contains(&format!("{label:<9}\x1b[0m")), "{row:?}");
        }
    }

    #[test]
    fn minimal_row_lists_dependencies() {
        let task = Task::new(TaskId::subtask(2, 1), "write parser")
            .with_dependencies([TaskId::Task(1), TaskId::subtask(2, 3)]);
        let row = minimal_row(&task);
        assert!(row.contains("2.1"));
        assert!(row.ends_with("1, 2.3"));
    }
}
