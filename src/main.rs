use clap::{Parser, Subcommand};
use taskdeps::commands::init::JiraOptions;
use taskdeps::error::DepsError;
use taskdeps::logging::LogLevel;
use taskdeps::model::Status;
use taskdeps::output::Format;
use taskdeps::store::Backend;
use taskdeps::task_id::{TaskId, TaskIdParseError};

#[derive(Parser)]
#[command(
    name = "taskdeps",
    version,
    about = "Validate, repair and schedule task dependencies"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, global = true, hide = true)]
    pretty: bool,
    /// Log level (overrides TASKDEPS_LOG)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize .taskdeps/ in the current directory
    Init {
        /// Where tasks live
        #[arg(long, value_enum, default_value = "local")]
        backend: Backend,
        /// Tracker project key (jira backend)
        #[arg(long)]
        project: Option<String>,
        /// Tracker base URL (jira backend)
        #[arg(long)]
        base_url: Option<String>,
        /// Tracker account email (jira backend)
        #[arg(long)]
        email: Option<String>,
    },
    /// List top-level tasks
    List {
        /// Filter by status
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Only tasks ready to start, best first
        #[arg(long)]
        available: bool,
    },
    /// Display a single task or subtask
    Show {
        /// Task ID (e.g. 3, 3.1, PROJ-12)
        id: String,
    },
    /// Make a task depend on another
    AddDep {
        /// Dependent task
        id: String,
        /// Task it should wait for
        dep: String,
    },
    /// Remove a dependency edge
    RemoveDep {
        /// Dependent task
        id: String,
        /// Dependency to drop
        dep: String,
    },
    /// Report self, missing and circular dependencies
    Validate,
    /// Remove invalid dependencies
    Fix {
        /// Report what would be removed without touching the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the next task to work on
    Next,
}

fn parse_task_id(input: &str) -> taskdeps::error::Result<TaskId> {
    input
        .parse()
        .map_err(|e: TaskIdParseError| DepsError::InvalidTaskId(input.to_string(), e.to_string()))
}

fn run(cli: Cli, format: Format) -> taskdeps::error::Result<()> {
    if let Commands::Init {
        backend,
        project,
        base_url,
        email,
    } = cli.command
    {
        let cwd = std::env::current_dir()?;
        let jira = JiraOptions {
            project,
            base_url,
            email,
        };
        return taskdeps::commands::init::run(&cwd, backend, jira);
    }

    let root = taskdeps::config::find_repo_root()?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),
        Commands::List { status, available } => {
            taskdeps::commands::list::run(&root, status, available, format)
        }
        Commands::Show { id } => {
            taskdeps::commands::show::run(&root, &parse_task_id(&id)?, format)
        }
        Commands::AddDep { id, dep } => {
            let (id, dep) = (parse_task_id(&id)?, parse_task_id(&dep)?);
            taskdeps::commands::deps::run_add(&root, &id, &dep, format)
        }
        Commands::RemoveDep { id, dep } => {
            let (id, dep) = (parse_task_id(&id)?, parse_task_id(&dep)?);
            taskdeps::commands::deps::run_remove(&root, &id, &dep, format)
        }
        Commands::Validate => taskdeps::commands::validate::run(&root, format),
        Commands::Fix { dry_run } => taskdeps::commands::fix::run(&root, dry_run, format),
        Commands::Next => taskdeps::commands::next::run(&root, format),
    }
}

fn main() {
    let cli = Cli::parse();
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    let result = taskdeps::logging::init_logging(cli.log_level).and_then(|()| run(cli, format));
    if let Err(e) = result {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
