use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{Backend, TaskStore, lock};
use crate::config::Config;
use crate::error::{DepsError, Result};
use crate::model::{self, Priority, Status, Task};
use crate::task_id::TaskId;

/// On-disk task record. Unknown fields ride along in `extra` so rewrites
/// never drop data owned by other tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(default)]
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(default)]
    dependencies: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    subtasks: Vec<RawTask>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskFile {
    #[serde(default)]
    tasks: Vec<RawTask>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Positive task number carried by a raw id, if any.
fn raw_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().filter(|n| *n > 0),
        Value::String(s) => s.trim().parse::<u64>().ok().filter(|n| *n > 0),
        _ => None,
    }
}

fn record_number(raw: &RawTask) -> Option<u64> {
    raw.id.as_ref().and_then(raw_number)
}

fn parse_or_key(text: &str) -> TaskId {
    text.parse().unwrap_or_else(|_| TaskId::key(text))
}

/// Where a dependency list lives: on a top-level task, or on a subtask of
/// `parent` whose siblings are `siblings`.
#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    TopLevel,
    Subtask {
        parent: u64,
        siblings: &'a HashSet<u64>,
    },
}

impl Scope<'_> {
    fn resolve(&self, raw: &Value) -> TaskId {
        match (raw, self) {
            (Value::Number(n), Scope::Subtask { parent, siblings }) => match n.as_u64() {
                Some(sub) if siblings.contains(&sub) => TaskId::subtask(*parent, sub),
                Some(id) if id > 0 => TaskId::Task(id),
                _ => parse_or_key(&n.to_string()),
            },
            (Value::Number(n), Scope::TopLevel) => match n.as_u64() {
                Some(id) if id > 0 => TaskId::Task(id),
                // `1.2` as a JSON number still addresses subtask 2 of task 1.
                _ => parse_or_key(&n.to_string()),
            },
            (Value::String(s), _) => parse_or_key(s),
            (other, _) => TaskId::key(other.to_string()),
        }
    }

    /// Most compact raw form that resolves back to `dep` in this scope.
    fn encode(&self, dep: &TaskId) -> Value {
        match (dep, self) {
            (TaskId::Subtask { parent, sub }, Scope::Subtask { parent: own, .. })
                if parent == own =>
            {
                Value::from(*sub)
            }
            (TaskId::Task(n), Scope::Subtask { siblings, .. }) if siblings.contains(n) => {
                Value::String(n.to_string())
            }
            (TaskId::Task(n), _) => Value::from(*n),
            (other, _) => Value::String(other.to_string()),
        }
    }
}

fn sibling_numbers(subtasks: &[RawTask]) -> HashSet<u64> {
    subtasks.iter().filter_map(record_number).collect()
}

fn to_task(raw: &RawTask, id: TaskId, scope: Scope<'_>) -> Task {
    Task {
        id,
        title: raw.title.clone(),
        description: raw.description.clone(),
        status: raw.status,
        priority: raw.priority.unwrap_or_default(),
        dependencies: raw.dependencies.iter().map(|d| scope.resolve(d)).collect(),
        subtasks: Vec::new(),
    }
}

fn load_tasks(file: &TaskFile) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(file.tasks.len());

    for (position, raw) in file.tasks.iter().enumerate() {
        let Some(parent) = record_number(raw) else {
            warn!(position, title = %raw.title, "skipping task without a usable id");
            continue;
        };

        let siblings = sibling_numbers(&raw.subtasks);
        let scope = Scope::Subtask {
            parent,
            siblings: &siblings,
        };
        let mut task = to_task(raw, TaskId::Task(parent), Scope::TopLevel);

        for (sub_position, raw_sub) in raw.subtasks.iter().enumerate() {
            let Some(sub) = record_number(raw_sub) else {
                warn!(
                    parent,
                    position = sub_position,
                    title = %raw_sub.title,
                    "skipping subtask without a usable id"
                );
                continue;
            };
            task.subtasks
                .push(to_task(raw_sub, TaskId::subtask(parent, sub), scope));
        }

        tasks.push(task);
    }

    tasks
}

/// Apply `edit` to the dependency list of `id`, with the scope it resolves in.
fn edit_dependencies<F, T>(file: &mut TaskFile, id: &TaskId, edit: F) -> Result<T>
where
    F: FnOnce(&mut Vec<Value>, Scope<'_>) -> Result<T>,
{
    let not_found = || DepsError::TaskNotFound(id.clone());
    match id {
        TaskId::Task(n) => {
            let raw = file
                .tasks
                .iter_mut()
                .find(|t| record_number(t) == Some(*n))
                .ok_or_else(not_found)?;
            edit(&mut raw.dependencies, Scope::TopLevel)
        }
        TaskId::Subtask { parent, sub } => {
            let raw_parent = file
                .tasks
                .iter_mut()
                .find(|t| record_number(t) == Some(*parent))
                .ok_or_else(not_found)?;
            let siblings = sibling_numbers(&raw_parent.subtasks);
            let raw_sub = raw_parent
                .subtasks
                .iter_mut()
                .find(|t| record_number(t) == Some(*sub))
                .ok_or_else(not_found)?;
            edit(
                &mut raw_sub.dependencies,
                Scope::Subtask {
                    parent: *parent,
                    siblings: &siblings,
                },
            )
        }
        TaskId::Key(_) => Err(not_found()),
    }
}

/// Task collection stored as one JSON document.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create `.taskdeps/config.json` and, for the local backend, an empty task file.
    pub fn init(repo_root: &Path, config: &Config) -> Result<()> {
        if Config::config_path(repo_root).exists() {
            return Err(DepsError::AlreadyInitialized);
        }
        config.write(repo_root)?;

        let tasks_path = config.tasks_path(repo_root);
        if config.backend == Backend::Local && !tasks_path.exists() {
            if let Some(dir) = tasks_path.parent() {
                fs::create_dir_all(dir)?;
            }
            Self::at(tasks_path).save(&mut TaskFile::default())?;
        }
        Ok(())
    }

    pub fn open(repo_root: &Path, config: &Config) -> Result<Self> {
        let path = config.tasks_path(repo_root);
        if !path.exists() {
            return Err(DepsError::StoreUnavailable(format!(
                "task file {} not found",
                path.display()
            )));
        }
        Ok(Self::at(path))
    }

    /// Store backed by an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn load(&self) -> Result<TaskFile> {
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(TaskFile::default());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, file: &mut TaskFile) -> Result<()> {
        file.metadata
            .insert("updated".into(), Value::String(Utc::now().to_rfc3339()));
        fs::write(&self.path, serde_json::to_string_pretty(file)?)?;
        Ok(())
    }

    /// Locked read-modify-write of the whole file.
    fn update<F, T>(&self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut TaskFile) -> Result<T>,
    {
        let lock_file = lock::acquire_lock(&self.lock_path())?;
        let mut file = self.load()?;
        let out = mutate(&mut file)?;
        self.save(&mut file)?;
        lock::release_lock(lock_file)?;
        Ok(out)
    }
}

impl TaskStore for FileStore {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    fn list_tasks(&self) -> Result<Vec<Task>> {
        let file = self.load()?;
        let tasks = load_tasks(&file);
        debug!(path = %self.path.display(), tasks = tasks.len(), "loaded task file");
        Ok(tasks)
    }

    fn id_exists(&self, id: &TaskId) -> Result<bool> {
        let tasks = self.list_tasks()?;
        Ok(model::flatten(&tasks).iter().any(|t| &t.id == id))
    }

    fn remove_dependency_edge(&self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()> {
        self.update(|file| {
            edit_dependencies(file, task_id, |deps, scope| {
                let before = deps.len();
                deps.retain(|raw| &scope.resolve(raw) != dependency_id);
                if deps.len() == before {
                    return Err(DepsError::DependencyNotFound(
                        task_id.clone(),
                        dependency_id.clone(),
                    ));
                }
                Ok(())
            })
        })
    }

    fn add_dependency_edge(&self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()> {
        self.update(|file| {
            edit_dependencies(file, task_id, |deps, scope| {
                if deps.iter().any(|raw| &scope.resolve(raw) == dependency_id) {
                    return Err(DepsError::DependencyExists(
                        task_id.clone(),
                        dependency_id.clone(),
                    ));
                }
                deps.push(scope.encode(dependency_id));
                Ok(())
            })
        })
    }
}
