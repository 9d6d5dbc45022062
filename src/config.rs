//! Project configuration stored in `.taskdeps/config.json`.
//!
//! Environment variables override file values after loading. The tracker
//! API token is only ever read from `JIRA_API_TOKEN`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DepsError, Result};
use crate::store::Backend;

pub const CONFIG_DIR: &str = ".taskdeps";
pub const CONFIG_FILE: &str = "config.json";
pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_TASKS_FILE: &str = "tasks.json";
pub const DEFAULT_LINK_TYPE: &str = "Blocks";

pub const ENV_BACKEND: &str = "TASKDEPS_BACKEND";
pub const ENV_JIRA_BASE_URL: &str = "JIRA_BASE_URL";
pub const ENV_JIRA_PROJECT: &str = "JIRA_PROJECT";
pub const ENV_JIRA_EMAIL: &str = "JIRA_EMAIL";
pub const ENV_JIRA_LINK_TYPE: &str = "JIRA_LINK_TYPE";
pub const ENV_JIRA_API_TOKEN: &str = "JIRA_API_TOKEN";

fn default_tasks_file() -> PathBuf {
    PathBuf::from(DEFAULT_TASKS_FILE)
}

fn default_link_type() -> String {
    DEFAULT_LINK_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_link_type")]
    pub link_type: String,
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            project: String::new(),
            email: None,
            link_type: default_link_type(),
            api_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_tasks_file")]
    pub tasks_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: Backend::Local,
            tasks_file: default_tasks_file(),
            jira: None,
        }
    }
}

impl Config {
    pub fn config_dir(repo_root: &Path) -> PathBuf {
        repo_root.join(CONFIG_DIR)
    }

    pub fn config_path(repo_root: &Path) -> PathBuf {
        Self::config_dir(repo_root).join(CONFIG_FILE)
    }

    /// Load `config.json` and apply environment overrides.
    pub fn load(repo_root: &Path) -> Result<Self> {
        let mut config = Self::load_file(repo_root)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_file(repo_root: &Path) -> Result<Self> {
        let path = Self::config_path(repo_root);
        if !path.exists() {
            return Err(DepsError::NotInitialized);
        }
        let data = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&data)?;
        if config.version != CONFIG_VERSION {
            return Err(DepsError::Config(format!(
                "unsupported config version {} (expected {CONFIG_VERSION})",
                config.version
            )));
        }
        Ok(config)
    }

    pub fn write(&self, repo_root: &Path) -> Result<()> {
        fs::create_dir_all(Self::config_dir(repo_root))?;
        fs::write(
            Self::config_path(repo_root),
            serde_json::to_string_pretty(self)?,
        )?;
        Ok(())
    }

    /// Apply overrides from `lookup` (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = non_empty(ENV_BACKEND) {
            self.backend = match value.trim().to_ascii_lowercase().as_str() {
                "local" | "file" => Backend::Local,
                "jira" => Backend::Jira,
                other => {
                    return Err(DepsError::Config(format!(
                        "{ENV_BACKEND}: unknown backend '{other}'"
                    )));
                }
            };
        }

        let base_url = non_empty(ENV_JIRA_BASE_URL);
        let project = non_empty(ENV_JIRA_PROJECT);
        let email = non_empty(ENV_JIRA_EMAIL);
        let link_type = non_empty(ENV_JIRA_LINK_TYPE);
        let token = non_empty(ENV_JIRA_API_TOKEN);

        let touches_jira = base_url.is_some()
            || project.is_some()
            || email.is_some()
            || link_type.is_some()
            || token.is_some();
        if touches_jira || self.backend == Backend::Jira {
            let jira = self.jira.get_or_insert_with(JiraConfig::default);
            if let Some(v) = base_url {
                jira.base_url = v;
            }
            if let Some(v) = project {
                jira.project = v;
            }
            if let Some(v) = email {
                jira.email = Some(v);
            }
            if let Some(v) = link_type {
                jira.link_type = v;
            }
            jira.api_token = token;
        }

        Ok(())
    }

    /// Absolute path of the local task file.
    pub fn tasks_path(&self, repo_root: &Path) -> PathBuf {
        if self.tasks_file.is_absolute() {
            self.tasks_file.clone()
        } else {
            Self::config_dir(repo_root).join(&self.tasks_file)
        }
    }
}

/// Walk up from the current directory to the directory holding `.taskdeps/`.
pub fn find_repo_root() -> Result<PathBuf> {
    let mut dir = std::env::current_dir()?;
    loop {
        if dir.join(CONFIG_DIR).is_dir() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(DepsError::NotInitialized);
        }
    }
}
