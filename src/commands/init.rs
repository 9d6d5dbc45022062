use std::path::Path;

use crate::config::{Config, JiraConfig};
use crate::error::Result;
use crate::store::Backend;
use crate::store::files::FileStore;

/// Tracker settings accepted by `init`.
#[derive(Debug, Default, Clone)]
pub struct JiraOptions {
    pub project: Option<String>,
    pub base_url: Option<String>,
    pub email: Option<String>,
}

fn build_config(backend: Backend, jira: JiraOptions) -> Config {
    let mut config = Config {
        backend,
        ..Config::default()
    };
    if backend == Backend::Jira {
        config.jira = Some(JiraConfig {
            base_url: jira.base_url.unwrap_or_default(),
            project: jira.project.unwrap_or_default(),
            email: jira.email,
            ..JiraConfig::default()
        });
    }
    config
}

pub fn run(repo_root: &Path, backend: Backend, jira: JiraOptions) -> Result<()> {
    let config = build_config(backend, jira);
    FileStore::init(repo_root, &config)?;
    eprintln!(
        "Initialized .taskdeps/ ({} backend) in {}",
        config.backend,
        repo_root.display()
    );
    Ok(())
}
