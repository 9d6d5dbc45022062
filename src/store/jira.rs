//! Remote issue tracker backend (Jira Cloud REST v3).
//!
//! A dependency `A -> B` is an issue link of the configured type where `B`
//! is the inward issue on `A` ("A is blocked by B").

use std::collections::{HashMap, HashSet};

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{Backend, TaskStore};
use crate::config::Config;
use crate::error::{DepsError, Result};
use crate::model::{Priority, Status, Task};
use crate::task_id::TaskId;

const PAGE_SIZE: usize = 100;
const SEARCH_FIELDS: &str = "summary,description,status,priority,issuelinks,parent,issuetype";

pub struct JiraStore {
    client: Client,
    base_url: String,
    project: String,
    email: String,
    token: String,
    link_type: String,
}

impl JiraStore {
    /// Build a client from config; fails before any request when a setting is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let jira = config.jira.as_ref().ok_or_else(|| {
            DepsError::StoreUnavailable("jira backend selected but not configured".into())
        })?;

        let required = |value: Option<&str>, what: &str| -> Result<String> {
            match value.map(str::trim) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(DepsError::StoreUnavailable(format!("missing jira {what}"))),
            }
        };

        let base_url = required(Some(jira.base_url.as_str()), "base URL")?;
        let project = required(Some(jira.project.as_str()), "project key")?;
        let email = required(jira.email.as_deref(), "account email")?;
        let token = required(jira.api_token.as_deref(), "API token (JIRA_API_TOKEN)")?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project,
            email,
            token,
            link_type: jira.link_type.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .basic_auth(&self.email, Some(&self.token))
            .header("Accept", "application/json")
            .send()
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    DepsError::StoreUnavailable(format!("cannot reach {}: {e}", self.base_url))
                } else {
                    DepsError::Http(e)
                }
            })?;
        debug!(url = %response.url(), status = %response.status(), "jira request");
        Ok(response)
    }

    fn search_page(&self, page_token: Option<&str>) -> Result<Value> {
        let jql = format!("project = \"{}\" ORDER BY created ASC, key ASC", self.project);
        let max_results = PAGE_SIZE.to_string();
        let mut query = vec![
            ("jql", jql.as_str()),
            ("maxResults", max_results.as_str()),
            ("fields", SEARCH_FIELDS),
        ];
        if let Some(token) = page_token {
            query.push(("nextPageToken", token));
        }
        let request = self
            .client
            .get(self.url("/rest/api/3/search/jql"))
            .query(&query);
        read_json(check(self.send(request)?)?)
    }

    fn fetch_issue(&self, key: &str, fields: &str) -> Result<Option<Value>> {
        let request = self
            .client
            .get(self.url(&format!("/rest/api/3/issue/{key}")))
            .query(&[("fields", fields)]);
        let response = self.send(request)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(check(response)?).map(Some)
    }
}

impl TaskStore for JiraStore {
    fn backend(&self) -> Backend {
        Backend::Jira
    }

    fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut issues = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.search_page(page_token.as_deref())?;
            if let Some(batch) = page.get("issues").and_then(Value::as_array) {
                issues.extend(batch.iter().cloned());
            }
            page_token = next_page_token(&page);
            if page_token.is_none() {
                break;
            }
        }
        debug!(count = issues.len(), "jira search complete");

        let mut mapped = Vec::with_capacity(issues.len());
        for issue in &issues {
            match issue_to_task(issue, &self.link_type) {
                Some(entry) => mapped.push(entry),
                None => warn!("skipping issue without a key"),
            }
        }
        Ok(nest_subtasks(mapped))
    }

    fn id_exists(&self, id: &TaskId) -> Result<bool> {
        Ok(self.fetch_issue(&id.to_string(), "summary")?.is_some())
    }

    fn remove_dependency_edge(&self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()> {
        let issue = self
            .fetch_issue(&task_id.to_string(), "issuelinks")?
            .ok_or_else(|| DepsError::TaskNotFound(task_id.clone()))?;
        let link_id = find_link_id(&issue, &self.link_type, &dependency_id.to_string())
            .ok_or_else(|| DepsError::DependencyNotFound(task_id.clone(), dependency_id.clone()))?;

        let request = self
            .client
            .delete(self.url(&format!("/rest/api/3/issueLink/{link_id}")));
        check(self.send(request)?)?;
        Ok(())
    }

    fn add_dependency_edge(&self, task_id: &TaskId, dependency_id: &TaskId) -> Result<()> {
        let body = json!({
            "type": { "name": self.link_type },
            "inwardIssue": { "key": dependency_id.to_string() },
            "outwardIssue": { "key": task_id.to_string() },
        });
        let request = self
            .client
            .post(self.url("/rest/api/3/issueLink"))
            .json(&body);
        check(self.send(request)?)?;
        Ok(())
    }
}

fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DepsError::StoreUnavailable(
            format!("jira rejected credentials ({status})"),
        )),
        _ => Err(DepsError::Remote {
            status: status.as_u16(),
            message,
        }),
    }
}

fn read_json(response: Response) -> Result<Value> {
    let body = response.text()?;
    Ok(serde_json::from_str(&body)?)
}

/// Token for the page after `page`, or `None` once the search is exhausted.
pub(crate) fn next_page_token(page: &Value) -> Option<String> {
    if page.get("isLast").and_then(Value::as_bool) == Some(true) {
        return None;
    }
    page.get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn field_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
}

pub(crate) fn map_status(status: &Value) -> Status {
    let name = status
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_lowercase();
    match name.as_str() {
        "blocked" => return Status::Blocked,
        "deferred" => return Status::Deferred,
        "cancelled" | "canceled" | "won't do" => return Status::Cancelled,
        "review" | "in review" => return Status::Review,
        _ => {}
    }
    match field_str(status, &["statusCategory", "key"]) {
        Some("indeterminate") => Status::InProgress,
        Some("done") => Status::Done,
        _ => Status::Pending,
    }
}

pub(crate) fn map_priority(priority: Option<&Value>) -> Priority {
    let name = priority
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_lowercase();
    match name.as_str() {
        "highest" | "high" => Priority::High,
        "low" | "lowest" => Priority::Low,
        _ => Priority::Medium,
    }
}

/// Flatten an Atlassian document (or plain string) into text.
fn document_text(doc: &Value) -> Option<String> {
    fn collect(node: &Value, out: &mut String) {
        if let Some(text) = node.get("text").and_then(Value::as_str) {
            out.push_str(text);
        }
        if let Some(children) = node.get("content").and_then(Value::as_array) {
            for child in children {
                collect(child, out);
            }
            if node.get("type").and_then(Value::as_str) == Some("paragraph") {
                out.push('\n');
            }
        }
    }

    match doc {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => {
            let mut out = String::new();
            collect(doc, &mut out);
            let trimmed = out.trim_end().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }
        _ => None,
    }
}

fn blocking_links<'a>(issue: &'a Value, link_type: &'a str) -> impl Iterator<Item = &'a Value> {
    issue
        .get("fields")
        .and_then(|f| f.get("issuelinks"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(move |link| {
            field_str(link, &["type", "name"]).is_some_and(|n| n.eq_ignore_ascii_case(link_type))
        })
}

/// Map one search hit to a task plus the key of its parent when the issue is
/// a sub-task. Children of epics carry a parent too but stay top-level.
pub(crate) fn issue_to_task(issue: &Value, link_type: &str) -> Option<(Task, Option<String>)> {
    let key = issue.get("key").and_then(Value::as_str)?;
    let fields = issue.get("fields").cloned().unwrap_or(Value::Null);

    let dependencies = blocking_links(issue, link_type)
        .filter_map(|link| field_str(link, &["inwardIssue", "key"]))
        .map(TaskId::key)
        .collect();

    let task = Task {
        id: TaskId::key(key),
        title: field_str(&fields, &["summary"]).unwrap_or_default().to_string(),
        description: fields.get("description").and_then(document_text),
        status: fields.get("status").map(map_status).unwrap_or_default(),
        priority: map_priority(fields.get("priority")),
        dependencies,
        subtasks: Vec::new(),
    };
    let is_subtask = fields
        .get("issuetype")
        .and_then(|t| t.get("subtask"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let parent = is_subtask
        .then(|| field_str(&fields, &["parent", "key"]))
        .flatten()
        .map(str::to_string);
    Some((task, parent))
}

/// Attach sub-tasks to their parent when the parent is part of the listing.
pub(crate) fn nest_subtasks(entries: Vec<(Task, Option<String>)>) -> Vec<Task> {
    let parents: HashSet<String> = entries
        .iter()
        .filter(|(_, parent)| parent.is_none())
        .map(|(task, _)| task.id.to_string())
        .collect();

    let mut top = Vec::new();
    let mut children: Vec<(String, Task)> = Vec::new();
    for (task, parent) in entries {
        match parent.filter(|p| parents.contains(p)) {
            Some(parent) => children.push((parent, task)),
            None => top.push(task),
        }
    }

    let position: HashMap<String, usize> = top
        .iter()
        .enumerate()
        .map(|(i, task)| (task.id.to_string(), i))
        .collect();
    for (parent, child) in children {
        if let Some(&index) = position.get(&parent) {
            top[index].subtasks.push(child);
        }
    }
    top
}

/// Id of the link recording that `issue` is blocked by `dependency_key`.
pub(crate) fn find_link_id(issue: &Value, link_type: &str, dependency_key: &str) -> Option<String> {
    blocking_links(issue, link_type)
        .find(|link| field_str(link, &["inwardIssue", "key"]) == Some(dependency_key))
        .and_then(|link| match link.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        })
}
