//! Submission payload
//!
//! The body posted by the grading platform. It must be a JSON object and
//! `repo_url`, when present, must be a string. Submitter and project
//! metadata only feed notification text: they are read from whatever shape
//! arrives and fall back to [`UNKNOWN`] instead of failing the request.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Placeholder for missing submitter or project metadata
pub const UNKNOWN: &str = "unknown";

/// A repository submission event
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct SubmissionRequest {
    pub repo_url: Option<String>,
    pub users: Vec<Submitter>,
    pub project: Option<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submitter {
    pub login: Option<String>,
    pub projects_user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub slug: Option<String>,
}

impl TryFrom<Map<String, Value>> for SubmissionRequest {
    type Error = String;

    fn try_from(mut body: Map<String, Value>) -> Result<Self, Self::Error> {
        let repo_url = match body.remove("repo_url") {
            None | Some(Value::Null) => None,
            Some(Value::String(url)) => Some(url),
            Some(other) => return Err(format!("repo_url must be a string, got {}", json_type(&other))),
        };

        // A bare submitter is accepted where a list is expected
        let users = match body.get("users") {
            Some(Value::Array(items)) => items.iter().map(Submitter::from_value).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![Submitter::from_value(single)],
        };

        let project = body
            .get("project")
            .filter(|value| !value.is_null())
            .map(Project::from_value);

        Ok(Self {
            repo_url,
            users,
            project,
        })
    }
}

impl SubmissionRequest {
    /// The repository URL, if present and not blank
    pub fn repo_url(&self) -> Option<&str> {
        self.repo_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn submitters(&self) -> &[Submitter] {
        &self.users
    }

    /// The first submitter, who is named in notifications
    pub fn primary_submitter(&self) -> Option<&Submitter> {
        self.users.first()
    }

    pub fn project_slug(&self) -> &str {
        self.project
            .as_ref()
            .map(Project::slug_or_unknown)
            .unwrap_or(UNKNOWN)
    }

    pub fn primary_login(&self) -> &str {
        self.primary_submitter()
            .map(Submitter::login_or_unknown)
            .unwrap_or(UNKNOWN)
    }

    pub fn primary_projects_user_id(&self) -> Option<&str> {
        self.primary_submitter()
            .and_then(|s| s.projects_user_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

impl Submitter {
    /// An object yields its `login` and `projects_user_id`; a bare string or
    /// number is taken as the login
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(fields) => Self {
                login: fields.get("login").and_then(scalar_text),
                projects_user_id: fields.get("projects_user_id").and_then(scalar_text),
            },
            other => Self {
                login: scalar_text(other),
                projects_user_id: None,
            },
        }
    }

    pub fn login_or_unknown(&self) -> &str {
        self.login
            .as_deref()
            .filter(|login| !login.is_empty())
            .unwrap_or(UNKNOWN)
    }
}

impl Project {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(fields) => Self {
                slug: fields.get("slug").and_then(scalar_text),
            },
            other => Self {
                slug: scalar_text(other),
            },
        }
    }

    pub fn slug_or_unknown(&self) -> &str {
        self.slug
            .as_deref()
            .filter(|slug| !slug.is_empty())
            .unwrap_or(UNKNOWN)
    }
}

// Platforms send ids either as JSON strings or numbers
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
