//! Embed message construction
//!
//! Discord rejects embeds whose title exceeds 256 characters or whose
//! description exceeds 4096, so both are cut to fit here.

use crate::submission::{Project, Submitter, UNKNOWN};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

/// Everything but RFC 3986 unreserved characters, so a value stays one path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

pub const EMBED_COLOR: u32 = 5814783;
pub const TITLE_LIMIT: usize = 256;
pub const DESCRIPTION_LIMIT: usize = 4096;

pub const VIOLATION_HEADER: &str = "Invalid files detected:\n";
pub const SUCCESS_DESCRIPTION: &str = "All files match the allowed extensions.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedPayload {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub color: u32,
    pub timestamp: String,
}

/// Who and what a notification is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    pub login: String,
    pub slug: String,
    pub projects_user_id: Option<String>,
}

impl MessageContext {
    /// Build from the first submitter and the project, with placeholders
    pub fn new(submitters: &[Submitter], project: Option<&Project>) -> Self {
        let primary = submitters.first();
        Self {
            login: primary
                .map(Submitter::login_or_unknown)
                .unwrap_or(UNKNOWN)
                .to_string(),
            slug: project.map(Project::slug_or_unknown).unwrap_or(UNKNOWN).to_string(),
            projects_user_id: primary
                .and_then(|s| s.projects_user_id.clone())
                .filter(|id| !id.is_empty()),
        }
    }

    pub fn title(&self) -> String {
        truncate_chars(&format!("{} - {}", self.login, self.slug), TITLE_LIMIT)
    }

    /// Render the review link template
    ///
    /// Supported placeholders are `{slug}`, `{projects_user_id}` and `{login}`.
    /// Values are percent-encoded as path segments. Returns `None` when a
    /// placeholder the template uses has no real value.
    pub fn review_url(&self, template: &str) -> Option<String> {
        let values = [
            ("{slug}", Some(self.slug.as_str())),
            ("{login}", Some(self.login.as_str())),
            ("{projects_user_id}", self.projects_user_id.as_deref()),
        ];

        let mut url = template.to_string();
        for (placeholder, value) in values {
            if !url.contains(placeholder) {
                continue;
            }
            match value {
                Some(v) if v != UNKNOWN => {
                    let encoded = utf8_percent_encode(v, PATH_SEGMENT).to_string();
                    url = url.replace(placeholder, &encoded);
                }
                _ => return None,
            }
        }
        Some(url)
    }
}

impl Embed {
    pub fn new(context: &MessageContext, description: String, review_template: Option<&str>) -> Self {
        Self {
            title: context.title(),
            description,
            url: review_template.and_then(|t| context.review_url(t)),
            color: EMBED_COLOR,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

impl From<Embed> for EmbedPayload {
    fn from(embed: Embed) -> Self {
        Self { embeds: vec![embed] }
    }
}

/// List violating paths one per line within the description limit
///
/// Paths that do not fit are summarized by a final `... and N more` line.
pub fn violation_description(paths: &[String]) -> String {
    let full_len = VIOLATION_HEADER.chars().count()
        + paths.iter().map(|p| p.chars().count()).sum::<usize>()
        + paths.len().saturating_sub(1);
    if full_len <= DESCRIPTION_LIMIT {
        return format!("{}{}", VIOLATION_HEADER, paths.join("\n"));
    }

    // Room for the widest possible summary line
    let reserve = format!("\n... and {} more", paths.len()).chars().count();
    let mut description = VIOLATION_HEADER.to_string();
    let mut used = description.chars().count();
    let mut included = 0;

    for path in paths {
        let separator = usize::from(included > 0);
        let cost = separator + path.chars().count();
        if used + cost + reserve > DESCRIPTION_LIMIT {
            break;
        }
        if included > 0 {
            description.push('\n');
        }
        description.push_str(path);
        used += cost;
        included += 1;
    }

    let remaining = paths.len() - included;
    if included > 0 {
        description.push('\n');
    }
    description.push_str(&format!("... and {} more", remaining));
    description
}

pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
