//! Per-request identifiers

use axum::http::HeaderMap;
use std::fmt;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_LEN: usize = 64;

/// Identifies one webhook call in logs and the response header
///
/// Taken from the caller's `X-Request-Id` header when it is a safe token,
/// otherwise a fresh UUID v4. Callers may reuse an id, so it is not unique
/// across concurrent requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_else(Self::generate)
    }

    /// Accept `[A-Za-z0-9_-]{1,64}`
    pub fn parse(value: &str) -> Option<Self> {
        let valid = !value.is_empty()
            && value.len() <= MAX_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
