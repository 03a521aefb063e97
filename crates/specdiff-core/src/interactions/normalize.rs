use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::raw::{header, RawInteraction};
use crate::model::ContentType;

/// Which media types carry a structural (JSON) body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Exact media types parsed as JSON
    pub structured_media_types: Vec<String>,
    /// Also treat any `+json` suffix (e.g. `application/problem+json`) as JSON
    pub json_suffix: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            structured_media_types: vec!["application/json".to_string()],
            json_suffix: true,
        }
    }
}

impl NormalizeOptions {
    pub fn is_structured(&self, content_type: &ContentType) -> bool {
        match content_type.as_media() {
            None => false,
            Some(media) => {
                (self.json_suffix && media.ends_with("+json"))
                    || self
                        .structured_media_types
                        .iter()
                        .any(|m| m.eq_ignore_ascii_case(media))
            }
        }
    }
}

/// Body of one side of an interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedBody {
    pub content_type: ContentType,
    pub raw: Vec<u8>,
    /// Parsed tree; `None` means "no body observed" (absent, non-JSON or unparseable)
    pub value: Option<Value>,
}

/// Canonical interaction consumed by the diff computer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub method: String,
    pub host: String,
    pub path: String,
    pub query: Option<String>,
    pub request_headers: Vec<(String, String)>,
    pub request: ObservedBody,
    pub status_code: u16,
    pub response_headers: Vec<(String, String)>,
    pub response: ObservedBody,
}

fn observe(
    interaction_id: &str,
    side: &str,
    headers: &[(String, String)],
    raw: Vec<u8>,
    options: &NormalizeOptions,
) -> ObservedBody {
    let content_type = ContentType::from_header(header(headers, "content-type"));
    let value = if raw.is_empty() || !options.is_structured(&content_type) {
        None
    } else {
        match serde_json::from_slice::<Value>(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(
                    interaction_id,
                    side,
                    content_type = %content_type,
                    error = %err,
                    "unparseable body treated as no body"
                );
                None
            }
        }
    };
    ObservedBody {
        content_type,
        raw,
        value,
    }
}

/// Normalize one raw interaction
///
/// Never fails: a body that does not parse is recorded as `None` and diffing
/// continues as if no body had been observed.
pub fn normalize(raw: RawInteraction, index: usize, options: &NormalizeOptions) -> Interaction {
    let id = raw.id.unwrap_or_else(|| format!("sample-{}", index));
    let request = observe(&id, "request", &raw.request.headers, raw.request.body, options);
    let response = observe(
        &id,
        "response",
        &raw.response.headers,
        raw.response.body,
        options,
    );
    let (path, query) = match raw.request.path.split_once('?') {
        Some((p, q)) if raw.request.query.is_none() => (p.to_string(), Some(q.to_string())),
        _ => (raw.request.path, raw.request.query),
    };

    Interaction {
        id,
        method: raw.request.method.trim().to_ascii_uppercase(),
        host: raw.request.host,
        path,
        query,
        request_headers: raw.request.headers,
        request,
        status_code: raw.response.status_code,
        response_headers: raw.response.headers,
        response,
    }
}

/// Normalize a whole capture, numbering samples by position
pub fn normalize_all(
    raws: impl IntoIterator<Item = RawInteraction>,
    options: &NormalizeOptions,
) -> Vec<Interaction> {
    raws.into_iter()
        .enumerate()
        .map(|(index, raw)| normalize(raw, index, options))
        .collect()
}
