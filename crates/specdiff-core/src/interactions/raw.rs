use serde::{Deserialize, Serialize};

/// One recorded request/response exchange, as captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInteraction {
    /// Capture-assigned id; normalization falls back to the sample index
    #[serde(default)]
    pub id: Option<String>,
    pub request: RawRequest,
    pub response: RawResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequest {
    pub method: String,
    #[serde(default)]
    pub host: String,
    pub path: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Vec<u8>,
}

/// Case-insensitive header lookup; the first occurrence wins
pub(crate) fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

impl RawInteraction {
    /// Convenience constructor for JSON traffic (used by fixtures and tools)
    pub fn json(
        method: &str,
        path: &str,
        request_body: Option<&serde_json::Value>,
        status_code: u16,
        response_body: Option<&serde_json::Value>,
    ) -> Self {
        let side = |body: Option<&serde_json::Value>| match body {
            Some(value) => (
                vec![("Content-Type".to_string(), "application/json".to_string())],
                value.to_string().into_bytes(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let (request_headers, request_bytes) = side(request_body);
        let (response_headers, response_bytes) = side(response_body);
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (path.to_string(), None),
        };
        Self {
            id: None,
            request: RawRequest {
                method: method.to_string(),
                host: String::new(),
                path,
                query,
                headers: request_headers,
                body: request_bytes,
            },
            response: RawResponse {
                status_code,
                headers: response_headers,
                body: response_bytes,
            },
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
