use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{Result, SpecDiffError};
use crate::model::{ContentType, ShapeDef, ShapeKind};

/// Path id of the implicit root component (`/`)
pub const ROOT_PATH_ID: &str = "root";

/// One segment of a declared URL path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathComponent {
    pub path_id: String,
    pub parent_path_id: Option<String>,
    pub name: String,
    /// Parameter segments match any concrete value (`/users/{userId}`)
    pub is_parameter: bool,
}

/// Declared body of a request or response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyDescriptor {
    pub content_type: String,
    pub shape_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDef {
    pub request_id: String,
    pub path_id: String,
    pub method: String,
    pub body: Option<BodyDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDef {
    pub response_id: String,
    pub path_id: String,
    pub method: String,
    pub status_code: u16,
    pub body: Option<BodyDescriptor>,
}

/// A batch that was closed by `EndBatchCommit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub batch_id: String,
    pub message: String,
    pub command_count: usize,
}

pub(crate) fn body_content_type(body: &Option<BodyDescriptor>) -> ContentType {
    match body {
        Some(b) => ContentType::media(b.content_type.as_str()),
        None => ContentType::NoBody,
    }
}

impl RequestDef {
    pub fn content_type(&self) -> ContentType {
        body_content_type(&self.body)
    }
}

impl ResponseDef {
    pub fn content_type(&self) -> ContentType {
        body_content_type(&self.body)
    }
}

/// Immutable snapshot of a specification
///
/// Built by replaying a command log through [`apply`](crate::apply::apply).
/// All collections are `BTreeMap`s so iteration order (and therefore diff
/// and suggestion output) is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecState {
    pub(crate) shapes: BTreeMap<String, ShapeDef>,
    pub(crate) paths: BTreeMap<String, PathComponent>,
    pub(crate) requests: BTreeMap<String, RequestDef>,
    pub(crate) responses: BTreeMap<String, ResponseDef>,
    pub(crate) batches: Vec<BatchRecord>,
    pub(crate) open_batch: Option<BatchRecord>,
}

impl Default for SpecState {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecState {
    /// Create an empty specification containing only the root path
    pub fn new() -> Self {
        let mut paths = BTreeMap::new();
        paths.insert(
            ROOT_PATH_ID.to_string(),
            PathComponent {
                path_id: ROOT_PATH_ID.to_string(),
                parent_path_id: None,
                name: String::new(),
                is_parameter: false,
            },
        );
        Self {
            shapes: BTreeMap::new(),
            paths,
            requests: BTreeMap::new(),
            responses: BTreeMap::new(),
            batches: Vec::new(),
            open_batch: None,
        }
    }

    // ----- lookups -----

    /// # Errors
    ///
    /// Returns `ShapeNotFound` if no shape has this id.
    pub fn shape(&self, shape_id: &str) -> Result<&ShapeDef> {
        self.shapes
            .get(shape_id)
            .ok_or_else(|| SpecDiffError::ShapeNotFound {
                shape_id: shape_id.to_string(),
            })
    }

    pub fn has_shape(&self, shape_id: &str) -> bool {
        self.shapes.contains_key(shape_id)
    }

    /// # Errors
    ///
    /// Returns `PathNotFound` if no path component has this id.
    pub fn path(&self, path_id: &str) -> Result<&PathComponent> {
        self.paths
            .get(path_id)
            .ok_or_else(|| SpecDiffError::PathNotFound {
                path_id: path_id.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns `RequestNotFound` if no request has this id.
    pub fn request(&self, request_id: &str) -> Result<&RequestDef> {
        self.requests
            .get(request_id)
            .ok_or_else(|| SpecDiffError::RequestNotFound {
                request_id: request_id.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns `ResponseNotFound` if no response has this id.
    pub fn response(&self, response_id: &str) -> Result<&ResponseDef> {
        self.responses
            .get(response_id)
            .ok_or_else(|| SpecDiffError::ResponseNotFound {
                response_id: response_id.to_string(),
            })
    }

    pub fn shapes(&self) -> impl Iterator<Item = &ShapeDef> {
        self.shapes.values()
    }

    pub fn requests(&self) -> impl Iterator<Item = &RequestDef> {
        self.requests.values()
    }

    pub fn responses(&self) -> impl Iterator<Item = &ResponseDef> {
        self.responses.values()
    }

    /// Committed batches in commit order
    pub fn batches(&self) -> &[BatchRecord] {
        &self.batches
    }

    pub fn open_batch(&self) -> Option<&BatchRecord> {
        self.open_batch.as_ref()
    }

    /// SHA-256 (hex) of the serialized snapshot
    ///
    /// Equal states have equal digests since every collection is ordered.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        if let Ok(bytes) = serde_json::to_vec(self) {
            hasher.update(&bytes);
        }
        hex::encode(hasher.finalize())
    }

    // ----- paths -----

    /// Child components of a path, literal segments first
    pub fn children(&self, parent_path_id: &str) -> Vec<&PathComponent> {
        let mut children: Vec<&PathComponent> = self
            .paths
            .values()
            .filter(|p| p.parent_path_id.as_deref() == Some(parent_path_id))
            .collect();
        children.sort_by(|a, b| {
            a.is_parameter
                .cmp(&b.is_parameter)
                .then_with(|| a.name.cmp(&b.name))
        });
        children
    }

    /// Resolve an observed URL path to a declared path id
    ///
    /// Literal segments win over parameter segments at each level. The query
    /// string, if any, is ignored. Returns `None` when any segment has no
    /// matching child.
    pub fn resolve_path(&self, url_path: &str) -> Option<String> {
        let path = url_path.split('?').next().unwrap_or_default();
        let mut current = ROOT_PATH_ID.to_string();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let children = self.children(&current);
            let next = children
                .iter()
                .find(|c| !c.is_parameter && c.name == segment)
                .or_else(|| children.iter().find(|c| c.is_parameter))?;
            current = next.path_id.clone();
        }
        Some(current)
    }

    /// Render a declared path as a URL template, e.g. `/users/{userId}`
    pub fn full_path(&self, path_id: &str) -> Result<String> {
        let mut segments = Vec::new();
        let mut current = self.path(path_id)?;
        while let Some(parent) = &current.parent_path_id {
            if current.is_parameter {
                segments.push(format!("{{{}}}", current.name));
            } else {
                segments.push(current.name.clone());
            }
            current = self.path(parent)?;
        }
        segments.reverse();
        Ok(format!("/{}", segments.join("/")))
    }

    // ----- endpoints -----

    pub fn requests_for(&self, path_id: &str, method: &str) -> Vec<&RequestDef> {
        self.requests
            .values()
            .filter(|r| r.path_id == path_id && r.method.eq_ignore_ascii_case(method))
            .collect()
    }

    pub fn responses_for(&self, path_id: &str, method: &str) -> Vec<&ResponseDef> {
        self.responses
            .values()
            .filter(|r| r.path_id == path_id && r.method.eq_ignore_ascii_case(method))
            .collect()
    }

    /// Whether anything (request or response) is declared for path + method
    pub fn has_endpoint(&self, path_id: &str, method: &str) -> bool {
        !self.requests_for(path_id, method).is_empty()
            || !self.responses_for(path_id, method).is_empty()
    }

    /// All declared `(path_id, method)` pairs, sorted
    pub fn endpoints(&self) -> BTreeSet<(String, String)> {
        self.requests
            .values()
            .map(|r| (r.path_id.clone(), r.method.clone()))
            .chain(
                self.responses
                    .values()
                    .map(|r| (r.path_id.clone(), r.method.clone())),
            )
            .collect()
    }

    // ----- integrity -----

    /// Verify every shape reference resolves
    ///
    /// Replay through `apply` already rejects dangling references; this check
    /// guards states assembled any other way (e.g. deserialized snapshots).
    ///
    /// # Errors
    ///
    /// Returns `DanglingShapeReference` naming the first missing shape.
    pub fn check_references(&self) -> Result<()> {
        for shape in self.shapes.values() {
            for referenced in shape.kind.referenced_shapes() {
                if !self.has_shape(referenced) {
                    return Err(SpecDiffError::DanglingShapeReference {
                        shape_id: referenced.to_string(),
                        referenced_from: format!("shape {}", shape.shape_id),
                    });
                }
            }
        }
        for request in self.requests.values() {
            if let Some(body) = &request.body {
                if !self.has_shape(&body.shape_id) {
                    return Err(SpecDiffError::DanglingShapeReference {
                        shape_id: body.shape_id.clone(),
                        referenced_from: format!("request {}", request.request_id),
                    });
                }
            }
        }
        for response in self.responses.values() {
            if let Some(body) = &response.body {
                if !self.has_shape(&body.shape_id) {
                    return Err(SpecDiffError::DanglingShapeReference {
                        shape_id: body.shape_id.clone(),
                        referenced_from: format!("response {}", response.response_id),
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether a shape accepts an absent field (follows nullable/optional wrappers)
    pub fn is_optional(&self, shape_id: &str) -> Result<bool> {
        let mut current = shape_id;
        for _ in 0..=self.shapes.len() {
            match &self.shape(current)?.kind {
                ShapeKind::Optional { .. } | ShapeKind::Any => return Ok(true),
                ShapeKind::Nullable { inner } => current = inner,
                _ => return Ok(false),
            }
        }
        Err(SpecDiffError::ShapeCycle {
            shape_id: shape_id.to_string(),
        })
    }

    /// Short human label for a shape, e.g. `String`, `List<Number>`, `Optional<String>`
    pub fn shape_label(&self, shape_id: &str) -> String {
        self.shape_label_depth(shape_id, 0)
    }

    fn shape_label_depth(&self, shape_id: &str, depth: usize) -> String {
        let Ok(shape) = self.shape(shape_id) else {
            return "Unknown".to_string();
        };
        if depth > 4 {
            return shape.kind.label().to_string();
        }
        match &shape.kind {
            ShapeKind::List { item } => format!("List<{}>", self.shape_label_depth(item, depth + 1)),
            ShapeKind::Optional { inner } => {
                format!("Optional<{}>", self.shape_label_depth(inner, depth + 1))
            }
            ShapeKind::Nullable { inner } => {
                format!("Nullable<{}>", self.shape_label_depth(inner, depth + 1))
            }
            ShapeKind::OneOf { variants } => variants
                .iter()
                .map(|v| self.shape_label_depth(v, depth + 1))
                .collect::<Vec<_>>()
                .join(" | "),
            other => other.label().to_string(),
        }
    }
}
