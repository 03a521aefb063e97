//! Diff identity
//!
//! A [`Diff`] is the grouping key: kind plus location, totally ordered and
//! hashable. Everything that varies between interactions (array indices,
//! observed values, the interaction itself) is kept out of it so the same
//! discrepancy seen in a thousand samples collapses to one entry.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ContentType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeMismatch {
    /// A declared, required field is absent from the observed object
    MissingField,
    /// The observed object carries a key the shape does not declare
    UnexpectedField,
    /// The observed value's JSON type is not accepted by the declared shape
    UnmatchedType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiffKind {
    UnmatchedPath,
    UnmatchedRequestContentType,
    UnmatchedStatusCode,
    UnmatchedResponseContentType,
    BodyShapeMismatch(ShapeMismatch),
}

impl DiffKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiffKind::UnmatchedPath => "Unmatched path",
            DiffKind::UnmatchedRequestContentType => "Unmatched request content type",
            DiffKind::UnmatchedStatusCode => "Unmatched status code",
            DiffKind::UnmatchedResponseContentType => "Unmatched response content type",
            DiffKind::BodyShapeMismatch(ShapeMismatch::MissingField) => "Missing field",
            DiffKind::BodyShapeMismatch(ShapeMismatch::UnexpectedField) => "Unexpected field",
            DiffKind::BodyShapeMismatch(ShapeMismatch::UnmatchedType) => "Unmatched type",
        }
    }
}

/// The endpoint a diff belongs to
///
/// `observed_path` is only set for an `UnmatchedPath` whose URL resolves to
/// no declared path, where there is nothing else to name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointRef {
    pub path_id: Option<String>,
    pub method: String,
    pub observed_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiffRegion {
    Url,
    Request {
        content_type: ContentType,
    },
    /// `content_type` is `None` when the status code itself is undeclared
    Response {
        status_code: u16,
        content_type: Option<ContentType>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JsonTrailSegment {
    Field(String),
    /// Any element of an array; indices are collapsed
    Item,
}

/// Position inside an observed body, independent of array indices
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JsonTrail(pub Vec<JsonTrailSegment>);

impl JsonTrail {
    pub fn segments(&self) -> &[JsonTrailSegment] {
        &self.0
    }

    /// Name of the last field on the trail, if it ends at a field
    pub fn last_field(&self) -> Option<&str> {
        match self.0.last() {
            Some(JsonTrailSegment::Field(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for JsonTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                JsonTrailSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                JsonTrailSegment::Field(name) => write!(f, ".{}", name)?,
                JsonTrailSegment::Item => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}

/// One hop through the declared shape graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeTrailStep {
    ObjectField {
        object_shape_id: String,
        field_id: String,
        field_shape_id: String,
    },
    ListItem {
        list_shape_id: String,
        item_shape_id: String,
    },
    OptionalItem {
        shape_id: String,
        inner_shape_id: String,
    },
    NullableItem {
        shape_id: String,
        inner_shape_id: String,
    },
}

impl ShapeTrailStep {
    /// Shape the step lands on
    pub fn target_shape_id(&self) -> &str {
        match self {
            ShapeTrailStep::ObjectField { field_shape_id, .. } => field_shape_id,
            ShapeTrailStep::ListItem { item_shape_id, .. } => item_shape_id,
            ShapeTrailStep::OptionalItem { inner_shape_id, .. }
            | ShapeTrailStep::NullableItem { inner_shape_id, .. } => inner_shape_id,
        }
    }
}

/// Position inside the declared shape graph, from the body's root shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeTrail {
    pub root_shape_id: String,
    pub steps: Vec<ShapeTrailStep>,
}

impl ShapeTrail {
    pub fn new(root_shape_id: impl Into<String>) -> Self {
        Self {
            root_shape_id: root_shape_id.into(),
            steps: Vec::new(),
        }
    }

    /// Shape the trail ends on
    pub fn target_shape_id(&self) -> &str {
        self.steps
            .last()
            .map(ShapeTrailStep::target_shape_id)
            .unwrap_or(&self.root_shape_id)
    }
}

/// Owner of a declared body
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BodyOwner {
    Request { request_id: String },
    Response { response_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyLocation {
    pub owner: BodyOwner,
    pub json_trail: JsonTrail,
    pub shape_trail: ShapeTrail,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiffLocation {
    pub endpoint: EndpointRef,
    pub region: DiffRegion,
    pub body: Option<BodyLocation>,
}

impl fmt::Display for DiffLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            DiffRegion::Url => {
                let path = self
                    .endpoint
                    .observed_path
                    .as_deref()
                    .or(self.endpoint.path_id.as_deref())
                    .unwrap_or("?");
                return write!(f, "url[{} {}]", self.endpoint.method, path);
            }
            DiffRegion::Request { .. } => f.write_str("request")?,
            DiffRegion::Response { status_code, .. } => write!(f, "response[{}]", status_code)?,
        }
        if let Some(body) = &self.body {
            match body.json_trail.0.first() {
                None => {}
                Some(JsonTrailSegment::Item) => write!(f, "{}", body.json_trail)?,
                Some(JsonTrailSegment::Field(_)) => write!(f, ".{}", body.json_trail)?,
            }
        }
        Ok(())
    }
}

/// Structural identity of a discrepancy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diff {
    pub kind: DiffKind,
    pub location: DiffLocation,
}

impl Diff {
    /// Stable textual key covering every identity field
    ///
    /// Used to seed deterministic ids; for messages prefer `Display`.
    pub fn key(&self) -> String {
        format!("{:?}", self)
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind.label(), self.location)
    }
}

/// Concrete position inside one observed body (indices kept)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExampleSegment {
    Key(String),
    Index(usize),
}

/// One diff observed in one interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub diff: Diff,
    pub interaction_id: String,
    /// Where in this interaction's body the discrepancy was seen
    pub example_path: Vec<ExampleSegment>,
}
