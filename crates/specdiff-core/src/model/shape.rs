use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A declared shape
///
/// Shapes reference each other by id. Composite kinds never embed their
/// children; they point at other entries of [`SpecState`](super::SpecState).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeDef {
    pub shape_id: String,
    pub kind: ShapeKind,
}

/// Structural kind of a shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeKind {
    /// Accepts any JSON value
    Any,
    String,
    Number,
    Boolean,
    Null,
    Object { fields: Vec<FieldDef> },
    List { item: String },
    /// The field may be absent; when present it must match `inner`
    Optional { inner: String },
    /// The value may be `null`; otherwise it must match `inner`
    Nullable { inner: String },
    OneOf { variants: Vec<String> },
}

/// A named field of an object shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub field_id: String,
    pub name: String,
    pub shape_id: String,
}

impl ShapeKind {
    /// Shape ids this kind points at, in declaration order
    pub fn referenced_shapes(&self) -> Vec<&str> {
        match self {
            ShapeKind::Object { fields } => fields.iter().map(|f| f.shape_id.as_str()).collect(),
            ShapeKind::List { item } => vec![item.as_str()],
            ShapeKind::Optional { inner } | ShapeKind::Nullable { inner } => vec![inner.as_str()],
            ShapeKind::OneOf { variants } => variants.iter().map(String::as_str).collect(),
            ShapeKind::Any
            | ShapeKind::String
            | ShapeKind::Number
            | ShapeKind::Boolean
            | ShapeKind::Null => Vec::new(),
        }
    }

    /// Human-facing name of the kind (used in descriptions and suggestion titles)
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Any => "Any",
            ShapeKind::String => "String",
            ShapeKind::Number => "Number",
            ShapeKind::Boolean => "Boolean",
            ShapeKind::Null => "Null",
            ShapeKind::Object { .. } => "Object",
            ShapeKind::List { .. } => "List",
            ShapeKind::Optional { .. } => "Optional",
            ShapeKind::Nullable { .. } => "Nullable",
            ShapeKind::OneOf { .. } => "OneOf",
        }
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldDef> {
        match self {
            ShapeKind::Object { fields } => fields.iter().find(|f| f.field_id == field_id),
            _ => None,
        }
    }

    pub fn field_named(&self, name: &str) -> Option<&FieldDef> {
        match self {
            ShapeKind::Object { fields } => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }
}

/// JSON type of an observed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JsonType {
    String,
    Number,
    Boolean,
    Null,
    Object,
    Array,
}

impl JsonType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => JsonType::String,
            Value::Number(_) => JsonType::Number,
            Value::Bool(_) => JsonType::Boolean,
            Value::Null => JsonType::Null,
            Value::Object(_) => JsonType::Object,
            Value::Array(_) => JsonType::Array,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JsonType::String => "String",
            JsonType::Number => "Number",
            JsonType::Boolean => "Boolean",
            JsonType::Null => "Null",
            JsonType::Object => "Object",
            JsonType::Array => "List",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
