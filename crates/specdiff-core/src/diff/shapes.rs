//! Structural comparison of an observed JSON body against a declared shape

use serde_json::Value;

use super::model::{ExampleSegment, JsonTrail, JsonTrailSegment, ShapeMismatch, ShapeTrail, ShapeTrailStep};
use crate::errors::{Result, SpecDiffError};
use crate::model::{JsonType, ShapeDef, ShapeKind, SpecState};

/// One body discrepancy, before it is placed on an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeDiff {
    pub mismatch: ShapeMismatch,
    pub json_trail: JsonTrail,
    pub shape_trail: ShapeTrail,
    pub example_path: Vec<ExampleSegment>,
}

#[derive(Clone)]
struct Cursor {
    json: Vec<JsonTrailSegment>,
    steps: Vec<ShapeTrailStep>,
    example: Vec<ExampleSegment>,
}

struct ShapeWalker<'a> {
    spec: &'a SpecState,
    root_shape_id: &'a str,
    referenced_from: &'a str,
    /// Wrapper hops allowed without consuming any of the value
    max_wrapper_depth: usize,
}

impl<'a> ShapeWalker<'a> {
    fn shape(&self, shape_id: &str) -> Result<&'a ShapeDef> {
        self.spec
            .shape(shape_id)
            .map_err(|_| SpecDiffError::DanglingShapeReference {
                shape_id: shape_id.to_string(),
                referenced_from: self.referenced_from.to_string(),
            })
    }

    fn emit(&self, out: &mut Vec<ShapeDiff>, mismatch: ShapeMismatch, cursor: &Cursor) {
        out.push(ShapeDiff {
            mismatch,
            json_trail: JsonTrail(cursor.json.clone()),
            shape_trail: ShapeTrail {
                root_shape_id: self.root_shape_id.to_string(),
                steps: cursor.steps.clone(),
            },
            example_path: cursor.example.clone(),
        });
    }

    fn walk(
        &self,
        shape_id: &str,
        value: &Value,
        cursor: &mut Cursor,
        wrapper_depth: usize,
        out: &mut Vec<ShapeDiff>,
    ) -> Result<()> {
        if wrapper_depth > self.max_wrapper_depth {
            return Err(SpecDiffError::ShapeCycle {
                shape_id: shape_id.to_string(),
            });
        }
        let shape = self.shape(shape_id)?;
        let observed = JsonType::of(value);

        match &shape.kind {
            ShapeKind::Any => {}
            ShapeKind::String | ShapeKind::Number | ShapeKind::Boolean | ShapeKind::Null => {
                if !primitive_accepts(&shape.kind, observed) {
                    self.emit(out, ShapeMismatch::UnmatchedType, cursor);
                }
            }
            ShapeKind::Object { fields } => {
                let Value::Object(map) = value else {
                    self.emit(out, ShapeMismatch::UnmatchedType, cursor);
                    return Ok(());
                };
                for field in fields {
                    cursor.json.push(JsonTrailSegment::Field(field.name.clone()));
                    cursor.steps.push(ShapeTrailStep::ObjectField {
                        object_shape_id: shape.shape_id.clone(),
                        field_id: field.field_id.clone(),
                        field_shape_id: field.shape_id.clone(),
                    });
                    match map.get(&field.name) {
                        Some(field_value) => {
                            cursor.example.push(ExampleSegment::Key(field.name.clone()));
                            self.walk(&field.shape_id, field_value, cursor, 0, out)?;
                            cursor.example.pop();
                        }
                        None => {
                            // make sure the field shape resolves before asking about optionality
                            self.shape(&field.shape_id)?;
                            if !self.spec.is_optional(&field.shape_id)? {
                                self.emit(out, ShapeMismatch::MissingField, cursor);
                            }
                        }
                    }
                    cursor.steps.pop();
                    cursor.json.pop();
                }
                for key in map.keys() {
                    if fields.iter().any(|f| &f.name == key) {
                        continue;
                    }
                    cursor.json.push(JsonTrailSegment::Field(key.clone()));
                    cursor.example.push(ExampleSegment::Key(key.clone()));
                    self.emit(out, ShapeMismatch::UnexpectedField, cursor);
                    cursor.example.pop();
                    cursor.json.pop();
                }
            }
            ShapeKind::List { item } => {
                let Value::Array(items) = value else {
                    self.emit(out, ShapeMismatch::UnmatchedType, cursor);
                    return Ok(());
                };
                cursor.json.push(JsonTrailSegment::Item);
                cursor.steps.push(ShapeTrailStep::ListItem {
                    list_shape_id: shape.shape_id.clone(),
                    item_shape_id: item.clone(),
                });
                for (index, element) in items.iter().enumerate() {
                    cursor.example.push(ExampleSegment::Index(index));
                    self.walk(item, element, cursor, 0, out)?;
                    cursor.example.pop();
                }
                cursor.steps.pop();
                cursor.json.pop();
            }
            ShapeKind::Optional { inner } => {
                cursor.steps.push(ShapeTrailStep::OptionalItem {
                    shape_id: shape.shape_id.clone(),
                    inner_shape_id: inner.clone(),
                });
                self.walk(inner, value, cursor, wrapper_depth + 1, out)?;
                cursor.steps.pop();
            }
            ShapeKind::Nullable { inner } => {
                if observed != JsonType::Null {
                    cursor.steps.push(ShapeTrailStep::NullableItem {
                        shape_id: shape.shape_id.clone(),
                        inner_shape_id: inner.clone(),
                    });
                    self.walk(inner, value, cursor, wrapper_depth + 1, out)?;
                    cursor.steps.pop();
                }
            }
            ShapeKind::OneOf { variants } => {
                let mut matched = false;
                for variant in variants {
                    let mut scratch = Vec::new();
                    let mut variant_cursor = cursor.clone();
                    self.walk(variant, value, &mut variant_cursor, wrapper_depth + 1, &mut scratch)?;
                    if scratch.is_empty() {
                        matched = true;
                        break;
                    }
                }
                if !matched {
                    self.emit(out, ShapeMismatch::UnmatchedType, cursor);
                }
            }
        }
        Ok(())
    }
}

fn primitive_accepts(kind: &ShapeKind, observed: JsonType) -> bool {
    matches!(
        (kind, observed),
        (ShapeKind::String, JsonType::String)
            | (ShapeKind::Number, JsonType::Number)
            | (ShapeKind::Boolean, JsonType::Boolean)
            | (ShapeKind::Null, JsonType::Null)
    )
}

/// Compare `value` against the shape `root_shape_id`
///
/// Results are in walk order: declared fields first (declaration order), then
/// undeclared keys. Array elements are all visited, so the same discrepancy
/// can appear once per element; callers deduplicate.
///
/// # Errors
///
/// * `DanglingShapeReference` - a shape on the walked path does not exist
/// * `ShapeCycle` - wrapper shapes loop without consuming the value
pub fn diff_body(
    spec: &SpecState,
    root_shape_id: &str,
    value: &Value,
    referenced_from: &str,
) -> Result<Vec<ShapeDiff>> {
    let walker = ShapeWalker {
        spec,
        root_shape_id,
        referenced_from,
        max_wrapper_depth: spec.shapes().count() + 1,
    };
    let mut cursor = Cursor {
        json: Vec::new(),
        steps: Vec::new(),
        example: Vec::new(),
    };
    let mut out = Vec::new();
    walker.walk(root_shape_id, value, &mut cursor, 0, &mut out)?;
    Ok(out)
}
