use std::collections::BTreeSet;

use serde_json::Value;

use super::ids::IdAllocator;
use crate::commands::SpecCommand;
use crate::model::{FieldDef, JsonType, ShapeKind};

/// Commands declaring a shape for an observed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredShape {
    pub root_shape_id: String,
    /// `AddShape` commands, children before parents
    pub commands: Vec<SpecCommand>,
}

/// Infer a shape for `value`
///
/// - object fields are declared in sorted key order
/// - an array's item shape covers every element: object elements merge into
///   one object whose fields are the union of theirs, optional where some
///   element lacks them; elements of different JSON types produce a one-of;
///   an empty array produces `Any`
/// - `null` becomes `Nullable<Any>` since the real type is unknown
pub fn infer_shape(value: &Value, ids: &mut IdAllocator) -> InferredShape {
    let mut commands = Vec::new();
    let root_shape_id = infer_values(&[value], ids, &mut commands);
    InferredShape {
        root_shape_id,
        commands,
    }
}

fn declare(ids: &mut IdAllocator, commands: &mut Vec<SpecCommand>, kind: ShapeKind) -> String {
    let shape_id = ids.next_id("shape");
    commands.push(SpecCommand::AddShape {
        shape_id: shape_id.clone(),
        kind,
    });
    shape_id
}

/// One shape accepting all of `values`
fn infer_values(values: &[&Value], ids: &mut IdAllocator, commands: &mut Vec<SpecCommand>) -> String {
    // grouped by JSON type, in order of first appearance
    let mut groups: Vec<(JsonType, Vec<&Value>)> = Vec::new();
    for value in values {
        let json_type = JsonType::of(value);
        match groups.iter_mut().find(|(t, _)| *t == json_type) {
            Some((_, members)) => members.push(*value),
            None => groups.push((json_type, vec![*value])),
        }
    }
    match groups.as_slice() {
        [] => declare(ids, commands, ShapeKind::Any),
        [(json_type, members)] => infer_group(*json_type, members, ids, commands),
        many => {
            let variants = many
                .iter()
                .map(|(json_type, members)| infer_group(*json_type, members, ids, commands))
                .collect();
            declare(ids, commands, ShapeKind::OneOf { variants })
        }
    }
}

fn infer_group(
    json_type: JsonType,
    members: &[&Value],
    ids: &mut IdAllocator,
    commands: &mut Vec<SpecCommand>,
) -> String {
    match json_type {
        JsonType::String => declare(ids, commands, ShapeKind::String),
        JsonType::Number => declare(ids, commands, ShapeKind::Number),
        JsonType::Boolean => declare(ids, commands, ShapeKind::Boolean),
        JsonType::Null => {
            let inner = declare(ids, commands, ShapeKind::Any);
            declare(ids, commands, ShapeKind::Nullable { inner })
        }
        JsonType::Array => {
            let elements: Vec<&Value> = members
                .iter()
                .filter_map(|m| m.as_array())
                .flatten()
                .collect();
            let item = infer_values(&elements, ids, commands);
            declare(ids, commands, ShapeKind::List { item })
        }
        JsonType::Object => {
            let objects: Vec<&serde_json::Map<String, Value>> =
                members.iter().filter_map(|m| m.as_object()).collect();
            let keys: BTreeSet<&String> = objects.iter().flat_map(|o| o.keys()).collect();
            let mut fields = Vec::with_capacity(keys.len());
            for key in keys {
                let present: Vec<&Value> = objects.iter().filter_map(|o| o.get(key.as_str())).collect();
                let mut shape_id = infer_values(&present, ids, commands);
                if present.len() < objects.len() {
                    shape_id = declare(ids, commands, ShapeKind::Optional { inner: shape_id });
                }
                fields.push(FieldDef {
                    field_id: ids.next_id("field"),
                    name: key.clone(),
                    shape_id,
                });
            }
            declare(ids, commands, ShapeKind::Object { fields })
        }
    }
}
