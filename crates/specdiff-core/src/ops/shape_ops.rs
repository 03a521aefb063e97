use std::collections::BTreeSet;

use super::validate_name;
use crate::errors::{Result, SpecDiffError};
use crate::model::{FieldDef, ShapeDef, ShapeKind, SpecState};

fn require_shape(state: &SpecState, shape_id: &str) -> Result<()> {
    state.shape(shape_id).map(|_| ())
}

fn reject_self_reference(shape_id: &str, referenced: &str) -> Result<()> {
    if shape_id == referenced {
        return Err(SpecDiffError::SelfReference {
            shape_id: shape_id.to_string(),
        });
    }
    Ok(())
}

fn object_fields_mut<'a>(state: &'a mut SpecState, shape_id: &str) -> Result<&'a mut Vec<FieldDef>> {
    let shape = state
        .shapes
        .get_mut(shape_id)
        .ok_or_else(|| SpecDiffError::ShapeNotFound {
            shape_id: shape_id.to_string(),
        })?;
    match &mut shape.kind {
        ShapeKind::Object { fields } => Ok(fields),
        _ => Err(SpecDiffError::NotAnObject {
            shape_id: shape_id.to_string(),
        }),
    }
}

/// Declare a new shape
///
/// Every shape the kind references must already exist, so a log replayed in
/// order can never contain a dangling reference.
///
/// # Errors
/// * `ShapeAlreadyExists` - If `shape_id` is taken
/// * `SelfReference` - If the kind points at `shape_id`
/// * `ShapeNotFound` - If a referenced shape does not exist
/// * `FieldAlreadyExists` - If an object kind repeats a field id or name
pub fn add_shape(state: &mut SpecState, shape_id: String, kind: ShapeKind) -> Result<()> {
    if state.has_shape(&shape_id) {
        return Err(SpecDiffError::ShapeAlreadyExists { shape_id });
    }
    for referenced in kind.referenced_shapes() {
        reject_self_reference(&shape_id, referenced)?;
        require_shape(state, referenced)?;
    }
    if let ShapeKind::Object { fields } = &kind {
        let mut ids = BTreeSet::new();
        let mut names = BTreeSet::new();
        for field in fields {
            validate_name(&field.name, "Field")?;
            if !ids.insert(field.field_id.as_str()) || !names.insert(field.name.as_str()) {
                return Err(SpecDiffError::FieldAlreadyExists {
                    shape_id: shape_id.clone(),
                    field_id: field.field_id.clone(),
                });
            }
        }
    }
    state
        .shapes
        .insert(shape_id.clone(), ShapeDef { shape_id, kind });
    Ok(())
}

/// Append a field to an object shape
///
/// # Errors
/// * `InvalidName` - If the field name is blank or contains `/`
/// * `ShapeNotFound` - If the object or the field shape does not exist
/// * `NotAnObject` - If `shape_id` is not an object
/// * `FieldAlreadyExists` - If the field id or name is already used on this object
pub fn add_field(
    state: &mut SpecState,
    shape_id: &str,
    field_id: String,
    name: String,
    field_shape_id: String,
) -> Result<()> {
    validate_name(&name, "Field")?;
    reject_self_reference(shape_id, &field_shape_id)?;
    require_shape(state, &field_shape_id)?;

    let fields = object_fields_mut(state, shape_id)?;
    if fields
        .iter()
        .any(|f| f.field_id == field_id || f.name == name)
    {
        return Err(SpecDiffError::FieldAlreadyExists {
            shape_id: shape_id.to_string(),
            field_id,
        });
    }
    fields.push(FieldDef {
        field_id,
        name,
        shape_id: field_shape_id,
    });
    Ok(())
}

/// # Errors
/// * `ShapeNotFound` / `NotAnObject` / `FieldNotFound` - If the target does not resolve
pub fn set_field_shape(
    state: &mut SpecState,
    shape_id: &str,
    field_id: &str,
    field_shape_id: String,
) -> Result<()> {
    reject_self_reference(shape_id, &field_shape_id)?;
    require_shape(state, &field_shape_id)?;

    let fields = object_fields_mut(state, shape_id)?;
    let field = fields
        .iter_mut()
        .find(|f| f.field_id == field_id)
        .ok_or_else(|| SpecDiffError::FieldNotFound {
            shape_id: shape_id.to_string(),
            field_id: field_id.to_string(),
        })?;
    field.shape_id = field_shape_id;
    Ok(())
}

/// # Errors
/// * `ShapeNotFound` / `NotAnObject` / `FieldNotFound` - If the target does not resolve
pub fn remove_field(state: &mut SpecState, shape_id: &str, field_id: &str) -> Result<()> {
    let fields = object_fields_mut(state, shape_id)?;
    let before = fields.len();
    fields.retain(|f| f.field_id != field_id);
    if fields.len() == before {
        return Err(SpecDiffError::FieldNotFound {
            shape_id: shape_id.to_string(),
            field_id: field_id.to_string(),
        });
    }
    Ok(())
}

/// # Errors
/// * `ShapeNotFound` - If either shape does not exist
/// * `NotAList` - If `shape_id` is not a list
pub fn set_list_item_shape(state: &mut SpecState, shape_id: &str, item_shape_id: String) -> Result<()> {
    reject_self_reference(shape_id, &item_shape_id)?;
    require_shape(state, &item_shape_id)?;

    let shape = state
        .shapes
        .get_mut(shape_id)
        .ok_or_else(|| SpecDiffError::ShapeNotFound {
            shape_id: shape_id.to_string(),
        })?;
    match &mut shape.kind {
        ShapeKind::List { item } => {
            *item = item_shape_id;
            Ok(())
        }
        _ => Err(SpecDiffError::NotAList {
            shape_id: shape_id.to_string(),
        }),
    }
}

/// # Errors
/// * `ShapeNotFound` - If either shape does not exist
/// * `NotAWrapper` - If `shape_id` is neither optional nor nullable
pub fn set_wrapped_shape(
    state: &mut SpecState,
    shape_id: &str,
    inner_shape_id: String,
) -> Result<()> {
    reject_self_reference(shape_id, &inner_shape_id)?;
    require_shape(state, &inner_shape_id)?;

    let shape = state
        .shapes
        .get_mut(shape_id)
        .ok_or_else(|| SpecDiffError::ShapeNotFound {
            shape_id: shape_id.to_string(),
        })?;
    match &mut shape.kind {
        ShapeKind::Optional { inner } | ShapeKind::Nullable { inner } => {
            *inner = inner_shape_id;
            Ok(())
        }
        _ => Err(SpecDiffError::NotAWrapper {
            shape_id: shape_id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_object() -> SpecState {
        let mut state = SpecState::new();
        add_shape(&mut state, "s_str".into(), ShapeKind::String).unwrap();
        add_shape(&mut state, "s_obj".into(), ShapeKind::Object { fields: vec![] }).unwrap();
        add_field(&mut state, "s_obj", "f_id".into(), "id".into(), "s_str".into()).unwrap();
        state
    }

    #[test]
    fn test_add_shape_rejects_unknown_reference() {
        let mut state = SpecState::new();
        let err = add_shape(
            &mut state,
            "s_list".into(),
            ShapeKind::List {
                item: "missing".into(),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            SpecDiffError::ShapeNotFound {
                shape_id: "missing".into()
            }
        );
        assert!(!state.has_shape("s_list"));
    }

    #[test]
    fn test_duplicate_field_name_rejected() {
        let mut state = state_with_object();
        let err = add_field(&mut state, "s_obj", "f_other".into(), "id".into(), "s_str".into())
            .unwrap_err();
        assert!(matches!(err, SpecDiffError::FieldAlreadyExists { .. }));
    }

    #[test]
    fn test_remove_unknown_field_is_not_found() {
        let mut state = state_with_object();
        remove_field(&mut state, "s_obj", "f_id").unwrap();
        let err = remove_field(&mut state, "s_obj", "f_id").unwrap_err();
        assert!(matches!(err, SpecDiffError::FieldNotFound { .. }));
    }

    #[test]
    fn test_set_wrapped_shape_requires_wrapper() {
        let mut state = state_with_object();
        add_shape(&mut state, "s_num".into(), ShapeKind::Number).unwrap();
        let err = set_wrapped_shape(&mut state, "s_str", "s_num".into()).unwrap_err();
        assert!(matches!(err, SpecDiffError::NotAWrapper { .. }));

        add_shape(
            &mut state,
            "s_opt".into(),
            ShapeKind::Optional {
                inner: "s_str".into(),
            },
        )
        .unwrap();
        set_wrapped_shape(&mut state, "s_opt", "s_num".into()).unwrap();
        assert_eq!(
            state.shape("s_opt").unwrap().kind,
            ShapeKind::Optional {
                inner: "s_num".into()
            }
        );
    }

    #[test]
    fn test_list_item_cannot_reference_itself() {
        let mut state = state_with_object();
        add_shape(
            &mut state,
            "s_list".into(),
            ShapeKind::List {
                item: "s_str".into(),
            },
        )
        .unwrap();
        let err = set_list_item_shape(&mut state, "s_list", "s_list".into()).unwrap_err();
        assert!(matches!(err, SpecDiffError::SelfReference { .. }));
    }
}
