use super::validate_name;
use crate::errors::{Result, SpecDiffError};
use crate::model::{PathComponent, SpecState};

/// Add a path segment below an existing component
///
/// A parent may hold any number of literal children with distinct names but
/// at most one parameter child, otherwise URL resolution would be ambiguous.
///
/// # Errors
/// * `InvalidName` - If the segment name is blank or contains `/`
/// * `PathAlreadyExists` - If `path_id` is taken
/// * `PathNotFound` - If the parent does not exist
/// * `DuplicatePathSegment` - If the parent already has an equivalent child
pub fn add_path_component(
    state: &mut SpecState,
    path_id: String,
    parent_path_id: String,
    name: String,
    is_parameter: bool,
) -> Result<()> {
    validate_name(&name, "Path segment")?;

    if state.paths.contains_key(&path_id) {
        return Err(SpecDiffError::PathAlreadyExists { path_id });
    }
    state.path(&parent_path_id)?;

    let clash = state.children(&parent_path_id).into_iter().any(|child| {
        if is_parameter {
            child.is_parameter
        } else {
            !child.is_parameter && child.name == name
        }
    });
    if clash {
        return Err(SpecDiffError::DuplicatePathSegment {
            parent_path_id,
            name,
        });
    }

    state.paths.insert(
        path_id.clone(),
        PathComponent {
            path_id,
            parent_path_id: Some(parent_path_id),
            name,
            is_parameter,
        },
    );
    Ok(())
}
