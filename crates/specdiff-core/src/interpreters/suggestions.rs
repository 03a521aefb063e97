use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::locate;
use crate::commands::SpecCommand;
use crate::diff::{BodyOwner, Diff, DiffKind, DiffRegion, ShapeMismatch, ShapeTrailStep};
use crate::errors::{Result, SpecDiffError};
use crate::interactions::{Interaction, ObservedBody};
use crate::model::{ContentType, JsonType, ShapeKind, SpecState, ROOT_PATH_ID};
use crate::shapes::{infer_shape, IdAllocator};

/// A named command sequence that resolves one diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub commands: Vec<SpecCommand>,
}

impl Suggestion {
    fn new(title: impl Into<String>, commands: Vec<SpecCommand>) -> Self {
        Self {
            title: title.into(),
            commands,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestOptions {
    /// Treat numeric and UUID-like URL segments as path parameters
    pub infer_path_parameters: bool,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            infer_path_parameters: true,
        }
    }
}

/// Suggest ways to resolve `diff`, best first
///
/// # Errors
///
/// Returns `DiffNotFound` if the interaction does not exhibit the diff, or a
/// configuration error if the specification cannot be walked.
pub fn suggest(spec: &SpecState, diff: &Diff, interaction: &Interaction) -> Result<Vec<Suggestion>> {
    suggest_with(spec, diff, interaction, &SuggestOptions::default())
}

/// [`suggest`] with explicit options
///
/// # Errors
///
/// See [`suggest`].
pub fn suggest_with(
    spec: &SpecState,
    diff: &Diff,
    interaction: &Interaction,
    options: &SuggestOptions,
) -> Result<Vec<Suggestion>> {
    let located = locate(spec, diff, interaction)?;
    let key = diff.key();
    // a diff can recur after earlier changes; the state keeps its new ids fresh
    let state = spec.digest();
    let ids = IdAllocator::seeded(&[&key, &interaction.id, &state]);
    let observed = located.observed;

    let suggestions = match diff.kind {
        DiffKind::BodyShapeMismatch(ShapeMismatch::MissingField) => missing_field(diff, &ids)?,
        DiffKind::BodyShapeMismatch(ShapeMismatch::UnexpectedField) => {
            unexpected_field(diff, observed, &ids)?
        }
        DiffKind::BodyShapeMismatch(ShapeMismatch::UnmatchedType) => {
            unmatched_type(spec, diff, observed, &ids)?
        }
        DiffKind::UnmatchedRequestContentType => {
            let path_id = declared_path(diff)?;
            let mut ids = ids.fork("request");
            let mut commands = Vec::new();
            let title = match &interaction.request.content_type {
                ContentType::NoBody => "Document request without a body".to_string(),
                ContentType::Media(media) => format!("Document {} request body", media),
            };
            document_request(&mut commands, &mut ids, path_id, &interaction.method, &interaction.request);
            vec![Suggestion::new(title, commands)]
        }
        DiffKind::UnmatchedStatusCode | DiffKind::UnmatchedResponseContentType => {
            let path_id = declared_path(diff)?;
            let mut ids = ids.fork("response");
            let mut commands = Vec::new();
            document_response(&mut commands, &mut ids, path_id, interaction);
            let title = match (&diff.kind, &interaction.response.content_type) {
                (DiffKind::UnmatchedStatusCode, _) => {
                    format!("Document {} response", interaction.status_code)
                }
                (_, ContentType::NoBody) => {
                    format!("Document {} response without a body", interaction.status_code)
                }
                (_, ContentType::Media(media)) => {
                    format!("Document {} body for {} response", media, interaction.status_code)
                }
            };
            vec![Suggestion::new(title, commands)]
        }
        DiffKind::UnmatchedPath => vec![unmatched_path(spec, interaction, &ids, options)],
    };
    Ok(suggestions)
}

fn declared_path(diff: &Diff) -> Result<&str> {
    diff.location
        .endpoint
        .path_id
        .as_deref()
        .ok_or_else(|| SpecDiffError::DiffNotFound {
            diff: diff.to_string(),
        })
}

fn body_location(diff: &Diff) -> Result<&crate::diff::BodyLocation> {
    diff.location
        .body
        .as_ref()
        .ok_or_else(|| SpecDiffError::DiffNotFound {
            diff: diff.to_string(),
        })
}

fn missing_field(diff: &Diff, ids: &IdAllocator) -> Result<Vec<Suggestion>> {
    let body = body_location(diff)?;
    let Some(ShapeTrailStep::ObjectField {
        object_shape_id,
        field_id,
        field_shape_id,
    }) = body.shape_trail.steps.last()
    else {
        return Err(SpecDiffError::DiffNotFound {
            diff: diff.to_string(),
        });
    };
    let name = body.json_trail.last_field().unwrap_or(field_id);
    let optional_id = ids.fork("optional").next_id("shape");

    Ok(vec![
        Suggestion::new(
            format!("Make field `{}` optional", name),
            vec![
                SpecCommand::AddShape {
                    shape_id: optional_id.clone(),
                    kind: ShapeKind::Optional {
                        inner: field_shape_id.clone(),
                    },
                },
                SpecCommand::SetFieldShape {
                    shape_id: object_shape_id.clone(),
                    field_id: field_id.clone(),
                    field_shape_id: optional_id,
                },
            ],
        ),
        Suggestion::new(
            format!("Remove field `{}`", name),
            vec![SpecCommand::RemoveField {
                shape_id: object_shape_id.clone(),
                field_id: field_id.clone(),
            }],
        ),
    ])
}

/// Declare an observed but undeclared field, optional first
///
/// "Make optional" and "remove" only make sense for a declared field that is
/// missing (see [`missing_field`]); an unexpected field has nothing to make
/// optional or remove, so its alternatives are adding it optional or required.
fn unexpected_field(diff: &Diff, observed: Option<&Value>, ids: &IdAllocator) -> Result<Vec<Suggestion>> {
    let body = body_location(diff)?;
    let object_shape_id = body.shape_trail.target_shape_id();
    let name = body.json_trail.last_field().ok_or_else(|| SpecDiffError::DiffNotFound {
        diff: diff.to_string(),
    })?;
    let value = observed.cloned().unwrap_or(Value::Null);

    let add_field = |label: &str, optional: bool| {
        let mut ids = ids.fork(label);
        let inferred = infer_shape(&value, &mut ids);
        let mut commands = inferred.commands;
        let mut field_shape_id = inferred.root_shape_id;
        if optional {
            let optional_id = ids.next_id("shape");
            commands.push(SpecCommand::AddShape {
                shape_id: optional_id.clone(),
                kind: ShapeKind::Optional {
                    inner: field_shape_id,
                },
            });
            field_shape_id = optional_id;
        }
        commands.push(SpecCommand::AddField {
            shape_id: object_shape_id.to_string(),
            field_id: ids.next_id("field"),
            name: name.to_string(),
            field_shape_id,
        });
        commands
    };

    Ok(vec![
        Suggestion::new(
            format!("Add `{}` as an optional field", name),
            add_field("optional", true),
        ),
        Suggestion::new(
            format!("Add `{}` as a required field", name),
            add_field("required", false),
        ),
    ])
}

/// Command pointing whatever holds the trail's target at `new_shape_id`
fn retarget(diff: &Diff, new_shape_id: String) -> Result<SpecCommand> {
    let body = body_location(diff)?;
    let command = match body.shape_trail.steps.last() {
        Some(ShapeTrailStep::ObjectField {
            object_shape_id,
            field_id,
            ..
        }) => SpecCommand::SetFieldShape {
            shape_id: object_shape_id.clone(),
            field_id: field_id.clone(),
            field_shape_id: new_shape_id,
        },
        Some(ShapeTrailStep::ListItem { list_shape_id, .. }) => SpecCommand::SetListItemShape {
            shape_id: list_shape_id.clone(),
            item_shape_id: new_shape_id,
        },
        Some(ShapeTrailStep::OptionalItem { shape_id, .. })
        | Some(ShapeTrailStep::NullableItem { shape_id, .. }) => SpecCommand::SetWrappedShape {
            shape_id: shape_id.clone(),
            inner_shape_id: new_shape_id,
        },
        None => {
            let content_type = match &diff.location.region {
                DiffRegion::Request { content_type }
                | DiffRegion::Response {
                    content_type: Some(content_type),
                    ..
                } => content_type.to_string(),
                _ => {
                    return Err(SpecDiffError::DiffNotFound {
                        diff: diff.to_string(),
                    });
                }
            };
            match &body.owner {
                BodyOwner::Request { request_id } => SpecCommand::SetRequestBodyShape {
                    request_id: request_id.clone(),
                    content_type,
                    shape_id: new_shape_id,
                },
                BodyOwner::Response { response_id } => SpecCommand::SetResponseBodyShape {
                    response_id: response_id.clone(),
                    content_type,
                    shape_id: new_shape_id,
                },
            }
        }
    };
    Ok(command)
}

fn unmatched_type(
    spec: &SpecState,
    diff: &Diff,
    observed: Option<&Value>,
    ids: &IdAllocator,
) -> Result<Vec<Suggestion>> {
    let body = body_location(diff)?;
    let target = body.shape_trail.target_shape_id();
    let expected = spec.shape_label(target);
    let trail = body.json_trail.to_string();
    let subject = if trail.is_empty() { "body".to_string() } else { trail };
    let value = observed.cloned().unwrap_or(Value::Null);
    let observed_type = JsonType::of(&value);

    let mut suggestions = Vec::new();

    // widen: keep the declared shape and also accept the observed one
    let mut widen_ids = ids.fork("widen");
    let mut widen = Vec::new();
    let widened_id = widen_ids.next_id("shape");
    if observed_type == JsonType::Null {
        widen.push(SpecCommand::AddShape {
            shape_id: widened_id.clone(),
            kind: ShapeKind::Nullable {
                inner: target.to_string(),
            },
        });
        widen.push(retarget(diff, widened_id)?);
        suggestions.push(Suggestion::new(format!("Make `{}` nullable", subject), widen));
    } else {
        let inferred = infer_shape(&value, &mut widen_ids);
        widen.extend(inferred.commands);
        let mut variants = match &spec.shape(target)?.kind {
            ShapeKind::OneOf { variants } => variants.clone(),
            _ => vec![target.to_string()],
        };
        variants.push(inferred.root_shape_id);
        widen.push(SpecCommand::AddShape {
            shape_id: widened_id.clone(),
            kind: ShapeKind::OneOf { variants },
        });
        widen.push(retarget(diff, widened_id)?);
        suggestions.push(Suggestion::new(
            format!("Change `{}` to {} or {}", subject, expected, observed_type),
            widen,
        ));
    }

    // replace: forget the declared shape
    let mut replace_ids = ids.fork("replace");
    let inferred = infer_shape(&value, &mut replace_ids);
    let mut replace = inferred.commands;
    replace.push(retarget(diff, inferred.root_shape_id)?);
    suggestions.push(Suggestion::new(
        format!("Replace `{}` with {}", subject, observed_type),
        replace,
    ));

    Ok(suggestions)
}

fn declare_body(ids: &mut IdAllocator, commands: &mut Vec<SpecCommand>, body: &ObservedBody) -> Option<(String, String)> {
    let media = body.content_type.as_media()?;
    let inferred = match &body.value {
        Some(value) => infer_shape(value, ids),
        None => {
            let shape_id = ids.next_id("shape");
            crate::shapes::InferredShape {
                commands: vec![SpecCommand::AddShape {
                    shape_id: shape_id.clone(),
                    kind: ShapeKind::Any,
                }],
                root_shape_id: shape_id,
            }
        }
    };
    commands.extend(inferred.commands);
    Some((media.to_string(), inferred.root_shape_id))
}

fn document_request(
    commands: &mut Vec<SpecCommand>,
    ids: &mut IdAllocator,
    path_id: &str,
    method: &str,
    body: &ObservedBody,
) {
    let request_id = ids.next_id("request");
    let declared = declare_body(ids, commands, body);
    commands.push(SpecCommand::AddRequest {
        request_id: request_id.clone(),
        path_id: path_id.to_string(),
        method: method.to_string(),
    });
    if let Some((content_type, shape_id)) = declared {
        commands.push(SpecCommand::SetRequestBodyShape {
            request_id,
            content_type,
            shape_id,
        });
    }
}

fn document_response(
    commands: &mut Vec<SpecCommand>,
    ids: &mut IdAllocator,
    path_id: &str,
    interaction: &Interaction,
) {
    let response_id = ids.next_id("response");
    let declared = declare_body(ids, commands, &interaction.response);
    commands.push(SpecCommand::AddResponse {
        response_id: response_id.clone(),
        path_id: path_id.to_string(),
        method: interaction.method.clone(),
        status_code: interaction.status_code,
    });
    if let Some((content_type, shape_id)) = declared {
        commands.push(SpecCommand::SetResponseBodyShape {
            response_id,
            content_type,
            shape_id,
        });
    }
}

fn looks_like_parameter(segment: &str) -> bool {
    let is_number = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());
    let is_uuid = segment.len() == 36
        && segment.chars().enumerate().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        });
    is_number || is_uuid
}

fn parameter_name(previous: Option<&str>) -> String {
    match previous {
        Some(prev) if !prev.is_empty() => {
            let singular = prev.strip_suffix('s').unwrap_or(prev);
            format!("{}Id", singular)
        }
        _ => "id".to_string(),
    }
}

fn unmatched_path(
    spec: &SpecState,
    interaction: &Interaction,
    ids: &IdAllocator,
    options: &SuggestOptions,
) -> Suggestion {
    let mut ids = ids.fork("path");
    let mut commands = Vec::new();
    let mut template = Vec::new();
    let mut current = ROOT_PATH_ID.to_string();
    let mut creating = false;
    let mut previous: Option<&str> = None;

    for segment in interaction.path.split('/').filter(|s| !s.is_empty()) {
        if !creating {
            let children = spec.children(&current);
            let existing = children
                .iter()
                .find(|c| !c.is_parameter && c.name == segment)
                .or_else(|| children.iter().find(|c| c.is_parameter));
            if let Some(child) = existing {
                template.push(if child.is_parameter {
                    format!("{{{}}}", child.name)
                } else {
                    child.name.clone()
                });
                current = child.path_id.clone();
                previous = Some(segment);
                continue;
            }
            creating = true;
        }

        let path_id = ids.next_id("path");
        if options.infer_path_parameters && looks_like_parameter(segment) {
            let name = parameter_name(previous);
            template.push(format!("{{{}}}", name));
            commands.push(SpecCommand::AddPathParameter {
                path_id: path_id.clone(),
                parent_path_id: current,
                name,
            });
        } else {
            template.push(segment.to_string());
            commands.push(SpecCommand::AddPathComponent {
                path_id: path_id.clone(),
                parent_path_id: current,
                name: segment.to_string(),
            });
        }
        current = path_id;
        previous = Some(segment);
    }

    document_request(&mut commands, &mut ids, &current, &interaction.method, &interaction.request);
    document_response(&mut commands, &mut ids, &current, interaction);

    Suggestion::new(
        format!("Document {} /{}", interaction.method, template.join("/")),
        commands,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_all;
    use crate::apply::build;
    use crate::diff::compute_diffs;
    use crate::interactions::{normalize, NormalizeOptions, RawInteraction};
    use crate::model::FieldDef;
    use serde_json::json;

    fn spec() -> SpecState {
        build(&[
            SpecCommand::AddPathComponent {
                path_id: "p_users".into(),
                parent_path_id: ROOT_PATH_ID.into(),
                name: "users".into(),
            },
            SpecCommand::AddShape {
                shape_id: "s_str".into(),
                kind: ShapeKind::String,
            },
            SpecCommand::AddShape {
                shape_id: "s_obj".into(),
                kind: ShapeKind::Object {
                    fields: vec![
                        FieldDef {
                            field_id: "f_id".into(),
                            name: "id".into(),
                            shape_id: "s_str".into(),
                        },
                        FieldDef {
                            field_id: "f_name".into(),
                            name: "name".into(),
                            shape_id: "s_str".into(),
                        },
                    ],
                },
            },
            SpecCommand::AddResponse {
                response_id: "r_200".into(),
                path_id: "p_users".into(),
                method: "GET".into(),
                status_code: 200,
            },
            SpecCommand::SetResponseBodyShape {
                response_id: "r_200".into(),
                content_type: "application/json".into(),
                shape_id: "s_obj".into(),
            },
        ])
        .unwrap()
    }

    fn observe(method: &str, path: &str, status: u16, body: serde_json::Value) -> Interaction {
        normalize(
            RawInteraction::json(method, path, None, status, Some(&body)),
            0,
            &NormalizeOptions::default(),
        )
    }

    /// Every suggestion applies cleanly and the first one resolves the diff
    fn assert_first_suggestion_resolves(spec: &SpecState, interaction: &Interaction) -> Vec<Suggestion> {
        let diff = compute_diffs(spec, interaction).unwrap().remove(0).diff;
        let suggestions = suggest(spec, &diff, interaction).unwrap();
        assert!(!suggestions.is_empty());
        for suggestion in &suggestions {
            apply_all(spec, &suggestion.commands)
                .unwrap_or_else(|e| panic!("{} failed: {}", suggestion.title, e));
        }
        let after = apply_all(spec, &suggestions[0].commands).unwrap();
        let remaining = compute_diffs(&after, interaction).unwrap();
        assert!(
            remaining.iter().all(|r| r.diff != diff),
            "diff survived '{}'",
            suggestions[0].title
        );
        suggestions
    }

    #[test]
    fn test_missing_field_suggestions() {
        let spec = spec();
        let interaction = observe("GET", "/users", 200, json!({"id": "a"}));
        let suggestions = assert_first_suggestion_resolves(&spec, &interaction);
        let titles: Vec<&str> = suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Make field `name` optional", "Remove field `name`"]);
    }

    #[test]
    fn test_unexpected_field_suggestions() {
        let spec = spec();
        let interaction = observe("GET", "/users", 200, json!({"id": "a", "name": "b", "age": 3}));
        let suggestions = assert_first_suggestion_resolves(&spec, &interaction);
        assert_eq!(suggestions[0].title, "Add `age` as an optional field");
        assert_eq!(suggestions[1].title, "Add `age` as a required field");
    }

    #[test]
    fn test_unmatched_type_widens_then_replaces() {
        let spec = spec();
        let interaction = observe("GET", "/users", 200, json!({"id": 1, "name": "b"}));
        let suggestions = assert_first_suggestion_resolves(&spec, &interaction);
        assert_eq!(suggestions[0].title, "Change `id` to String or Number");
        assert_eq!(suggestions[1].title, "Replace `id` with Number");
    }

    #[test]
    fn test_null_suggests_nullable() {
        let spec = spec();
        let interaction = observe("GET", "/users", 200, json!({"id": null, "name": "b"}));
        let suggestions = assert_first_suggestion_resolves(&spec, &interaction);
        assert_eq!(suggestions[0].title, "Make `id` nullable");
    }

    #[test]
    fn test_root_body_mismatch_retargets_response_body() {
        let spec = spec();
        let interaction = observe("GET", "/users", 200, json!([1, 2]));
        let suggestions = assert_first_suggestion_resolves(&spec, &interaction);
        assert!(matches!(
            suggestions[1].commands.last(),
            Some(SpecCommand::SetResponseBodyShape { response_id, .. }) if response_id == "r_200"
        ));
    }

    #[test]
    fn test_unmatched_status_code_adds_response() {
        let spec = spec();
        let interaction = observe("GET", "/users", 404, json!({"message": "nope"}));
        let suggestions = assert_first_suggestion_resolves(&spec, &interaction);
        assert_eq!(suggestions[0].title, "Document 404 response");
    }

    #[test]
    fn test_documented_heterogeneous_array_leaves_no_diffs() {
        // GIVEN an undocumented 404 whose array elements have different fields
        let spec = spec();
        let interaction = observe("GET", "/users", 404, json!([{"a": 1}, {"b": 2}]));

        // WHEN accepting the default suggestion
        let suggestions = assert_first_suggestion_resolves(&spec, &interaction);
        let after = apply_all(&spec, &suggestions[0].commands).unwrap();

        // THEN the same interaction matches the documented response completely
        let remaining: Vec<String> = compute_diffs(&after, &interaction)
            .unwrap()
            .iter()
            .map(|r| r.diff.to_string())
            .collect();
        assert!(remaining.is_empty(), "remaining: {:?}", remaining);
    }

    #[test]
    fn test_recurring_diff_gets_fresh_ids() {
        // GIVEN `x` added as a required field
        let spec = spec();
        let with_x = observe("GET", "/users", 200, json!({"id": "a", "name": "b", "x": 1}));
        let unexpected = compute_diffs(&spec, &with_x).unwrap().remove(0).diff;
        let add_required = suggest(&spec, &unexpected, &with_x).unwrap().remove(1);
        let spec = apply_all(&spec, &add_required.commands).unwrap();

        // AND then removed again after a sample without it
        let without_x = observe("GET", "/users", 200, json!({"id": "a", "name": "b"}));
        let missing = compute_diffs(&spec, &without_x).unwrap().remove(0).diff;
        let remove = suggest(&spec, &missing, &without_x).unwrap().remove(1);
        assert_eq!(remove.title, "Remove field `x`");
        let spec = apply_all(&spec, &remove.commands).unwrap();

        // WHEN the first sample's diff recurs
        let recurring = compute_diffs(&spec, &with_x).unwrap().remove(0).diff;
        assert_eq!(recurring, unexpected);

        // THEN every suggestion still applies
        for suggestion in suggest(&spec, &recurring, &with_x).unwrap() {
            let after = apply_all(&spec, &suggestion.commands)
                .unwrap_or_else(|e| panic!("{} failed: {}", suggestion.title, e));
            assert!(compute_diffs(&after, &with_x).unwrap().is_empty());
        }
    }

    #[test]
    fn test_unmatched_path_infers_parameters() {
        let spec = spec();
        let interaction = observe("GET", "/users/42/orders", 200, json!([]));
        let suggestions = assert_first_suggestion_resolves(&spec, &interaction);
        assert_eq!(suggestions[0].title, "Document GET /users/{userId}/orders");
        let after = apply_all(&spec, &suggestions[0].commands).unwrap();
        assert!(compute_diffs(&after, &interaction).unwrap().is_empty());
    }

    #[test]
    fn test_suggestions_are_deterministic() {
        let spec = spec();
        let interaction = observe("GET", "/users", 200, json!({"id": "a", "name": "b", "x": [1]}));
        let diff = compute_diffs(&spec, &interaction).unwrap().remove(0).diff;
        let first = suggest(&spec, &diff, &interaction).unwrap();
        let second = suggest(&spec, &diff, &interaction).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parameter_detection() {
        assert!(looks_like_parameter("42"));
        assert!(looks_like_parameter("0190c3b2-6d2e-7a1c-9f00-1234567890ab"));
        assert!(!looks_like_parameter("users"));
        assert_eq!(parameter_name(Some("orders")), "orderId");
        assert_eq!(parameter_name(None), "id");
    }
}
