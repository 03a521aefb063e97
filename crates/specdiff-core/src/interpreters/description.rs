use serde::{Deserialize, Serialize};

use super::{body_side, locate};
use crate::diff::{Diff, DiffKind, DiffRegion, ExampleSegment, ShapeMismatch, ShapeTrailStep};
use crate::errors::Result;
use crate::interactions::Interaction;
use crate::model::{JsonType, SpecState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySide {
    Request,
    Response,
}

/// Part of the example body to highlight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleTag {
    pub side: BodySide,
    pub path: Vec<ExampleSegment>,
}

/// Part of the declared shape to highlight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeTag {
    pub shape_id: String,
    pub field_id: Option<String>,
}

/// Presentation-ready explanation of one diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffDescription {
    pub kind: DiffKind,
    pub title: String,
    pub summary: String,
    /// Human location such as `response[200].items[].id`
    pub location: String,
    pub expected: Option<String>,
    pub observed: Option<String>,
    pub example_tags: Vec<ExampleTag>,
    pub shape_tags: Vec<ShapeTag>,
    /// How many interactions exhibit the diff, when known
    pub occurrences: Option<usize>,
}

impl DiffDescription {
    pub fn with_occurrences(mut self, occurrences: usize) -> Self {
        self.occurrences = Some(occurrences);
        self
    }
}

fn endpoint_label(spec: &SpecState, diff: &Diff) -> String {
    let endpoint = &diff.location.endpoint;
    let path = match (&endpoint.path_id, &endpoint.observed_path) {
        (_, Some(observed)) => observed.clone(),
        (Some(path_id), None) => spec.full_path(path_id).unwrap_or_else(|_| path_id.clone()),
        (None, None) => "?".to_string(),
    };
    format!("{} {}", endpoint.method, path)
}

fn region_label(region: &DiffRegion) -> String {
    match region {
        DiffRegion::Url => "URL".to_string(),
        DiffRegion::Request { .. } => "request".to_string(),
        DiffRegion::Response { status_code, .. } => format!("{} response", status_code),
    }
}

/// Describe `diff` using `interaction` as the example
///
/// # Errors
///
/// Returns `DiffNotFound` if the interaction does not exhibit the diff, or a
/// configuration error if the specification cannot be walked.
pub fn describe(spec: &SpecState, diff: &Diff, interaction: &Interaction) -> Result<DiffDescription> {
    let located = locate(spec, diff, interaction)?;
    let endpoint = endpoint_label(spec, diff);
    let region = region_label(&diff.location.region);
    let body = diff.location.body.as_ref();
    let trail = body
        .map(|b| b.json_trail.to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "body".to_string());
    let field_name = body
        .and_then(|b| b.json_trail.last_field())
        .unwrap_or("value")
        .to_string();
    let observed_type = located.observed.map(JsonType::of);

    let mut example_tags = Vec::new();
    if let Some(side) = body_side(diff) {
        if located.body.is_some_and(|b| b.value.is_some()) {
            example_tags.push(ExampleTag {
                side,
                path: located.result.example_path.clone(),
            });
        }
    }

    let mut shape_tags = Vec::new();
    if let Some(body) = body {
        match body.shape_trail.steps.last() {
            Some(ShapeTrailStep::ObjectField {
                object_shape_id,
                field_id,
                ..
            }) => shape_tags.push(ShapeTag {
                shape_id: object_shape_id.clone(),
                field_id: Some(field_id.clone()),
            }),
            _ => shape_tags.push(ShapeTag {
                shape_id: body.shape_trail.target_shape_id().to_string(),
                field_id: None,
            }),
        }
    }

    let expected_label = body.map(|b| spec.shape_label(b.shape_trail.target_shape_id()));

    let (title, summary, expected, observed) = match diff.kind {
        DiffKind::UnmatchedPath => (
            "Undocumented URL".to_string(),
            match &diff.location.endpoint.path_id {
                Some(_) => format!("{} matches a documented path but not for this method", endpoint),
                None => format!("{} does not match any documented path", endpoint),
            },
            None,
            None,
        ),
        DiffKind::UnmatchedRequestContentType => {
            let content_type = match &diff.location.region {
                DiffRegion::Request { content_type } => content_type.to_string(),
                _ => "unknown".to_string(),
            };
            (
                "Undocumented request body".to_string(),
                format!(
                    "{} requests with content type {} are not documented",
                    endpoint, content_type
                ),
                None,
                Some(content_type),
            )
        }
        DiffKind::UnmatchedStatusCode => (
            "Undocumented status code".to_string(),
            format!("{} returned an undocumented {}", endpoint, region),
            None,
            Some(interaction.status_code.to_string()),
        ),
        DiffKind::UnmatchedResponseContentType => {
            let content_type = match &diff.location.region {
                DiffRegion::Response {
                    content_type: Some(content_type),
                    ..
                } => content_type.to_string(),
                _ => "unknown".to_string(),
            };
            (
                "Undocumented response body".to_string(),
                format!(
                    "{} {} with content type {} is not documented",
                    endpoint, region, content_type
                ),
                None,
                Some(content_type),
            )
        }
        DiffKind::BodyShapeMismatch(ShapeMismatch::MissingField) => (
            format!("Missing field `{}`", field_name),
            format!(
                "`{}` is required in the {} body of {} but was not observed",
                trail, region, endpoint
            ),
            expected_label,
            None,
        ),
        DiffKind::BodyShapeMismatch(ShapeMismatch::UnexpectedField) => (
            format!("Unexpected field `{}`", field_name),
            format!(
                "`{}` was observed in the {} body of {} but is not documented",
                trail, region, endpoint
            ),
            None,
            observed_type.map(|t| t.to_string()),
        ),
        DiffKind::BodyShapeMismatch(ShapeMismatch::UnmatchedType) => {
            let observed = observed_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let expected = expected_label.unwrap_or_else(|| "Unknown".to_string());
            (
                format!("Unmatched type at `{}`", trail),
                format!(
                    "`{}` in the {} body of {} was {} but {} was expected",
                    trail, region, endpoint, observed, expected
                ),
                Some(expected),
                Some(observed),
            )
        }
    };

    Ok(DiffDescription {
        kind: diff.kind,
        title,
        summary,
        location: diff.location.to_string(),
        expected,
        observed,
        example_tags,
        shape_tags,
        occurrences: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::build;
    use crate::commands::SpecCommand;
    use crate::diff::compute_diffs;
    use crate::interactions::{normalize, NormalizeOptions, RawInteraction};
    use crate::model::{FieldDef, ShapeKind, ROOT_PATH_ID};
    use serde_json::json;

    fn spec() -> SpecState {
        build(&[
            SpecCommand::AddShape {
                shape_id: "s_str".into(),
                kind: ShapeKind::String,
            },
            SpecCommand::AddShape {
                shape_id: "s_obj".into(),
                kind: ShapeKind::Object {
                    fields: vec![FieldDef {
                        field_id: "f_id".into(),
                        name: "id".into(),
                        shape_id: "s_str".into(),
                    }],
                },
            },
            SpecCommand::AddResponse {
                response_id: "r_200".into(),
                path_id: ROOT_PATH_ID.into(),
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

    fn observe(body: serde_json::Value) -> Interaction {
        normalize(
            RawInteraction::json("GET", "/", None, 200, Some(&body)),
            0,
            &NormalizeOptions::default(),
        )
    }

    #[test]
    fn test_unmatched_type_names_both_types() {
        let spec = spec();
        let interaction = observe(json!({"id": 7}));
        let diff = compute_diffs(&spec, &interaction).unwrap().remove(0).diff;
        let description = describe(&spec, &diff, &interaction).unwrap();

        assert_eq!(description.title, "Unmatched type at `id`");
        assert_eq!(description.expected.as_deref(), Some("String"));
        assert_eq!(description.observed.as_deref(), Some("Number"));
        assert_eq!(description.location, "response[200].id");
        assert_eq!(
            description.example_tags,
            vec![ExampleTag {
                side: BodySide::Response,
                path: vec![ExampleSegment::Key("id".into())],
            }]
        );
        assert_eq!(
            description.shape_tags,
            vec![ShapeTag {
                shape_id: "s_obj".into(),
                field_id: Some("f_id".into()),
            }]
        );
    }

    #[test]
    fn test_description_is_pure() {
        let spec = spec();
        let interaction = observe(json!({"id": "a", "extra": true}));
        let diff = compute_diffs(&spec, &interaction).unwrap().remove(0).diff;
        let first = describe(&spec, &diff, &interaction).unwrap();
        let second = describe(&spec, &diff, &interaction).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.title, "Unexpected field `extra`");
        assert_eq!(first.observed.as_deref(), Some("Boolean"));
    }

    #[test]
    fn test_interaction_without_the_diff_is_rejected() {
        let spec = spec();
        let with_diff = observe(json!({"id": 7}));
        let clean = observe(json!({"id": "ok"}));
        let diff = compute_diffs(&spec, &with_diff).unwrap().remove(0).diff;
        assert!(matches!(
            describe(&spec, &diff, &clean),
            Err(crate::errors::SpecDiffError::DiffNotFound { .. })
        ));
    }
}
