use std::collections::BTreeSet;

use super::model::{
    BodyLocation, BodyOwner, Diff, DiffKind, DiffLocation, DiffRegion, DiffResult, EndpointRef,
    ExampleSegment,
};
use super::shapes::diff_body;
use crate::errors::Result;
use crate::interactions::{Interaction, ObservedBody};
use crate::model::{BodyDescriptor, SpecState};

struct Emitter<'a> {
    interaction: &'a Interaction,
    seen: BTreeSet<Diff>,
    out: Vec<DiffResult>,
}

impl Emitter<'_> {
    fn push(&mut self, diff: Diff, example_path: Vec<ExampleSegment>) {
        if self.seen.insert(diff.clone()) {
            self.out.push(DiffResult {
                diff,
                interaction_id: self.interaction.id.clone(),
                example_path,
            });
        }
    }
}

fn diff_declared_body(
    spec: &SpecState,
    emitter: &mut Emitter<'_>,
    endpoint: &EndpointRef,
    region: DiffRegion,
    owner: BodyOwner,
    declared: &Option<BodyDescriptor>,
    observed: &ObservedBody,
) -> Result<()> {
    let (Some(declared), Some(value)) = (declared, &observed.value) else {
        return Ok(());
    };
    let referenced_from = match &owner {
        BodyOwner::Request { request_id } => format!("request {}", request_id),
        BodyOwner::Response { response_id } => format!("response {}", response_id),
    };
    for shape_diff in diff_body(spec, &declared.shape_id, value, &referenced_from)? {
        let diff = Diff {
            kind: DiffKind::BodyShapeMismatch(shape_diff.mismatch),
            location: DiffLocation {
                endpoint: endpoint.clone(),
                region: region.clone(),
                body: Some(BodyLocation {
                    owner: owner.clone(),
                    json_trail: shape_diff.json_trail,
                    shape_trail: shape_diff.shape_trail,
                }),
            },
        };
        emitter.push(diff, shape_diff.example_path);
    }
    Ok(())
}

/// Compute every diff one interaction exhibits against `spec`
///
/// The result is deduplicated: a discrepancy repeated across array elements
/// is reported once, with the first element as its example.
///
/// # Errors
///
/// Returns `DanglingShapeReference` or `ShapeCycle` when a declared body
/// cannot be walked. Those are configuration errors of the specification, not
/// of the interaction.
pub fn compute_diffs(spec: &SpecState, interaction: &Interaction) -> Result<Vec<DiffResult>> {
    let mut emitter = Emitter {
        interaction,
        seen: BTreeSet::new(),
        out: Vec::new(),
    };
    let method = interaction.method.to_ascii_uppercase();

    let path_id = match spec.resolve_path(&interaction.path) {
        Some(path_id) if spec.has_endpoint(&path_id, &method) => path_id,
        resolved => {
            // a declared path is the identity; the raw URL only when nothing resolved
            let observed_path = match resolved {
                Some(_) => None,
                None => Some(interaction.path.clone()),
            };
            emitter.push(
                Diff {
                    kind: DiffKind::UnmatchedPath,
                    location: DiffLocation {
                        endpoint: EndpointRef {
                            path_id: resolved,
                            method,
                            observed_path,
                        },
                        region: DiffRegion::Url,
                        body: None,
                    },
                },
                Vec::new(),
            );
            return Ok(emitter.out);
        }
    };
    let endpoint = EndpointRef {
        path_id: Some(path_id.clone()),
        method: method.clone(),
        observed_path: None,
    };

    // ----- request -----
    let requests = spec.requests_for(&path_id, &method);
    let observed_request_type = &interaction.request.content_type;
    let request_region = DiffRegion::Request {
        content_type: observed_request_type.clone(),
    };
    if !(requests.is_empty() && observed_request_type.is_no_body()) {
        match requests
            .iter()
            .find(|r| &r.content_type() == observed_request_type)
        {
            Some(request) => diff_declared_body(
                spec,
                &mut emitter,
                &endpoint,
                request_region,
                BodyOwner::Request {
                    request_id: request.request_id.clone(),
                },
                &request.body,
                &interaction.request,
            )?,
            None => emitter.push(
                Diff {
                    kind: DiffKind::UnmatchedRequestContentType,
                    location: DiffLocation {
                        endpoint: endpoint.clone(),
                        region: request_region,
                        body: None,
                    },
                },
                Vec::new(),
            ),
        }
    }

    // ----- response -----
    let status_code = interaction.status_code;
    let responses: Vec<_> = spec
        .responses_for(&path_id, &method)
        .into_iter()
        .filter(|r| r.status_code == status_code)
        .collect();
    if responses.is_empty() {
        emitter.push(
            Diff {
                kind: DiffKind::UnmatchedStatusCode,
                location: DiffLocation {
                    endpoint,
                    region: DiffRegion::Response {
                        status_code,
                        content_type: None,
                    },
                    body: None,
                },
            },
            Vec::new(),
        );
        return Ok(emitter.out);
    }

    let observed_response_type = &interaction.response.content_type;
    let response_region = DiffRegion::Response {
        status_code,
        content_type: Some(observed_response_type.clone()),
    };
    match responses
        .iter()
        .find(|r| &r.content_type() == observed_response_type)
    {
        Some(response) => diff_declared_body(
            spec,
            &mut emitter,
            &endpoint,
            response_region,
            BodyOwner::Response {
                response_id: response.response_id.clone(),
            },
            &response.body,
            &interaction.response,
        )?,
        None => emitter.push(
            Diff {
                kind: DiffKind::UnmatchedResponseContentType,
                location: DiffLocation {
                    endpoint,
                    region: response_region,
                    body: None,
                },
            },
            Vec::new(),
        ),
    }

    Ok(emitter.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::build;
    use crate::commands::SpecCommand;
    use crate::diff::model::ShapeMismatch;
    use crate::interactions::{normalize, NormalizeOptions, RawInteraction};
    use crate::model::{ContentType, FieldDef, ShapeKind, ROOT_PATH_ID};
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
                shape_id: "s_user".into(),
                kind: ShapeKind::Object {
                    fields: vec![FieldDef {
                        field_id: "f_id".into(),
                        name: "id".into(),
                        shape_id: "s_str".into(),
                    }],
                },
            },
            SpecCommand::AddRequest {
                request_id: "q_get".into(),
                path_id: "p_users".into(),
                method: "GET".into(),
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
                shape_id: "s_user".into(),
            },
        ])
        .unwrap()
    }

    fn observe(method: &str, path: &str, status: u16, body: Option<serde_json::Value>) -> Interaction {
        normalize(
            RawInteraction::json(method, path, None, status, body.as_ref()),
            0,
            &NormalizeOptions::default(),
        )
    }

    #[test]
    fn test_matching_interaction_has_no_diffs() {
        let diffs = compute_diffs(&spec(), &observe("GET", "/users", 200, Some(json!({"id": "a"}))))
            .unwrap();
        assert!(diffs.is_empty(), "unexpected diffs: {:?}", diffs);
    }

    #[test]
    fn test_unknown_path_and_unknown_method_are_unmatched_path() {
        let spec = spec();
        let diffs = compute_diffs(&spec, &observe("GET", "/orders", 200, None)).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].diff.kind, DiffKind::UnmatchedPath);
        assert_eq!(diffs[0].diff.location.endpoint.path_id, None);

        let diffs = compute_diffs(&spec, &observe("DELETE", "/users", 204, None)).unwrap();
        assert_eq!(diffs[0].diff.kind, DiffKind::UnmatchedPath);
        assert_eq!(
            diffs[0].diff.location.endpoint.path_id.as_deref(),
            Some("p_users")
        );
    }

    #[test]
    fn test_undeclared_method_on_parameter_path_is_one_diff() {
        // GIVEN `/users/{userId}` declared without any endpoint
        let spec = crate::apply::apply_all(
            &spec(),
            &[SpecCommand::AddPathParameter {
                path_id: "p_user".into(),
                parent_path_id: "p_users".into(),
                name: "userId".into(),
            }],
        )
        .unwrap();

        // WHEN two concrete URLs hit it
        let first = compute_diffs(&spec, &observe("DELETE", "/users/1", 204, None)).unwrap();
        let second = compute_diffs(&spec, &observe("DELETE", "/users/2", 204, None)).unwrap();

        // THEN both exhibit the same diff, keyed by the declared path
        assert_eq!(first[0].diff, second[0].diff);
        assert_eq!(first[0].diff.location.endpoint.observed_path, None);
        assert_eq!(first[0].diff.location.to_string(), "url[DELETE p_user]");

        // AND unresolvable URLs still keep their raw path apart
        let a = compute_diffs(&spec, &observe("GET", "/orders/1", 200, None)).unwrap();
        let b = compute_diffs(&spec, &observe("GET", "/orders/2", 200, None)).unwrap();
        assert_ne!(a[0].diff, b[0].diff);
    }

    #[test]
    fn test_unexpected_status_code() {
        let diffs = compute_diffs(&spec(), &observe("GET", "/users", 404, Some(json!({}))))
            .unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].diff.kind, DiffKind::UnmatchedStatusCode);
        assert_eq!(diffs[0].diff.location.to_string(), "response[404]");
    }

    #[test]
    fn test_response_without_body_is_unmatched_content_type() {
        let diffs = compute_diffs(&spec(), &observe("GET", "/users", 200, None)).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].diff.kind, DiffKind::UnmatchedResponseContentType);
        assert_eq!(
            diffs[0].diff.location.region,
            DiffRegion::Response {
                status_code: 200,
                content_type: Some(ContentType::NoBody)
            }
        );
    }

    #[test]
    fn test_request_body_on_body_less_request_is_unmatched() {
        let raw = RawInteraction::json("GET", "/users", Some(&json!({"q": 1})), 200, Some(&json!({"id": "a"})));
        let interaction = normalize(raw, 0, &NormalizeOptions::default());
        let diffs = compute_diffs(&spec(), &interaction).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].diff.kind, DiffKind::UnmatchedRequestContentType);
    }

    #[test]
    fn test_unparseable_body_is_not_a_shape_diff() {
        let mut interaction = observe("GET", "/users", 200, Some(json!({"id": "a"})));
        interaction.response.value = None;
        assert!(compute_diffs(&spec(), &interaction).unwrap().is_empty());
    }

    #[test]
    fn test_diffs_are_deduplicated_per_interaction() {
        let spec = crate::apply::apply_all(
            &spec(),
            &[
                SpecCommand::AddShape {
                    shape_id: "s_users".into(),
                    kind: ShapeKind::List {
                        item: "s_user".into(),
                    },
                },
                SpecCommand::SetResponseBodyShape {
                    response_id: "r_200".into(),
                    content_type: "application/json".into(),
                    shape_id: "s_users".into(),
                },
            ],
        )
        .unwrap();
        let interaction = observe(
            "GET",
            "/users",
            200,
            Some(json!([{"id": "a", "x": 1}, {"id": "b", "x": 2}])),
        );
        let diffs = compute_diffs(&spec, &interaction).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(
            diffs[0].diff.kind,
            DiffKind::BodyShapeMismatch(ShapeMismatch::UnexpectedField)
        );
        assert_eq!(diffs[0].diff.location.to_string(), "response[200][].x");
    }
}
