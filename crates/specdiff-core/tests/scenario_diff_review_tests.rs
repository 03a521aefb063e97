#![allow(clippy::unwrap_used, clippy::expect_used)]

/// Diff review scenarios: compute, group, describe and suggest for the
/// canonical user-lookup endpoint.
mod common;

use common::{observe, users_spec};
use serde_json::json;
use specdiff_core::diff::RegionKey;
use specdiff_core::errors::{ExError, ExErrorKind};
use specdiff_core::model::ContentType;
use specdiff_core::{
    apply_all, compute_diffs, describe, group_diffs, suggest, DiffKind, IgnoreSet, ShapeMismatch,
    SpecCommand, SpecDiffError,
};

#[test]
fn test_scenario_unexpected_field_in_response() {
    // GIVEN a spec declaring 200 -> {id: string}
    let spec = users_spec();

    // AND an interaction returning an extra field
    let interaction = observe("s1", "GET", "/users/7", 200, Some(json!({"id": "x", "extra": 1})));

    // WHEN grouping diffs
    let grouped = group_diffs(&spec, &[interaction.clone()]).unwrap();

    // THEN exactly one body diff exists at response[200].extra
    assert_eq!(grouped.len(), 1);
    let entity = grouped.entities().next().unwrap();
    assert_eq!(
        entity.diff.kind,
        DiffKind::BodyShapeMismatch(ShapeMismatch::UnexpectedField)
    );
    assert_eq!(entity.diff.location.to_string(), "response[200].extra");

    // AND no status code or content type diffs
    let regions = grouped.regions(&IgnoreSet::new(), None);
    assert!(regions.unmatched_status_code().is_empty());
    assert!(regions.unmatched_response_content_type().is_empty());

    // AND two ranked alternatives are offered, optional first
    let suggestions = suggest(&spec, &entity.diff, &interaction).unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].title, "Add `extra` as an optional field");
    assert_eq!(suggestions[1].title, "Add `extra` as a required field");
}

#[test]
fn test_scenario_unmatched_status_code() {
    // GIVEN a spec declaring only 200 and 500
    let spec = users_spec();

    // AND an interaction answered with 404
    let interaction = observe("s1", "GET", "/users/7", 404, Some(json!({"error": "nope"})));

    // WHEN grouping diffs
    let grouped = group_diffs(&spec, &[interaction.clone()]).unwrap();

    // THEN exactly one unmatched status code diff at response[404]
    let regions = grouped.regions(&IgnoreSet::new(), None);
    let unmatched = regions.unmatched_status_code();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(regions.len(), 1);
    assert_eq!(unmatched[0].diff.location.to_string(), "response[404]");

    // WHEN accepting the suggestion on a copy
    let suggestions = suggest(&spec, &unmatched[0].diff, &interaction).unwrap();
    let simulated = apply_all(&spec, &suggestions[0].commands).unwrap();

    // THEN the simulated spec declares 404
    let path_id = simulated.resolve_path("/users/7").unwrap();
    assert!(simulated
        .responses_for(&path_id, "GET")
        .iter()
        .any(|r| r.status_code == 404));
    assert!(compute_diffs(&simulated, &interaction).unwrap().is_empty());

    // AND the real spec is untouched
    assert!(!spec
        .responses_for(&path_id, "GET")
        .iter()
        .any(|r| r.status_code == 404));
}

#[test]
fn test_scenario_missing_field_described_and_resolved() {
    // GIVEN an interaction missing the required id
    let spec = users_spec();
    let interaction = observe("s1", "GET", "/users/7", 200, Some(json!({})));
    let diff = compute_diffs(&spec, &interaction).unwrap().remove(0).diff;

    // WHEN describing it
    let description = describe(&spec, &diff, &interaction).unwrap();

    // THEN the description names the field and its expected type
    assert_eq!(description.title, "Missing field `id`");
    assert_eq!(description.expected.as_deref(), Some("String"));
    assert!(description.summary.contains("GET /users/{userId}"));

    // AND making it optional removes the diff
    let suggestions = suggest(&spec, &diff, &interaction).unwrap();
    let after = apply_all(&spec, &suggestions[0].commands).unwrap();
    assert!(compute_diffs(&after, &interaction).unwrap().is_empty());
}

#[test]
fn test_scenario_ignore_filters_every_region_query() {
    // GIVEN one body diff and one status code diff
    let spec = users_spec();
    let samples = vec![
        observe("s1", "GET", "/users/1", 200, Some(json!({"id": 5}))),
        observe("s2", "GET", "/users/2", 404, None),
    ];
    let grouped = group_diffs(&spec, &samples).unwrap();
    assert_eq!(grouped.len(), 2);
    let body_diff = grouped
        .entities()
        .find(|e| matches!(e.diff.kind, DiffKind::BodyShapeMismatch(_)))
        .unwrap()
        .diff
        .clone();

    // WHEN ignoring the body diff
    let mut ignored = IgnoreSet::new();
    ignored.insert(body_diff.clone());
    let regions = grouped.regions(&ignored, None);

    // THEN it disappears from every query
    let json = ContentType::media("application/json");
    assert_eq!(regions.len(), 1);
    assert!(regions.in_response_with_status_code(200).is_empty());
    assert!(regions.in_response_body_shape(200, &json).is_empty());
    assert!(!regions.is_region_active(&RegionKey::ResponseStatusCode(200), &body_diff));

    // AND un-ignoring restores it without recomputation
    ignored.remove(&body_diff);
    let regions = grouped.regions(&ignored, None);
    assert_eq!(regions.len(), 2);
    assert!(regions.is_region_active(&RegionKey::ResponseStatusCode(200), &body_diff));
}

#[test]
fn test_scenario_log_referencing_undeclared_shape_is_rejected() {
    // GIVEN a log whose wrapper points at a shape that was never declared
    let mut log = common::users_log();
    log.push(SpecCommand::AddShape {
        shape_id: "s_wrapper".to_string(),
        kind: specdiff_core::ShapeKind::Optional {
            inner: "s_gone".to_string(),
        },
    });

    // WHEN replaying it
    let result = specdiff_core::build(&log);

    // THEN the replay fails on the missing shape
    let err = result.unwrap_err();
    assert!(matches!(err, SpecDiffError::ShapeNotFound { .. }));

    // AND the facility error carries the not-found kind
    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::NotFound);
    assert!(!ex.kind().is_fatal_configuration());
}

#[test]
fn test_scenario_regions_for_endpoint_empty_when_matching() {
    // GIVEN only matching traffic for the declared endpoint and a stray path
    let spec = users_spec();
    let samples = vec![
        observe("s1", "GET", "/users/1", 200, Some(json!({"id": "a"}))),
        observe("s2", "GET", "/health", 200, None),
    ];
    let grouped = group_diffs(&spec, &samples).unwrap();

    // WHEN scoping regions to GET /users/{userId}
    let filter = specdiff_core::diff::EndpointFilter::new("p_user", "GET");
    let regions = grouped.regions(&IgnoreSet::new(), Some(&filter));

    // THEN the endpoint is fully matching
    assert!(regions.is_empty());

    // AND the unscoped view still reports the stray path
    let all = grouped.regions(&IgnoreSet::new(), None);
    assert_eq!(all.unmatched_path().len(), 1);
}
