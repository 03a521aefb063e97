#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::open_mixed;
use specdiff_core::logging_facility::test_capture::init_test_capture;
use specdiff_core::DiffKind;
use specdiff_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_REVIEW_ID};

#[tokio::test]
async fn test_commit_emits_single_start_and_end() {
    let capture = init_test_capture();
    let (_, _, mut session) = open_mixed().await;
    let review_id = session.context().review_id.to_string();

    let diff = session
        .regions()
        .iter()
        .find(|e| e.diff.kind == DiffKind::UnmatchedStatusCode)
        .unwrap()
        .diff
        .clone();
    let suggestion = session.suggestions_for(&diff, None).unwrap().remove(0);
    session.accept(suggestion, diff).unwrap();
    session.begin_finishing().unwrap();
    session.commit("Document 404").await.unwrap();

    let commit_events: Vec<_> = capture
        .events_for_op("review_commit")
        .into_iter()
        .filter(|e| e.field(FIELD_REVIEW_ID) == Some(review_id.as_str()))
        .collect();
    assert_eq!(commit_events.len(), 1, "only the start carries review_id");
    assert_eq!(commit_events[0].event.as_deref(), Some(EVENT_START));

    let batch_id = commit_events[0].field("batch_id").unwrap().to_string();
    let ends: Vec<_> = capture
        .events_for_op("review_commit")
        .into_iter()
        .filter(|e| {
            e.event.as_deref() == Some(EVENT_END) && e.field("batch_id") == Some(batch_id.as_str())
        })
        .collect();
    assert_eq!(ends.len(), 1);
    assert!(ends[0].fields.contains_key("duration_ms"));
    let command_count = ends[0]
        .field("command_count")
        .and_then(|c| c.parse::<usize>().ok());
    assert!(command_count.is_some_and(|c| c > 0));
}

#[tokio::test]
async fn test_rejected_transition_logs_error_event() {
    let capture = init_test_capture();
    let (_, _, mut session) = open_mixed().await;
    let review_id = session.context().review_id.to_string();

    let diff = session.regions().iter().next().unwrap().diff.clone();
    let suggestion = session.suggestions_for(&diff, None).unwrap().remove(0);
    session.accept(suggestion.clone(), diff.clone()).unwrap();

    // Accepting for a diff the preview no longer has
    assert!(session.accept(suggestion, diff).is_err());

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some("review_accept")
            && e.event.as_deref() == Some(EVENT_START)
            && e.field(FIELD_REVIEW_ID) == Some(review_id.as_str())
    });
    assert_eq!(starts, 2);
    let errors = capture.count_events(|e| {
        e.op.as_deref() == Some("review_accept")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field("err_code") == Some("ERR_DIFF_NOT_FOUND")
    });
    assert!(errors >= 1);
}
