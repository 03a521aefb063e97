#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{mixed_capture, users_log, SESSION_ID, SPEC_ID};
use specdiff_engine::services::{FsSessionProvider, FsSpecService, SpecService};
use specdiff_engine::{DiffEngine, EngineConfig, ReviewLoad, ReviewState};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_accept_everything_commit_and_reopen_from_disk() {
    // GIVEN a spec and a capture stored on disk
    let dir = TempDir::new().unwrap();
    let specs = Arc::new(FsSpecService::new(dir.path().join("specs")));
    specs.save_events(SPEC_ID, &users_log()).await.unwrap();
    let sessions = Arc::new(FsSessionProvider::new(dir.path().join("sessions")));
    sessions.store(&mixed_capture()).unwrap();
    let engine = DiffEngine::new(specs.clone(), sessions.clone(), EngineConfig::default());

    // WHEN accepting the default suggestion of every diff
    let mut session = engine
        .open_review(SPEC_ID, SESSION_ID)
        .await
        .unwrap()
        .into_session()
        .unwrap();
    for _ in 0..10 {
        let Some(diff) = session.regions().iter().next().map(|e| e.diff.clone()) else {
            break;
        };
        let suggestion = session.suggestions_for(&diff, None).unwrap().remove(0);
        session.accept(suggestion, diff).unwrap();
    }
    assert!(session.regions().is_empty());
    assert_eq!(session.accepted().len(), 3);

    // AND committing
    session.begin_finishing().unwrap();
    session.commit("Document observed traffic").await.unwrap();

    // THEN a fresh review of the same capture has nothing left to review
    let reopened = engine
        .open_review(SPEC_ID, SESSION_ID)
        .await
        .unwrap()
        .into_session()
        .unwrap();
    assert_eq!(reopened.state(), ReviewState::Idle);
    assert!(reopened.regions_for("p_user", "GET").is_empty());
    assert_eq!(reopened.spec().batches().len(), 1);
    assert_eq!(
        reopened.spec().batches()[0].message,
        "Document observed traffic"
    );
}

#[tokio::test]
async fn test_missing_capture_file_is_no_session() {
    let dir = TempDir::new().unwrap();
    let specs = Arc::new(FsSpecService::new(dir.path().join("specs")));
    specs.save_events(SPEC_ID, &users_log()).await.unwrap();
    let engine = DiffEngine::new(
        specs,
        Arc::new(FsSessionProvider::new(dir.path().join("sessions"))),
        EngineConfig::default(),
    );

    let load = engine.open_review(SPEC_ID, "never-recorded").await.unwrap();

    assert!(matches!(load, ReviewLoad::NoSession));
}

#[tokio::test]
async fn test_config_caps_retained_examples() {
    // GIVEN a config retaining one example per diff
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("specdiff.toml");
    std::fs::write(&config_path, "max_examples_per_diff = 1\n").unwrap();
    let config = EngineConfig::from_file(&config_path).unwrap();

    let specs = Arc::new(FsSpecService::new(dir.path().join("specs")));
    specs.save_events(SPEC_ID, &users_log()).await.unwrap();
    let sessions = Arc::new(FsSessionProvider::new(dir.path().join("sessions")));
    sessions.store(&mixed_capture()).unwrap();

    // WHEN opening a review
    let session = DiffEngine::new(specs, sessions, config)
        .open_review(SPEC_ID, SESSION_ID)
        .await
        .unwrap()
        .into_session()
        .unwrap();

    // THEN the grouped extra-field diff keeps one id but counts both samples
    let regions = session.regions();
    let grouped = regions.iter().find(|e| e.occurrences == 2).unwrap();
    assert_eq!(grouped.interactions, vec!["s1".to_string()]);
}
