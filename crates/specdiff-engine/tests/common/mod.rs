use async_trait::async_trait;
use serde_json::{json, Value};
use specdiff_core::errors::{ExError, ExErrorKind};
use specdiff_core::model::{FieldDef, ROOT_PATH_ID};
use specdiff_core::{RawInteraction, ShapeKind, SpecCommand};
use specdiff_engine::services::{
    CaptureSession, InMemorySessionProvider, InMemorySpecService, SpecService,
};
use specdiff_engine::{
    CommitReceipt, DiffEngine, EngineConfig, RecomputeReport, ReviewObserver, ReviewSession,
};
use std::sync::{Arc, Mutex};

pub const SPEC_ID: &str = "users-api";
pub const SESSION_ID: &str = "capture-1";

/// `GET /users/{userId}` answering 200 `{id: string}` and 500 without body
#[allow(dead_code)]
pub fn users_log() -> Vec<SpecCommand> {
    vec![
        SpecCommand::AddPathComponent {
            path_id: "p_users".to_string(),
            parent_path_id: ROOT_PATH_ID.to_string(),
            name: "users".to_string(),
        },
        SpecCommand::AddPathParameter {
            path_id: "p_user".to_string(),
            parent_path_id: "p_users".to_string(),
            name: "userId".to_string(),
        },
        SpecCommand::AddShape {
            shape_id: "s_id".to_string(),
            kind: ShapeKind::String,
        },
        SpecCommand::AddShape {
            shape_id: "s_user".to_string(),
            kind: ShapeKind::Object {
                fields: vec![FieldDef {
                    field_id: "f_id".to_string(),
                    name: "id".to_string(),
                    shape_id: "s_id".to_string(),
                }],
            },
        },
        SpecCommand::AddRequest {
            request_id: "q_get_user".to_string(),
            path_id: "p_user".to_string(),
            method: "GET".to_string(),
        },
        SpecCommand::AddResponse {
            response_id: "r_200".to_string(),
            path_id: "p_user".to_string(),
            method: "GET".to_string(),
            status_code: 200,
        },
        SpecCommand::SetResponseBodyShape {
            response_id: "r_200".to_string(),
            content_type: "application/json".to_string(),
            shape_id: "s_user".to_string(),
        },
        SpecCommand::AddResponse {
            response_id: "r_500".to_string(),
            path_id: "p_user".to_string(),
            method: "GET".to_string(),
            status_code: 500,
        },
    ]
}

#[allow(dead_code)]
pub fn sample(id: &str, path: &str, status: u16, body: Option<Value>) -> RawInteraction {
    RawInteraction::json("GET", path, None, status, body.as_ref()).with_id(id)
}

/// Traffic with an unexpected field, a type mismatch and an undocumented 404
#[allow(dead_code)]
pub fn mixed_capture() -> CaptureSession {
    CaptureSession::new(
        SESSION_ID,
        vec![
            sample("s1", "/users/1", 200, Some(json!({"id": "1", "extra": 1}))),
            sample("s2", "/users/2", 200, Some(json!({"id": "2", "extra": 2}))),
            sample("s3", "/users/3", 200, Some(json!({"id": 3}))),
            sample("s4", "/users/4", 404, Some(json!({"error": "not found"}))),
        ],
    )
}

/// Observer that keeps every report and receipt
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingObserver {
    pub reports: Mutex<Vec<RecomputeReport>>,
    pub receipts: Mutex<Vec<CommitReceipt>>,
}

impl ReviewObserver for RecordingObserver {
    fn on_recompute(&self, report: &RecomputeReport) {
        self.reports.lock().unwrap().push(report.clone());
    }

    fn on_committed(&self, receipt: &CommitReceipt) {
        self.receipts.lock().unwrap().push(receipt.clone());
    }
}

/// Spec service whose saves always fail
#[allow(dead_code)]
pub struct FailingSaves {
    pub inner: InMemorySpecService,
}

#[async_trait]
impl SpecService for FailingSaves {
    async fn list_events(&self, spec_id: &str) -> specdiff_store::Result<Vec<SpecCommand>> {
        self.inner.list_events(spec_id).await
    }

    async fn save_events(&self, _spec_id: &str, _events: &[SpecCommand]) -> specdiff_store::Result<()> {
        Err(ExError::new(ExErrorKind::Persistence).with_message("disk full"))
    }
}

#[allow(dead_code)]
pub async fn open_with(
    specs: Arc<dyn SpecService>,
    capture: CaptureSession,
    observer: Arc<RecordingObserver>,
) -> ReviewSession {
    DiffEngine::new(
        specs,
        Arc::new(InMemorySessionProvider::new().with_session(capture)),
        EngineConfig::default(),
    )
    .with_observer(observer)
    .open_review(SPEC_ID, SESSION_ID)
    .await
    .expect("review should open")
    .into_session()
    .expect("capture session exists")
}

#[allow(dead_code)]
pub async fn open_mixed() -> (Arc<InMemorySpecService>, Arc<RecordingObserver>, ReviewSession) {
    let specs = Arc::new(InMemorySpecService::new().with_spec(SPEC_ID, users_log()));
    let observer = Arc::new(RecordingObserver::default());
    let session = open_with(specs.clone(), mixed_capture(), observer.clone()).await;
    (specs, observer, session)
}
