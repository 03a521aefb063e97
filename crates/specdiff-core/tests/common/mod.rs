use serde_json::Value;
use specdiff_core::model::{FieldDef, ROOT_PATH_ID};
use specdiff_core::{build, normalize, Interaction, NormalizeOptions, RawInteraction, ShapeKind, SpecCommand, SpecState};

/// Event log for `GET /users/{userId}` answering 200 `{id: string}` and 500 without body
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
pub fn users_spec() -> SpecState {
    build(&users_log()).expect("fixture log should replay")
}

/// A normalized JSON interaction with a body-less request
#[allow(dead_code)]
pub fn observe(id: &str, method: &str, path: &str, status: u16, body: Option<Value>) -> Interaction {
    normalize(
        RawInteraction::json(method, path, None, status, body.as_ref()).with_id(id),
        0,
        &NormalizeOptions::default(),
    )
}
