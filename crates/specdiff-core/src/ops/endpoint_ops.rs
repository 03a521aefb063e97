use crate::errors::{Result, SpecDiffError};
use crate::model::{BodyDescriptor, ContentType, RequestDef, ResponseDef, SpecState};

/// Normalize an HTTP method to its uppercase token
pub(crate) fn normalize_method(method: &str) -> Result<String> {
    let trimmed = method.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(SpecDiffError::InvalidMethod {
            method: method.to_string(),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

fn body_descriptor(state: &SpecState, content_type: &str, shape_id: String) -> Result<BodyDescriptor> {
    state.shape(&shape_id)?;
    match ContentType::media(content_type) {
        ContentType::Media(media) => Ok(BodyDescriptor {
            content_type: media,
            shape_id,
        }),
        ContentType::NoBody => Err(SpecDiffError::InvalidName {
            reason: "Body content type cannot be empty".to_string(),
        }),
    }
}

/// # Errors
/// * `RequestAlreadyExists` - If `request_id` is taken
/// * `PathNotFound` - If the path does not exist
/// * `InvalidMethod` - If the method is not an alphabetic token
pub fn add_request(
    state: &mut SpecState,
    request_id: String,
    path_id: String,
    method: &str,
) -> Result<()> {
    if state.requests.contains_key(&request_id) {
        return Err(SpecDiffError::RequestAlreadyExists { request_id });
    }
    state.path(&path_id)?;
    let method = normalize_method(method)?;
    state.requests.insert(
        request_id.clone(),
        RequestDef {
            request_id,
            path_id,
            method,
            body: None,
        },
    );
    Ok(())
}

/// Declare (or replace) the body of a request
///
/// # Errors
/// * `RequestNotFound` / `ShapeNotFound` - If the target does not resolve
/// * `InvalidName` - If the content type is blank
pub fn set_request_body_shape(
    state: &mut SpecState,
    request_id: &str,
    content_type: &str,
    shape_id: String,
) -> Result<()> {
    state.request(request_id)?;
    let body = body_descriptor(state, content_type, shape_id)?;
    if let Some(request) = state.requests.get_mut(request_id) {
        request.body = Some(body);
    }
    Ok(())
}

/// # Errors
/// * `ResponseAlreadyExists` - If `response_id` is taken
/// * `PathNotFound` - If the path does not exist
/// * `InvalidMethod` - If the method is not an alphabetic token
/// * `InvalidStatusCode` - If the code is outside 100..=599
pub fn add_response(
    state: &mut SpecState,
    response_id: String,
    path_id: String,
    method: &str,
    status_code: u16,
) -> Result<()> {
    if state.responses.contains_key(&response_id) {
        return Err(SpecDiffError::ResponseAlreadyExists { response_id });
    }
    state.path(&path_id)?;
    let method = normalize_method(method)?;
    if !(100..=599).contains(&status_code) {
        return Err(SpecDiffError::InvalidStatusCode { status_code });
    }
    state.responses.insert(
        response_id.clone(),
        ResponseDef {
            response_id,
            path_id,
            method,
            status_code,
            body: None,
        },
    );
    Ok(())
}

/// Declare (or replace) the body of a response
///
/// # Errors
/// * `ResponseNotFound` / `ShapeNotFound` - If the target does not resolve
/// * `InvalidName` - If the content type is blank
pub fn set_response_body_shape(
    state: &mut SpecState,
    response_id: &str,
    content_type: &str,
    shape_id: String,
) -> Result<()> {
    state.response(response_id)?;
    let body = body_descriptor(state, content_type, shape_id)?;
    if let Some(response) = state.responses.get_mut(response_id) {
        response.body = Some(body);
    }
    Ok(())
}
