//! Functional-boundary apply function
//!
//! `apply()` is the only way a [`SpecState`] changes. It takes ownership of
//! the current state, executes one command and returns the next state.
//!
//! ## Atomicity Contract
//!
//! - **All-or-nothing**: a command either fully succeeds or returns a typed
//!   error; callers that need the old state on failure keep a clone
//! - **No panics**: invalid commands return [`SpecDiffError`]
//! - **Reference safety**: every id a command mentions must already exist,
//!   so a replayed log never produces a dangling shape reference
//!
//! ## Example
//!
//! ```
//! use specdiff_core::{apply, SpecCommand, SpecState};
//!
//! let state = SpecState::new();
//! let cmd = SpecCommand::AddResponse {
//!     response_id: "r_200".to_string(),
//!     path_id: "root".to_string(),
//!     method: "GET".to_string(),
//!     status_code: 200,
//! };
//!
//! let next = apply(state, cmd).unwrap();
//! assert_eq!(next.responses().count(), 1);
//! ```

use crate::commands::SpecCommand;
use crate::errors::Result;
use crate::model::SpecState;
use crate::ops::{batch_ops, endpoint_ops, path_ops, shape_ops};

/// Apply a command to a specification, returning the new state
///
/// # Errors
///
/// Returns an error if the command references a missing entity, duplicates an
/// existing one, violates a shape-kind constraint or breaks batch bracketing.
/// See [`SpecDiffError`](crate::SpecDiffError) for the full taxonomy.
pub fn apply(mut state: SpecState, cmd: SpecCommand) -> Result<SpecState> {
    let counts_toward_batch = !cmd.is_batch_marker();

    match cmd {
        SpecCommand::AddPathComponent {
            path_id,
            parent_path_id,
            name,
        } => path_ops::add_path_component(&mut state, path_id, parent_path_id, name, false)?,

        SpecCommand::AddPathParameter {
            path_id,
            parent_path_id,
            name,
        } => path_ops::add_path_component(&mut state, path_id, parent_path_id, name, true)?,

        SpecCommand::AddShape { shape_id, kind } => {
            shape_ops::add_shape(&mut state, shape_id, kind)?
        }

        SpecCommand::AddField {
            shape_id,
            field_id,
            name,
            field_shape_id,
        } => shape_ops::add_field(&mut state, &shape_id, field_id, name, field_shape_id)?,

        SpecCommand::SetFieldShape {
            shape_id,
            field_id,
            field_shape_id,
        } => shape_ops::set_field_shape(&mut state, &shape_id, &field_id, field_shape_id)?,

        SpecCommand::RemoveField { shape_id, field_id } => {
            shape_ops::remove_field(&mut state, &shape_id, &field_id)?
        }

        SpecCommand::SetListItemShape {
            shape_id,
            item_shape_id,
        } => shape_ops::set_list_item_shape(&mut state, &shape_id, item_shape_id)?,

        SpecCommand::SetWrappedShape {
            shape_id,
            inner_shape_id,
        } => shape_ops::set_wrapped_shape(&mut state, &shape_id, inner_shape_id)?,

        SpecCommand::AddRequest {
            request_id,
            path_id,
            method,
        } => endpoint_ops::add_request(&mut state, request_id, path_id, &method)?,

        SpecCommand::SetRequestBodyShape {
            request_id,
            content_type,
            shape_id,
        } => endpoint_ops::set_request_body_shape(&mut state, &request_id, &content_type, shape_id)?,

        SpecCommand::AddResponse {
            response_id,
            path_id,
            method,
            status_code,
        } => endpoint_ops::add_response(&mut state, response_id, path_id, &method, status_code)?,

        SpecCommand::SetResponseBodyShape {
            response_id,
            content_type,
            shape_id,
        } => endpoint_ops::set_response_body_shape(
            &mut state,
            &response_id,
            &content_type,
            shape_id,
        )?,

        SpecCommand::StartBatchCommit { batch_id, message } => {
            batch_ops::start_batch(&mut state, batch_id, message)?
        }

        SpecCommand::EndBatchCommit { batch_id } => batch_ops::end_batch(&mut state, &batch_id)?,
    }

    if counts_toward_batch {
        batch_ops::record_command(&mut state);
    }
    Ok(state)
}

/// Apply a sequence of commands in order
///
/// The caller's state is borrowed, never consumed: on error it is exactly as
/// it was before the call, which is what simulation and commit rely on.
///
/// # Errors
///
/// Returns the first command error; no later command is applied.
pub fn apply_all<'a, I>(state: &SpecState, cmds: I) -> Result<SpecState>
where
    I: IntoIterator<Item = &'a SpecCommand>,
{
    cmds.into_iter()
        .try_fold(state.clone(), |next, cmd| apply(next, cmd.clone()))
}

/// Replay a full event log from an empty specification
///
/// # Errors
///
/// Returns the first command error encountered during replay.
pub fn build(log: &[SpecCommand]) -> Result<SpecState> {
    let state = apply_all(&SpecState::new(), log)?;
    tracing::debug!(command_count = log.len(), "specification rebuilt from log");
    Ok(state)
}
