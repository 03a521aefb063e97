//! Specification commands
//!
//! The command log is the persisted form of a specification: replaying it
//! through [`apply`](crate::apply::apply) yields a [`SpecState`](crate::SpecState).
//! Suggestions produced by the interpreters are sequences of these same
//! commands, so accepting a suggestion is nothing more than appending to the log.

use serde::{Deserialize, Serialize};

use crate::model::ShapeKind;

/// One entry of a specification event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpecCommand {
    /// Add a literal path segment below `parent_path_id`
    AddPathComponent {
        path_id: String,
        parent_path_id: String,
        name: String,
    },

    /// Add a parameter path segment (`{name}`) below `parent_path_id`
    AddPathParameter {
        path_id: String,
        parent_path_id: String,
        name: String,
    },

    /// Declare a shape; composite kinds may only reference existing shapes
    AddShape { shape_id: String, kind: ShapeKind },

    AddField {
        shape_id: String,
        field_id: String,
        name: String,
        field_shape_id: String,
    },

    SetFieldShape {
        shape_id: String,
        field_id: String,
        field_shape_id: String,
    },

    RemoveField { shape_id: String, field_id: String },

    SetListItemShape {
        shape_id: String,
        item_shape_id: String,
    },

    /// Point an optional or nullable shape at a different inner shape
    SetWrappedShape {
        shape_id: String,
        inner_shape_id: String,
    },

    AddRequest {
        request_id: String,
        path_id: String,
        method: String,
    },

    SetRequestBodyShape {
        request_id: String,
        content_type: String,
        shape_id: String,
    },

    AddResponse {
        response_id: String,
        path_id: String,
        method: String,
        status_code: u16,
    },

    SetResponseBodyShape {
        response_id: String,
        content_type: String,
        shape_id: String,
    },

    /// Opens a commit batch; batches cannot nest
    StartBatchCommit { batch_id: String, message: String },

    EndBatchCommit { batch_id: String },
}

impl SpecCommand {
    /// Stable command name, used as the `op` of log events
    pub fn name(&self) -> &'static str {
        match self {
            SpecCommand::AddPathComponent { .. } => "AddPathComponent",
            SpecCommand::AddPathParameter { .. } => "AddPathParameter",
            SpecCommand::AddShape { .. } => "AddShape",
            SpecCommand::AddField { .. } => "AddField",
            SpecCommand::SetFieldShape { .. } => "SetFieldShape",
            SpecCommand::RemoveField { .. } => "RemoveField",
            SpecCommand::SetListItemShape { .. } => "SetListItemShape",
            SpecCommand::SetWrappedShape { .. } => "SetWrappedShape",
            SpecCommand::AddRequest { .. } => "AddRequest",
            SpecCommand::SetRequestBodyShape { .. } => "SetRequestBodyShape",
            SpecCommand::AddResponse { .. } => "AddResponse",
            SpecCommand::SetResponseBodyShape { .. } => "SetResponseBodyShape",
            SpecCommand::StartBatchCommit { .. } => "StartBatchCommit",
            SpecCommand::EndBatchCommit { .. } => "EndBatchCommit",
        }
    }

    pub fn is_batch_marker(&self) -> bool {
        matches!(
            self,
            SpecCommand::StartBatchCommit { .. } | SpecCommand::EndBatchCommit { .. }
        )
    }
}
