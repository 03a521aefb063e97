//! Correlation identifiers
//!
//! Every identifier is a UUIDv7 string so that ids sort by creation time
//! in logs and in the persisted event log.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh UUIDv7-backed id
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wrap an existing id (e.g. one read back from an event log)
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifies one atomic commit batch written to a specification
    BatchId
);

uuid_id!(
    /// Identifies one diff-review session (one capture reviewed against one spec)
    ReviewId
);

uuid_id!(
    /// Trace identifier propagated from the caller, if it has one
    TraceId
);

/// Correlation context attached to review-session log events
#[derive(Debug, Clone)]
pub struct ReviewContext {
    pub review_id: ReviewId,
    pub spec_id: String,
    pub session_id: String,
    pub trace_id: Option<TraceId>,
}

impl ReviewContext {
    pub fn new(spec_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            review_id: ReviewId::new(),
            spec_id: spec_id.into(),
            session_id: session_id.into(),
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}
