//! Canonical schema constants for structured logging
//!
//! Shared by the logging macros and by tests that assert on captured events.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REVIEW_ID: &str = "review_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Entity identifiers
pub const FIELD_SPEC_ID: &str = "spec_id";
pub const FIELD_SESSION_ID: &str = "session_id";
pub const FIELD_BATCH_ID: &str = "batch_id";
pub const FIELD_INTERACTION_ID: &str = "interaction_id";

// Collection sizes
pub const FIELD_DIFF_COUNT: &str = "diff_count";
pub const FIELD_SAMPLE_COUNT: &str = "sample_count";
pub const FIELD_COMMAND_COUNT: &str = "command_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
