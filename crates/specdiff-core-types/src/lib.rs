//! Core types shared across specdiff layers
//!
//! - **Correlation types**: BatchId, ReviewId, TraceId, ReviewContext
//! - **Schema constants**: Canonical log field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{BatchId, ReviewContext, ReviewId, TraceId};
