//! Structured logging facility
//!
//! - Single initialization point via `init(profile)`
//! - Boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions on emitted events
//!
//! Boundary logging is owned by the orchestration layer (`specdiff-engine`).
//! Code in this crate only emits `tracing::debug!` / `tracing::warn!` details.
//!
//! ```rust
//! use specdiff_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use specdiff_core_types::schema;
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
