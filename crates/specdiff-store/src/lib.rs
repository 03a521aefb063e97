//! specdiff store - collaborators that load and persist review inputs
//!
//! Provides:
//! - The async collaborator traits the review engine talks to
//!   ([`SpecService`], [`SessionProvider`])
//! - In-memory implementations for embedding and tests
//! - File-backed implementations with atomic temp→rename writes and
//!   digest-checked event logs

pub mod atomic;
pub mod errors;
pub mod fs;
pub mod memory;
pub mod services;

pub use errors::Result;
pub use fs::{FsSessionProvider, FsSpecService};
pub use memory::{InMemorySessionProvider, InMemorySpecService};
pub use services::{CaptureSession, SessionProvider, SpecService};
