//! Collaborators the engine is constructed with
//!
//! Defined in `specdiff-store` next to their implementations and re-exported
//! here so engine users need a single import path.

pub use specdiff_store::services::{CaptureSession, SessionProvider, SpecService};
pub use specdiff_store::{
    FsSessionProvider, FsSpecService, InMemorySessionProvider, InMemorySpecService,
};
