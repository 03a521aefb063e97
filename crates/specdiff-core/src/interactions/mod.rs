//! Recorded traffic and its canonical form
//!
//! Capture sessions store [`RawInteraction`]s (headers and body bytes as seen
//! on the wire). The diff computer only ever looks at the normalized
//! [`Interaction`], which carries content types as [`ContentType`](crate::ContentType) values and
//! bodies as parsed JSON trees.

pub mod normalize;
pub mod raw;

pub use normalize::{normalize, normalize_all, Interaction, NormalizeOptions, ObservedBody};
pub use raw::{RawInteraction, RawRequest, RawResponse};
