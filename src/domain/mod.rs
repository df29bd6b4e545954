//! Domain layer: canonical gallery types and pure rules.
//!
//! This module contains the event and photo model exposed by the cached
//! snapshot, identifier generation, upload validation and object-key
//! derivation, and the demo dataset used in degraded mode.

pub mod demo;
pub mod event;
pub mod ids;
pub mod upload;

pub use event::{Event, PLACEHOLDER_THUMBNAIL, Photo, Thumbnail};
pub use upload::PhotoUpload;
