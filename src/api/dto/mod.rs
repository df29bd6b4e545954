//! Data Transfer Objects for REST request/response serialization.
//!
//! Events and photos are serialized with their domain types; this module
//! holds the request bodies and response envelopes around them.

pub mod auth_dto;
pub mod common_dto;
pub mod event_dto;

pub use auth_dto::*;
pub use common_dto::*;
pub use event_dto::*;
