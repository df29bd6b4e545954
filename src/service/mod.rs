//! Service layer: reconciliation, caching and mutation coordination.
//!
//! [`Reconciler`] merges the relational store and the object store into
//! the canonical event list, [`SnapshotCache`] memoizes it for a TTL, and
//! [`GalleryService`] runs every mutation across both stores before
//! invalidating the cache.

pub mod gallery_service;
pub mod reconciler;
pub mod snapshot_cache;

pub use gallery_service::{DeletionSource, EventDeletion, GalleryService};
pub use reconciler::Reconciler;
pub use snapshot_cache::SnapshotCache;
