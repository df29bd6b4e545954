//! # gallery-gateway
//!
//! Event and photo service for a photo gallery. Event metadata and photos
//! live in two independently failing backends: a relational store holding
//! `events` and `photos` rows, and an object store holding the image bytes
//! (and, for older deployments, a JSON metadata record). This crate merges
//! both into one cached, date-ordered view and runs every mutation across
//! both stores.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── GalleryService (service/)   mutations, then cache invalidation
//!     ├── SnapshotCache (service/)    TTL-bound snapshot slot
//!     ├── Reconciler (service/)       relational rows + folders → events
//!     │
//!     ├── EventRepository (persistence/)   PostgreSQL or in-memory
//!     └── ObjectStorage (storage/)         S3 / MinIO or in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod storage;
