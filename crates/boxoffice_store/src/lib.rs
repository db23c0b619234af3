//! # boxoffice Store
//!
//! Backend abstraction over a schemaless remote document store.
//!
//! This crate provides:
//! - The [`DocumentStore`] trait (get/set/update/query/subscribe)
//! - A deterministic [`Query`] model with forward-only cursors
//! - [`MemoryStore`], an in-memory backend with failure injection for tests
//! - [`KeyValueStore`], best-effort durable storage for small client state
//!
//! Backends are **opaque about failures**: a [`StoreError`] carries the
//! backend's reported code and message verbatim, and interpretation
//! (retry eligibility, taxonomy) belongs to the client layer.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod document;
mod error;
mod kv;
mod memory;
mod query;

pub use backend::{ChangeCallback, DocumentStore, Subscription};
pub use document::{Document, DocumentPath};
pub use error::{StoreError, StoreResult};
pub use kv::{KeyValueStore, MemoryKeyValueStore, StorageError, StorageResult};
pub use memory::MemoryStore;
pub use query::{cmp_values, Cursor, Direction, Filter, FilterOp, Query};
