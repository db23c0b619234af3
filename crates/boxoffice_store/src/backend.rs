//! Document store trait definition.

use crate::document::{Document, DocumentPath};
use crate::error::StoreResult;
use crate::query::Query;
use async_trait::async_trait;
use boxoffice_document::Fields;

/// Callback invoked with a document's new fields, or `None` when the
/// document was deleted.
pub type ChangeCallback = Box<dyn Fn(Option<&Fields>) + Send + Sync>;

/// Handle to an active subscription. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a subscription whose teardown runs `cancel` exactly once.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Tears the subscription down explicitly.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// A remote schemaless document store.
///
/// Documents are maps of field to JSON value with no server-side schema.
/// All I/O is asynchronous and non-blocking. Failures surface as opaque
/// [`StoreError`](crate::StoreError)s carrying the backend's code verbatim.
///
/// # Invariants
///
/// - `set` replaces the whole document; `update` merges fields into the
///   existing document, creating it when absent
/// - `query` results are deterministically ordered (ordering field, then
///   document id) and cursors are forward-only
/// - `subscribe` delivers the full new document body on every change
///
/// # Implementors
///
/// - [`MemoryStore`](crate::MemoryStore) - in-memory, for tests and
///   ephemeral sessions
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a single document, `None` when absent.
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Fields>>;

    /// Writes a document, replacing any existing body.
    async fn set(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Merges fields into a document, creating it when absent.
    async fn update(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Deletes a document. Deleting an absent document is not an error.
    async fn delete(&self, path: &DocumentPath) -> StoreResult<()>;

    /// Adds a document under a store-generated id, returning the id.
    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Runs a query and returns the matching documents in order.
    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>>;

    /// Registers a live-update callback for one document.
    fn subscribe(&self, path: &DocumentPath, on_change: ChangeCallback)
        -> StoreResult<Subscription>;
}
