//! In-memory document store for tests and ephemeral sessions.

use crate::backend::{ChangeCallback, DocumentStore, Subscription};
use crate::document::{Document, DocumentPath};
use crate::error::{StoreError, StoreResult};
use crate::query::{cmp_values, Cursor, Direction, Query};
use async_trait::async_trait;
use boxoffice_document::Fields;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

type WatchFn = Arc<dyn Fn(Option<&Fields>) + Send + Sync>;
type Watchers = Arc<Mutex<HashMap<String, Vec<(u64, WatchFn)>>>>;

/// An in-memory document store.
///
/// Suitable for unit tests, integration tests, and ephemeral sessions.
/// Queries are evaluated with deterministic ordering (ordering field,
/// then document id) and forward-only cursors position by value, so a
/// cursor whose document has been deleted still continues correctly.
///
/// # Failure Injection
///
/// Tests can script backend failures with [`fail_next`](Self::fail_next)
/// and [`fail_times`](Self::fail_times); each store operation consumes at
/// most one injected failure before touching data.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
    watchers: Watchers,
    next_watch_id: AtomicU64,
    injected: Mutex<VecDeque<StoreError>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an error returned by the next store operation.
    pub fn fail_next(&self, error: StoreError) {
        self.injected.lock().push_back(error);
    }

    /// Queues `count` copies of an error, failing that many consecutive
    /// operations.
    pub fn fail_times(&self, count: usize, error: StoreError) {
        let mut injected = self.injected.lock();
        for _ in 0..count {
            injected.push_back(error.clone());
        }
    }

    /// Inserts a document directly, bypassing failure injection and
    /// subscription dispatch. Intended for test seeding.
    pub fn seed(&self, collection: &str, id: &str, fields: Fields) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Returns the number of documents in a collection.
    pub fn collection_len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn take_injected(&self) -> StoreResult<()> {
        match self.injected.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn notify(&self, path: &DocumentPath, fields: Option<&Fields>) {
        let callbacks: Vec<WatchFn> = {
            let watchers = self.watchers.lock();
            watchers
                .get(&path.to_string())
                .map(|entries| entries.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(fields);
        }
    }

    fn order_value(doc: &Document, order_by: &str) -> Value {
        if order_by == "id" {
            Value::String(doc.id.clone())
        } else {
            doc.fields.get(order_by).cloned().unwrap_or(Value::Null)
        }
    }

    fn cmp_docs(a: &Document, b: &Document, order_by: &str, direction: Direction) -> Ordering {
        let ord = cmp_values(&Self::order_value(a, order_by), &Self::order_value(b, order_by))
            .then_with(|| a.id.cmp(&b.id));
        match direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }

    fn cmp_to_cursor(
        doc: &Document,
        cursor: &Cursor,
        order_by: &str,
        direction: Direction,
    ) -> Ordering {
        let ord = cmp_values(&Self::order_value(doc, order_by), &cursor.order_value)
            .then_with(|| doc.id.cmp(&cursor.doc_id));
        match direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<Fields>> {
        self.take_injected()?;
        Ok(self
            .collections
            .read()
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()))
            .cloned())
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        self.take_injected()?;
        self.collections
            .write()
            .entry(path.collection().to_string())
            .or_default()
            .insert(path.id().to_string(), fields.clone());
        self.notify(path, Some(&fields));
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        self.take_injected()?;
        let merged = {
            let mut collections = self.collections.write();
            let docs = collections.entry(path.collection().to_string()).or_default();
            let merged = docs.entry(path.id().to_string()).or_default();
            for (name, value) in fields {
                merged.insert(name, value);
            }
            merged.clone()
        };
        self.notify(path, Some(&merged));
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        self.take_injected()?;
        let removed = self
            .collections
            .write()
            .get_mut(path.collection())
            .and_then(|docs| docs.remove(path.id()))
            .is_some();
        if removed {
            self.notify(path, None);
        }
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        self.take_injected()?;
        let id = uuid::Uuid::new_v4().to_string();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        self.take_injected()?;

        let mut matched: Vec<Document> = {
            let collections = self.collections.read();
            let Some(docs) = collections.get(&query.collection) else {
                return Ok(Vec::new());
            };
            docs.iter()
                .filter(|(_, fields)| {
                    query.filters.iter().all(|filter| {
                        let candidate = fields.get(&filter.field).unwrap_or(&Value::Null);
                        filter.matches(candidate)
                    })
                })
                .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                .collect()
        };

        matched.sort_by(|a, b| Self::cmp_docs(a, b, &query.order_by, query.direction));

        if let Some(cursor) = &query.start_after {
            matched.retain(|doc| {
                Self::cmp_to_cursor(doc, cursor, &query.order_by, query.direction)
                    == Ordering::Greater
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    fn subscribe(
        &self,
        path: &DocumentPath,
        on_change: ChangeCallback,
    ) -> StoreResult<Subscription> {
        let id = self.next_watch_id.fetch_add(1, AtomicOrdering::SeqCst);
        let key = path.to_string();
        let callback: WatchFn = Arc::from(on_change);

        self.watchers
            .lock()
            .entry(key.clone())
            .or_default()
            .push((id, callback));

        let watchers = Arc::clone(&self.watchers);
        Ok(Subscription::new(move || {
            let mut watchers = watchers.lock();
            if let Some(entries) = watchers.get_mut(&key) {
                entries.retain(|(entry_id, _)| *entry_id != id);
                if entries.is_empty() {
                    watchers.remove(&key);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FilterOp;
    use serde_json::json;

    fn event_fields(name: &str, price: i64) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), json!(name));
        fields.insert("price".into(), json!(price));
        fields
    }

    #[tokio::test]
    async fn set_get_roundtrip() {
        let store = MemoryStore::new();
        let path = DocumentPath::new("events", "evt-1");

        store.set(&path, event_fields("Gala", 30)).await.unwrap();

        let fields = store.get(&path).await.unwrap().unwrap();
        assert_eq!(fields["name"], json!("Gala"));
        assert!(store.get(&DocumentPath::new("events", "nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_merges_and_upserts() {
        let store = MemoryStore::new();
        let path = DocumentPath::new("events", "evt-1");
        store.set(&path, event_fields("Gala", 30)).await.unwrap();

        let mut patch = Fields::new();
        patch.insert("price".into(), json!(35));
        store.update(&path, patch).await.unwrap();

        let fields = store.get(&path).await.unwrap().unwrap();
        assert_eq!(fields["name"], json!("Gala"));
        assert_eq!(fields["price"], json!(35));

        // Updating an absent document creates it.
        let absent = DocumentPath::new("events", "evt-2");
        store.update(&absent, event_fields("Popup", 5)).await.unwrap();
        assert!(store.get(&absent).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn query_filters_orders_and_limits() {
        let store = MemoryStore::new();
        store.seed("events", "a", event_fields("A", 10));
        store.seed("events", "b", event_fields("B", 30));
        store.seed("events", "c", event_fields("C", 20));
        store.seed("events", "d", event_fields("D", 5));

        let query = Query::collection("events")
            .filter("price", FilterOp::Ge, json!(10))
            .order_by("price", Direction::Descending)
            .limit(2);

        let docs = store.query(&query).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn cursor_continues_after_last_item() {
        let store = MemoryStore::new();
        for (id, price) in [("a", 10), ("b", 20), ("c", 30), ("d", 40)] {
            store.seed("events", id, event_fields(id, price));
        }

        let first = store
            .query(&Query::collection("events").order_by("price", Direction::Ascending).limit(2))
            .await
            .unwrap();
        assert_eq!(first.len(), 2);

        let last = &first[1];
        let cursor = Cursor::new(last.fields["price"].clone(), last.id.clone());
        let second = store
            .query(
                &Query::collection("events")
                    .order_by("price", Direction::Ascending)
                    .start_after(cursor)
                    .limit(2),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = second.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn cursor_positions_by_value_when_document_deleted() {
        let store = MemoryStore::new();
        for (id, price) in [("a", 10), ("b", 20), ("c", 30)] {
            store.seed("events", id, event_fields(id, price));
        }

        // Cursor points at "b", which disappears before the next page.
        let cursor = Cursor::new(json!(20), "b");
        store.delete(&DocumentPath::new("events", "b")).await.unwrap();

        let page = store
            .query(
                &Query::collection("events")
                    .order_by("price", Direction::Ascending)
                    .start_after(cursor),
            )
            .await
            .unwrap();

        let ids: Vec<&str> = page.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let store = MemoryStore::new();
        store.seed("events", "a", event_fields("A", 10));
        store.fail_times(2, StoreError::with_code("unavailable", "backend down"));

        let path = DocumentPath::new("events", "a");
        assert!(store.get(&path).await.is_err());
        assert!(store.get(&path).await.is_err());
        assert!(store.get(&path).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn subscription_receives_updates_until_dropped() {
        let store = MemoryStore::new();
        let path = DocumentPath::new("profiles", "user-1");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        let subscription = store
            .subscribe(
                &path,
                Box::new(move |fields| {
                    seen_clone.lock().push(fields.map(|f| f["name"].clone()));
                }),
            )
            .unwrap();

        store.set(&path, event_fields("Ada", 0)).await.unwrap();
        store.delete(&path).await.unwrap();

        subscription.unsubscribe();
        store.set(&path, event_fields("Bob", 0)).await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen.as_slice(), &[Some(json!("Ada")), None]);
    }
}
