//! Cursor-based pagination with self-healing recovery.
//!
//! The engine pages through one collection with forward-only cursors.
//! Two failure modes are recovered from rather than surfaced as empty
//! screens: an unusable continuation cursor (the snapshotted last item
//! can no longer anchor a query) and an out-of-bounds page (the data
//! shrank underneath the caller). Both reset to page 1 and attach a
//! non-fatal advisory to the result, so the UI can keep rendering data
//! and optionally inform the user.

use crate::config::RetryPolicy;
use crate::error::SyncError;
use crate::retry::{execute_with_retry, RetryObserver};
use boxoffice_document::{Fields, RecordSchema};
use boxoffice_store::{
    Cursor, Direction, Document, DocumentPath, DocumentStore, Filter, KeyValueStore, Query,
    StorageError, StorageResult,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cursor position and page metadata for one paginated collection view.
///
/// States are replaced, never mutated: each fetch produces a fresh state.
/// `current_page == 1` iff `has_prev_page == false`, and
/// `last_visible_id` is set iff the last fetch returned at least one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationState {
    /// Id of the last item on the current page.
    pub last_visible_id: Option<String>,
    /// Snapshot of the last item's fields, used to rebuild a cursor.
    pub last_visible_fields: Option<Fields>,
    /// 1-based page number.
    pub current_page: u32,
    /// Whether a further page exists.
    pub has_next_page: bool,
    /// Whether a previous page exists.
    pub has_prev_page: bool,
    /// Page size the state was produced with.
    pub page_size: usize,
    /// When the state was produced; drives expiry on load.
    pub timestamp: DateTime<Utc>,
}

impl PaginationState {
    /// A fresh first-page state with no cursor.
    pub fn initial(page_size: usize) -> Self {
        Self {
            last_visible_id: None,
            last_visible_fields: None,
            current_page: 1,
            has_next_page: false,
            has_prev_page: false,
            page_size,
            timestamp: Utc::now(),
        }
    }

    /// True once `max_age` has elapsed since the state was produced.
    pub fn is_expired(&self, max_age: Duration) -> bool {
        Utc::now()
            .signed_duration_since(self.timestamp)
            .to_std()
            .is_ok_and(|elapsed| elapsed > max_age)
    }
}

/// Options for one paginated view.
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Items per page.
    pub page_size: usize,
    /// Ordering field; `"id"` orders by document id.
    pub order_by: String,
    /// Ordering direction.
    pub direction: Direction,
    /// Filter predicates applied before ordering.
    pub filters: Vec<Filter>,
}

impl PageOptions {
    /// Creates options with the given page size, ordered by document id.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            order_by: "id".to_string(),
            direction: Direction::Ascending,
            filters: Vec::new(),
        }
    }

    /// Sets the ordering field and direction.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = field.into();
        self.direction = direction;
        self
    }

    /// Adds a filter predicate.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// A non-fatal condition the engine recovered from.
///
/// Advisories ride alongside usable data; the caller may inform the user
/// without losing their place entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAdvisory {
    /// The continuation cursor could not be rebuilt; pagination reset to
    /// page 1.
    InvalidCursor,
    /// The requested page is past the end of the data; page 1 was
    /// returned instead.
    OutOfBounds,
    /// The fetch failed after retries; an empty first page was returned.
    FetchFailed(String),
}

impl PageAdvisory {
    /// Stable machine-readable code for the condition.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCursor => "INVALID_CURSOR",
            Self::OutOfBounds => "OUT_OF_BOUNDS",
            Self::FetchFailed(_) => "FETCH_FAILED",
        }
    }
}

impl fmt::Display for PageAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCursor => {
                f.write_str("your place in the list expired; showing the first page")
            }
            Self::OutOfBounds => {
                f.write_str("that page no longer exists; showing the first page")
            }
            Self::FetchFailed(message) => write!(f, "could not load the list: {message}"),
        }
    }
}

/// Result of one page fetch: sanitized records, the replacement state,
/// and an advisory when the engine had to self-heal.
#[derive(Debug, Clone)]
pub struct PageFetchResult {
    /// Sanitized records for the page.
    pub data: Vec<Fields>,
    /// Replacement pagination state.
    pub state: PaginationState,
    /// Non-fatal recovery advisory, when one applies.
    pub advisory: Option<PageAdvisory>,
}

/// Counters for one paginator instance.
#[derive(Debug, Clone, Default)]
pub struct PageStats {
    /// Pages successfully fetched.
    pub pages_fetched: u64,
    /// Invalid-cursor resets performed.
    pub cursor_resets: u64,
    /// Out-of-bounds resets performed.
    pub out_of_bounds_resets: u64,
    /// Fetches that failed after retries.
    pub failed_fetches: u64,
    /// Individual retry attempts across all fetches.
    pub retries: u64,
    /// Message of the most recent terminal failure.
    pub last_error: Option<String>,
}

struct StatsObserver<'a> {
    stats: &'a RwLock<PageStats>,
}

impl RetryObserver for StatsObserver<'_> {
    fn on_retry(&self, attempt: u32, delay: Duration) {
        self.stats.write().retries += 1;
        debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "page fetch hit a transient failure, retrying"
        );
    }

    fn on_error(&self, error: &SyncError) {
        self.stats.write().last_error = Some(error.to_string());
    }
}

/// Cursor-based page fetcher over one document store.
///
/// Every returned record passes through the schema sanitizer, so screens
/// never see a partially-populated document.
pub struct Paginator<S> {
    store: Arc<S>,
    schema: RecordSchema,
    policy: RetryPolicy,
    stats: RwLock<PageStats>,
}

impl<S: DocumentStore> Paginator<S> {
    /// Creates a paginator over `store` sanitizing with `schema`.
    pub fn new(store: Arc<S>, schema: RecordSchema, policy: RetryPolicy) -> Self {
        Self {
            store,
            schema,
            policy,
            stats: RwLock::new(PageStats::default()),
        }
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> PageStats {
        self.stats.read().clone()
    }

    /// Fetches a page of `collection`.
    ///
    /// With no `previous` state this is the first page. With a previous
    /// state carrying a cursor, fetches the page after it; an unusable
    /// cursor or an out-of-range page resets to page 1 and attaches the
    /// matching advisory. A terminal failure after retries yields empty
    /// data, a reset state, and a [`PageAdvisory::FetchFailed`].
    pub async fn fetch_page(
        &self,
        collection: &str,
        options: &PageOptions,
        previous: Option<&PaginationState>,
    ) -> PageFetchResult {
        let mut advisory = None;
        let mut page = 1u32;
        let mut cursor = None;

        if let Some(prev) = previous {
            if let Some(last_id) = &prev.last_visible_id {
                match self.rebuild_cursor(collection, last_id, prev, options).await {
                    Some(rebuilt) => {
                        cursor = Some(rebuilt);
                        page = prev.current_page + 1;
                    }
                    None => {
                        warn!(collection, "continuation cursor unusable, resetting to page 1");
                        self.stats.write().cursor_resets += 1;
                        advisory = Some(PageAdvisory::InvalidCursor);
                    }
                }
            }
        }

        let mut docs = match self.run_query(collection, options, cursor).await {
            Ok(docs) => docs,
            Err(error) => return self.failed(collection, options, &error),
        };

        // A data set that shrank can leave the caller past its end; an
        // empty continuation page falls back to the first page.
        if docs.is_empty() && page > 1 {
            warn!(collection, page, "page out of bounds, falling back to page 1");
            self.stats.write().out_of_bounds_resets += 1;
            advisory = Some(PageAdvisory::OutOfBounds);
            page = 1;
            docs = match self.run_query(collection, options, None).await {
                Ok(docs) => docs,
                Err(error) => return self.failed(collection, options, &error),
            };
        }

        // One item past the page size means a further page exists.
        let has_next = docs.len() > options.page_size;
        docs.truncate(options.page_size);

        let state = match docs.last() {
            Some(last) => PaginationState {
                last_visible_id: Some(last.id.clone()),
                last_visible_fields: Some(last.fields.clone()),
                current_page: page,
                has_next_page: has_next,
                has_prev_page: page > 1,
                page_size: options.page_size,
                timestamp: Utc::now(),
            },
            None => PaginationState::initial(options.page_size),
        };

        self.stats.write().pages_fetched += 1;
        let data = docs
            .iter()
            .map(|doc| self.schema.sanitize(Some(&doc.fields)))
            .collect();

        PageFetchResult {
            data,
            state,
            advisory,
        }
    }

    /// Fetches the page after `state`. Returns the state unchanged (with
    /// no data) when no next page exists.
    pub async fn fetch_next_page(
        &self,
        collection: &str,
        state: &PaginationState,
        options: &PageOptions,
    ) -> PageFetchResult {
        if !state.has_next_page {
            return PageFetchResult {
                data: Vec::new(),
                state: state.clone(),
                advisory: None,
            };
        }
        self.fetch_page(collection, options, Some(state)).await
    }

    /// Navigates backwards by resetting to page 1.
    ///
    /// The store only supports forward cursors, so true previous-page
    /// reconstruction is not offered.
    pub async fn fetch_prev_page(
        &self,
        collection: &str,
        _state: &PaginationState,
        options: &PageOptions,
    ) -> PageFetchResult {
        self.fetch_page(collection, options, None).await
    }

    /// Rebuilds a continuation cursor from the snapshotted last item.
    ///
    /// Prefers the live document's ordering value (the snapshot may be
    /// stale), falls back to the snapshot when the document is gone or
    /// unreadable, and gives up when neither carries the ordering field.
    async fn rebuild_cursor(
        &self,
        collection: &str,
        last_id: &str,
        prev: &PaginationState,
        options: &PageOptions,
    ) -> Option<Cursor> {
        if options.order_by == "id" {
            return Some(Cursor::new(Value::String(last_id.to_string()), last_id));
        }

        let snapshot = prev.last_visible_fields.as_ref()?;
        let path = DocumentPath::new(collection, last_id);

        let order_value = match self.store.get(&path).await {
            Ok(Some(current)) => current
                .get(&options.order_by)
                .cloned()
                .or_else(|| snapshot.get(&options.order_by).cloned()),
            Ok(None) => {
                debug!(collection, last_id, "cursor document deleted, positioning by snapshot");
                snapshot.get(&options.order_by).cloned()
            }
            Err(error) => {
                debug!(collection, last_id, %error, "cursor document unreadable, positioning by snapshot");
                snapshot.get(&options.order_by).cloned()
            }
        };

        order_value.map(|value| Cursor::new(value, last_id))
    }

    async fn run_query(
        &self,
        collection: &str,
        options: &PageOptions,
        cursor: Option<Cursor>,
    ) -> Result<Vec<Document>, SyncError> {
        let mut query = Query::collection(collection)
            .order_by(options.order_by.clone(), options.direction)
            .limit(options.page_size + 1);
        query.filters = options.filters.clone();
        if let Some(cursor) = cursor {
            query = query.start_after(cursor);
        }

        let observer = StatsObserver { stats: &self.stats };
        let store = &self.store;
        let query = &query;
        execute_with_retry(&self.policy, Some(collection), &observer, move || async move {
            store.query(query).await
        })
        .await
    }

    fn failed(
        &self,
        collection: &str,
        options: &PageOptions,
        error: &SyncError,
    ) -> PageFetchResult {
        self.stats.write().failed_fetches += 1;
        warn!(collection, code = %error.code, "page fetch failed after retries");
        PageFetchResult {
            data: Vec::new(),
            state: PaginationState::initial(options.page_size),
            advisory: Some(PageAdvisory::FetchFailed(error.message.clone())),
        }
    }
}

/// Persists a pagination state under `key`.
pub fn save_state(
    storage: &dyn KeyValueStore,
    key: &str,
    state: &PaginationState,
) -> StorageResult<()> {
    let encoded = serde_json::to_string(state)
        .map_err(|source| StorageError::Serialization(source.to_string()))?;
    storage.set(key, &encoded)
}

/// Loads a persisted pagination state.
///
/// Expired and corrupt entries are removed from storage and reported as
/// absent, so a stale cursor never anchors a new session.
pub fn load_state(
    storage: &dyn KeyValueStore,
    key: &str,
    max_age: Duration,
) -> StorageResult<Option<PaginationState>> {
    let Some(encoded) = storage.get(key)? else {
        return Ok(None);
    };

    let state: PaginationState = match serde_json::from_str(&encoded) {
        Ok(state) => state,
        Err(source) => {
            warn!(key, %source, "discarding corrupt pagination state");
            storage.remove(key)?;
            return Ok(None);
        }
    };

    if state.is_expired(max_age) {
        debug!(key, "discarding expired pagination state");
        storage.remove(key)?;
        return Ok(None);
    }

    Ok(Some(state))
}
