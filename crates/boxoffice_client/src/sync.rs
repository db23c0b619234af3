//! Conflict-resolving writes against the document store.
//!
//! Writes follow a read-modify-write shape: current remote state is read,
//! concurrent modification is detected by comparing logical
//! `_lastUpdated` stamps, and the configured strategy decides what lands.
//! Every terminal write refreshes the stamp so later writers have a
//! marker to compare against.

use crate::classify::classify;
use crate::config::{ConflictStrategy, RetryPolicy};
use crate::error::{SyncError, SyncResult};
use crate::retry::{execute_with_retry, RetryObserver};
use boxoffice_document::{last_updated, stamp_last_updated, Fields, ProfileValidator, Validator};
use boxoffice_store::{DocumentPath, DocumentStore, StoreError, StoreResult, Subscription};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Collection whose updates get the built-in profile validator.
const PROFILE_COLLECTION: &str = "profiles";

/// Counters for one sync writer instance.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Writes that reached the store.
    pub writes_applied: u64,
    /// Concurrent modifications detected.
    pub conflicts_detected: u64,
    /// Conflicts resolved by field-level merge.
    pub conflicts_merged: u64,
    /// Updates rejected before any network call.
    pub validation_failures: u64,
    /// Individual retry attempts across all writes.
    pub retries: u64,
    /// Message of the most recent terminal failure.
    pub last_error: Option<String>,
}

struct StatsObserver<'a> {
    stats: &'a RwLock<SyncStats>,
}

impl RetryObserver for StatsObserver<'_> {
    fn on_retry(&self, attempt: u32, delay: Duration) {
        self.stats.write().retries += 1;
        debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "write hit a transient failure, retrying"
        );
    }

    fn on_error(&self, error: &SyncError) {
        self.stats.write().last_error = Some(error.to_string());
    }
}

/// Validated, conflict-resolving writer over one document store.
pub struct SyncWriter<S> {
    store: Arc<S>,
    policy: RetryPolicy,
    validator: Option<Arc<dyn Validator>>,
    stats: RwLock<SyncStats>,
}

impl<S: DocumentStore> SyncWriter<S> {
    /// Creates a writer with no explicit validator; profile-shaped paths
    /// still get the built-in one.
    pub fn new(store: Arc<S>, policy: RetryPolicy) -> Self {
        Self {
            store,
            policy,
            validator: None,
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Installs an explicit validator, overriding the built-in selection.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Applies `updates` to the document at `path` with conflict
    /// resolution per the policy's strategy. Returns `true` on success.
    ///
    /// A failed conflict read does not fail the write: the update is
    /// applied directly, on the grounds that losing the user's change is
    /// worse than losing the arbitration.
    pub async fn update(&self, path: &DocumentPath, mut updates: Fields) -> SyncResult<bool> {
        self.check_valid(path, &updates)?;

        if self.policy.conflict_strategy != ConflictStrategy::ClientWins {
            match self.read_current(path).await {
                Ok(Some(current)) => {
                    if is_stale(&current, &updates) {
                        self.stats.write().conflicts_detected += 1;
                        if self.policy.conflict_strategy == ConflictStrategy::Merge {
                            debug!(path = %path, "concurrent modification detected, merging");
                            updates = merge_fields(current, updates);
                            self.stats.write().conflicts_merged += 1;
                        } else {
                            // server-wins does not arbitrate field-by-field;
                            // the update still lands with a refreshed stamp.
                            warn!(
                                path = %path,
                                "concurrent modification detected, applying update anyway"
                            );
                        }
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(path = %path, code = %error.code, "conflict read failed, applying update directly");
                }
            }
        }

        stamp_last_updated(&mut updates);
        self.write(path, updates).await?;
        self.stats.write().writes_applied += 1;
        Ok(true)
    }

    /// Replaces the document unconditionally: no conflict read, but still
    /// validated, stamped, and retried. Returns `true` on success.
    pub async fn set(&self, path: &DocumentPath, mut data: Fields) -> SyncResult<bool> {
        self.check_valid(path, &data)?;
        stamp_last_updated(&mut data);

        let observer = StatsObserver { stats: &self.stats };
        let store = &self.store;
        let data = &data;
        execute_with_retry(
            &self.policy,
            Some(&path.to_string()),
            &observer,
            move || async move { store.set(path, data.clone()).await },
        )
        .await?;

        self.stats.write().writes_applied += 1;
        Ok(true)
    }

    /// Wraps the store's live-update mechanism for one document.
    ///
    /// `on_update` may reject a payload by returning an error; rejections
    /// are classified into a [`SyncError`] and routed to `on_error`
    /// instead of unwinding into the dispatcher.
    pub fn subscribe<U, E>(
        &self,
        path: &DocumentPath,
        on_update: U,
        on_error: E,
    ) -> StoreResult<Subscription>
    where
        U: Fn(Option<&Fields>) -> Result<(), StoreError> + Send + Sync + 'static,
        E: Fn(SyncError) + Send + Sync + 'static,
    {
        let target = path.to_string();
        self.store.subscribe(
            path,
            Box::new(move |fields| {
                if let Err(source) = on_update(fields) {
                    let code = classify(&source);
                    let mut error = SyncError::new(code, source.message);
                    error.path = Some(source.path.unwrap_or_else(|| target.clone()));
                    warn!(path = %target, code = %error.code, "subscription callback rejected update");
                    on_error(error);
                }
            }),
        )
    }

    fn check_valid(&self, path: &DocumentPath, fields: &Fields) -> SyncResult<()> {
        let validator: Option<Arc<dyn Validator>> = match &self.validator {
            Some(explicit) => Some(Arc::clone(explicit)),
            None if path.collection() == PROFILE_COLLECTION => Some(Arc::new(ProfileValidator)),
            None => None,
        };

        if let Some(validator) = validator {
            if let Err(errors) = validator.validate(fields) {
                self.stats.write().validation_failures += 1;
                warn!(path = %path, fields = errors.len(), "update rejected by validation");
                return Err(SyncError::validation(errors, path.to_string()));
            }
        }
        Ok(())
    }

    async fn read_current(&self, path: &DocumentPath) -> SyncResult<Option<Fields>> {
        let observer = StatsObserver { stats: &self.stats };
        let store = &self.store;
        execute_with_retry(
            &self.policy,
            Some(&path.to_string()),
            &observer,
            move || async move { store.get(path).await },
        )
        .await
    }

    async fn write(&self, path: &DocumentPath, updates: Fields) -> SyncResult<()> {
        let observer = StatsObserver { stats: &self.stats };
        let store = &self.store;
        let updates = &updates;
        execute_with_retry(
            &self.policy,
            Some(&path.to_string()),
            &observer,
            move || async move { store.update(path, updates.clone()).await },
        )
        .await
    }
}

/// True when the remote record carries a newer logical stamp than the
/// update. An unstamped update counts as older than any stamped remote.
fn is_stale(current: &Fields, updates: &Fields) -> bool {
    match last_updated(current) {
        Some(remote) => remote > last_updated(updates).unwrap_or(0),
        None => false,
    }
}

/// Merge resolution: update fields win field-by-field, remote fields
/// absent from the update survive.
fn merge_fields(current: Fields, updates: Fields) -> Fields {
    let mut merged = current;
    for (name, value) in updates {
        merged.insert(name, value);
    }
    merged
}
