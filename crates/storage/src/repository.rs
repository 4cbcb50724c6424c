use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use stride_core::model::UserId;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::document::UserDocument;
use crate::watchers::Watchers;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Latest state of a watched record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordChange {
    pub user_id: UserId,
    /// `None` while the user has no record yet.
    pub document: Option<UserDocument>,
}

/// Live listener on one user's record.
///
/// The first call to [`RecordSubscription::next`] yields the record as it is
/// at subscription time; later calls wait for the next write. Dropping the
/// handle (or calling [`RecordSubscription::close`]) releases the listener.
#[derive(Debug)]
pub struct RecordSubscription {
    user_id: UserId,
    rx: watch::Receiver<Option<UserDocument>>,
}

impl RecordSubscription {
    pub(crate) fn new(user_id: UserId, rx: watch::Receiver<Option<UserDocument>>) -> Self {
        Self { user_id, rx }
    }

    /// Wait for the next change. Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<RecordChange> {
        self.rx.changed().await.ok()?;
        let document = self.rx.borrow_and_update().clone();
        Some(RecordChange {
            user_id: self.user_id.clone(),
            document,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn close(self) {
        debug!(user = %self.user_id, "record subscription closed");
    }
}

/// Repository contract for per-user activity records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the user's record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures. A missing record is `Ok(None)`.
    async fn get_record(&self, user_id: &UserId) -> Result<Option<UserDocument>, StorageError>;

    /// Replace the user's record as a whole. Fields absent from `document` are lost.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn put_record(&self, user_id: &UserId, document: &UserDocument)
    -> Result<(), StorageError>;

    /// Set the given top-level fields, keeping every other field as stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the merged record is malformed or cannot be stored.
    async fn merge_fields(
        &self,
        user_id: &UserId,
        fields: Map<String, Value>,
    ) -> Result<UserDocument, StorageError>;

    /// Listen for changes to the user's record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the current record cannot be read.
    async fn subscribe(&self, user_id: &UserId) -> Result<RecordSubscription, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<Mutex<HashMap<UserId, UserDocument>>>,
    watchers: Arc<Watchers>,
}

impl InMemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_record(&self, user_id: &UserId) -> Result<Option<UserDocument>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(user_id).cloned())
    }

    async fn put_record(
        &self,
        user_id: &UserId,
        document: &UserDocument,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        self.watchers.publish(user_id, document)?;
        guard.insert(user_id.clone(), document.clone());
        drop(guard);
        debug!(user = %user_id, steps = document.step_count, "record overwritten");
        Ok(())
    }

    async fn merge_fields(
        &self,
        user_id: &UserId,
        fields: Map<String, Value>,
    ) -> Result<UserDocument, StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let merged = guard
            .get(user_id)
            .cloned()
            .unwrap_or_default()
            .merged(fields)?;
        self.watchers.publish(user_id, &merged)?;
        guard.insert(user_id.clone(), merged.clone());
        drop(guard);
        debug!(user = %user_id, "record fields merged");
        Ok(merged)
    }

    async fn subscribe(&self, user_id: &UserId) -> Result<RecordSubscription, StorageError> {
        // hold the record lock so no write slips between the read and the registration
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let current = guard.get(user_id).cloned();
        let subscription = self.watchers.subscribe(user_id, current)?;
        drop(guard);
        Ok(subscription)
    }
}

/// Aggregates the record store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub records: Arc<dyn RecordStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let records: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
        Self { records }
    }
}
