#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use services::{Clock, TrackerSession};
use storage::repository::{RecordStore, RecordSubscription, StorageError};
use storage::{InMemoryRecordStore, ProgressRecord, UserDocument};
use stride_core::model::{TrackerSettings, UserId};
use stride_core::time::fixed_clock;

/// Store whose backend is always unreachable.
pub struct OfflineStore;

#[async_trait]
impl RecordStore for OfflineStore {
    async fn get_record(&self, _user_id: &UserId) -> Result<Option<UserDocument>, StorageError> {
        Err(offline())
    }

    async fn put_record(
        &self,
        _user_id: &UserId,
        _document: &UserDocument,
    ) -> Result<(), StorageError> {
        Err(offline())
    }

    async fn merge_fields(
        &self,
        _user_id: &UserId,
        _fields: Map<String, Value>,
    ) -> Result<UserDocument, StorageError> {
        Err(offline())
    }

    async fn subscribe(&self, _user_id: &UserId) -> Result<RecordSubscription, StorageError> {
        Err(offline())
    }
}

fn offline() -> StorageError {
    StorageError::Connection("offline".into())
}

pub fn user() -> UserId {
    UserId::new("runner-1").unwrap()
}

pub fn clock() -> Clock {
    fixed_clock()
}

pub fn session_on(store: Arc<dyn RecordStore>, settings: TrackerSettings) -> TrackerSession {
    TrackerSession::new(user(), store, clock(), settings)
}

pub fn in_memory() -> Arc<InMemoryRecordStore> {
    Arc::new(InMemoryRecordStore::new())
}

/// Record with the given counts and one progress slot per `(key, steps)`.
pub fn document(steps: u32, calories: f64, points: u8, days: &[(&str, &str, u32)]) -> UserDocument {
    let mut doc = UserDocument {
        step_count: steps,
        calories_burned: calories,
        points,
        ..UserDocument::default()
    };
    for (key, label, day_steps) in days {
        doc.progress_data.insert(
            (*key).to_owned(),
            ProgressRecord {
                day: (*label).to_owned(),
                steps: *day_steps,
                calories: f64::from(*day_steps) * 0.045,
            },
        );
    }
    doc
}
