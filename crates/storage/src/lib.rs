#![forbid(unsafe_code)]

pub mod document;
pub mod repository;
pub mod sqlite;
mod watchers;

pub use document::{ProgressRecord, SELECTED_GOAL_FIELD, UserDocument};
pub use repository::{
    InMemoryRecordStore, RecordChange, RecordStore, RecordSubscription, Storage, StorageError,
};
