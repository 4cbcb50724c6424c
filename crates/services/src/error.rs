//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use stride_core::TrackerError;
use stride_core::model::FitnessGoalError;

use crate::step_source::StepSourceError;

/// Errors emitted by `TrackerSession` and its background loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerServiceError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    StepSource(#[from] StepSourceError),
    #[error("tracker loop has stopped")]
    Closed,
    #[error("tracker task failed: {0}")]
    Task(String),
}

/// Errors emitted by `GoalSelectionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GoalSelectionError {
    #[error("no fitness goal selected")]
    NoSelection,
    #[error(transparent)]
    Goal(#[from] FitnessGoalError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
