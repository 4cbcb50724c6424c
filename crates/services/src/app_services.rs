use std::sync::Arc;

use storage::repository::{RecordStore, Storage};
use stride_core::model::{TrackerSettings, UserId};

use crate::Clock;
use crate::activity::TrackerSession;
use crate::error::AppServicesError;
use crate::goal_selection_service::GoalSelectionService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    settings: TrackerSettings,
    storage: Storage,
    goal_selection: Arc<GoalSelectionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: TrackerSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, settings))
    }

    /// Build services over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: TrackerSettings) -> Self {
        Self::from_storage(Storage::in_memory(), clock, settings)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, settings: TrackerSettings) -> Self {
        let goal_selection = Arc::new(GoalSelectionService::new(Arc::clone(&storage.records)));
        Self {
            clock,
            settings,
            storage,
            goal_selection,
        }
    }

    /// Fresh tracker session for `user_id` with the configured settings.
    #[must_use]
    pub fn tracker_session(&self, user_id: UserId) -> TrackerSession {
        TrackerSession::new(
            user_id,
            Arc::clone(&self.storage.records),
            self.clock,
            self.settings.clone(),
        )
    }

    #[must_use]
    pub fn goal_selection(&self) -> Arc<GoalSelectionService> {
        Arc::clone(&self.goal_selection)
    }

    #[must_use]
    pub fn records(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.storage.records)
    }

    #[must_use]
    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }
}
