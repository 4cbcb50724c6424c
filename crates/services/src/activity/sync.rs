use std::sync::Arc;

use storage::repository::{RecordStore, RecordSubscription, StorageError};
use storage::UserDocument;
use stride_core::model::UserId;
use stride_core::tracker::ActivitySnapshot;
use tracing::debug;

/// Writes tracker snapshots to, and listens on, one user's remote record.
///
/// Every write replaces the whole record. Fields owned by other screens
/// (goal selection, profile) are copied from the last record seen so they
/// are not wiped by the overwrite.
#[derive(Clone)]
pub struct RemoteSync {
    user_id: UserId,
    store: Arc<dyn RecordStore>,
    profile: UserDocument,
}

impl RemoteSync {
    #[must_use]
    pub fn new(user_id: UserId, store: Arc<dyn RecordStore>) -> Self {
        Self {
            user_id,
            store,
            profile: UserDocument::default(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Overwrite the remote record with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store rejects the write.
    pub async fn push(&self, snapshot: &ActivitySnapshot) -> Result<(), StorageError> {
        let document = UserDocument::from_snapshot(snapshot).with_profile_from(&self.profile);
        self.store.put_record(&self.user_id, &document).await?;
        debug!(user = %self.user_id, points = snapshot.points, "snapshot pushed");
        Ok(())
    }

    /// Open a change listener on the user's record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot register the listener.
    pub async fn subscribe(&self) -> Result<RecordSubscription, StorageError> {
        self.store.subscribe(&self.user_id).await
    }

    /// Keep the non-tracker fields of a record for later writes.
    pub fn remember_profile(&mut self, document: &UserDocument) {
        self.profile = UserDocument::default().with_profile_from(document);
    }
}

/// Message shown when saving fails.
pub(crate) fn save_error_message(err: &StorageError) -> String {
    format!("Error saving data: {err}")
}

/// Message shown when loading fails.
pub(crate) fn load_error_message(err: &StorageError) -> String {
    format!("Error loading data: {err}")
}
