use std::collections::HashMap;
use std::sync::Mutex;

use stride_core::model::UserId;
use tokio::sync::watch;

use crate::document::UserDocument;
use crate::repository::{RecordSubscription, StorageError};

type Channel = watch::Sender<Option<UserDocument>>;

/// In-process fan-out of record changes, one watch channel per user.
#[derive(Default)]
pub(crate) struct Watchers {
    channels: Mutex<HashMap<UserId, Channel>>,
}

impl Watchers {
    /// Register a listener. Its first `next()` yields `current` right away.
    pub(crate) fn subscribe(
        &self,
        user_id: &UserId,
        current: Option<UserDocument>,
    ) -> Result<RecordSubscription, StorageError> {
        let mut guard = self
            .channels
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let sender = guard
            .entry(user_id.clone())
            .or_insert_with(|| watch::channel(None).0);
        if sender.receiver_count() == 0 {
            sender.send_replace(current);
        }
        let mut rx = sender.subscribe();
        rx.mark_changed();
        Ok(RecordSubscription::new(user_id.clone(), rx))
    }

    pub(crate) fn publish(
        &self,
        user_id: &UserId,
        document: &UserDocument,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .channels
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let Some(sender) = guard.get(user_id) else {
            return Ok(());
        };
        // nobody left listening; the next subscribe starts a fresh channel
        if sender.receiver_count() == 0 {
            guard.remove(user_id);
        } else {
            sender.send_replace(Some(document.clone()));
        }
        Ok(())
    }
}
