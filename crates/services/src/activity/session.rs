use std::sync::Arc;

use storage::repository::{RecordChange, RecordStore, RecordSubscription};
use stride_core::model::{TrackerSettings, UserId};
use stride_core::tracker::AchievementEvent;
use stride_core::{ActivityTracker, Clock};
use tracing::{debug, info, warn};

use super::sync::{RemoteSync, load_error_message, save_error_message};
use super::view::ActivityView;
use crate::error::TrackerServiceError;

/// Result of pushing the tracker state to the remote record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing to write: steps and calories are both zero.
    Skipped,
    Written,
    /// The write failed; the message is what the user sees.
    Failed(String),
}

/// What a step sample, or a goal that was already met, caused.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    pub achievement: Option<AchievementEvent>,
    pub sync: SyncStatus,
}

/// One user's tracker wired to the remote record store.
///
/// The session is the single owner of the tracker state. Remote failures are
/// recorded in [`TrackerSession::last_error`] and logged, never retried; local
/// state is kept as-is when a write fails.
pub struct TrackerSession {
    tracker: ActivityTracker,
    sync: RemoteSync,
    clock: Clock,
    remote: Option<RecordSubscription>,
    last_error: Option<String>,
}

impl TrackerSession {
    #[must_use]
    pub fn new(
        user_id: UserId,
        store: Arc<dyn RecordStore>,
        clock: Clock,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            tracker: ActivityTracker::new(settings),
            sync: RemoteSync::new(user_id, store),
            clock,
            remote: None,
            last_error: None,
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &ActivityTracker {
        &self.tracker
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        self.sync.user_id()
    }

    #[must_use]
    pub fn view(&self) -> ActivityView {
        ActivityView::from_tracker(&self.tracker, self.last_error.as_deref())
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Feed a sensor reading, evaluate the goal and push the new state.
    pub async fn on_step_sample(&mut self, steps: u32) -> SampleOutcome {
        let achievement = self.tracker.on_step_sample(steps);
        if let Some(event) = &achievement {
            log_achievement(event);
        }
        let sync = self.sync_to_remote().await;
        SampleOutcome { achievement, sync }
    }

    /// Change the daily calorie goal.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` for zero, negative or non-finite goals.
    pub fn set_calorie_goal(&mut self, calorie_goal: f64) -> Result<(), TrackerServiceError> {
        self.tracker.set_calorie_goal(calorie_goal)?;
        debug!(calorie_goal, step_goal = self.tracker.step_goal(), "calorie goal set");
        Ok(())
    }

    pub fn set_running_mode(&mut self, enabled: bool) {
        self.tracker.set_running_mode(enabled);
        debug!(enabled, step_goal = self.tracker.step_goal(), "running mode set");
    }

    /// Submit the goal asked for after an achievement, starting a new cycle.
    ///
    /// When the current counts already meet the new goal the achievement is
    /// counted right away and the new points are pushed.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Tracker` for a degenerate goal.
    pub async fn submit_new_goal(
        &mut self,
        calorie_goal: f64,
    ) -> Result<SampleOutcome, TrackerServiceError> {
        let achievement = self.tracker.submit_new_goal(calorie_goal)?;
        let sync = match &achievement {
            Some(event) => {
                log_achievement(event);
                self.sync_to_remote().await
            }
            None => SyncStatus::Skipped,
        };
        Ok(SampleOutcome { achievement, sync })
    }

    pub fn acknowledge_goal_prompt(&mut self) {
        self.tracker.acknowledge_goal_prompt();
    }

    pub fn acknowledge_badge(&mut self) {
        self.tracker.acknowledge_badge();
    }

    /// Overwrite the remote record with the current state and today's progress.
    ///
    /// The all-zero state is never written.
    pub async fn sync_to_remote(&mut self) -> SyncStatus {
        if !self.tracker.should_sync() {
            return SyncStatus::Skipped;
        }

        let snapshot = self.tracker.snapshot(self.clock.today());
        match self.sync.push(&snapshot).await {
            Ok(()) => SyncStatus::Written,
            Err(err) => {
                warn!(user = %self.sync.user_id(), error = %err, "remote write failed");
                let message = save_error_message(&err);
                self.last_error = Some(message.clone());
                SyncStatus::Failed(message)
            }
        }
    }

    /// Start listening on the remote record.
    ///
    /// Only one listener is kept per session; calling this again while one is
    /// open does nothing. Changes are delivered through
    /// [`TrackerSession::next_remote_change`].
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Storage` if the listener cannot be
    /// registered. The error is also recorded for display.
    pub async fn load_from_remote(&mut self) -> Result<(), TrackerServiceError> {
        if self.remote.is_some() {
            return Ok(());
        }
        match self.sync.subscribe().await {
            Ok(subscription) => {
                self.remote = Some(subscription);
                Ok(())
            }
            Err(err) => {
                warn!(user = %self.sync.user_id(), error = %err, "remote subscribe failed");
                self.last_error = Some(load_error_message(&err));
                Err(err.into())
            }
        }
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.remote.is_some()
    }

    /// Wait for the next remote change and apply it.
    ///
    /// Returns `None` when no listener is open or the store went away.
    pub async fn next_remote_change(&mut self) -> Option<RecordChange> {
        let change = self.remote.as_mut()?.next().await;
        match change {
            Some(change) => {
                self.apply_remote(&change);
                Some(change)
            }
            None => {
                self.remote = None;
                None
            }
        }
    }

    /// Replace counts, points and history with the remote record.
    ///
    /// An absent record leaves the local state alone. This never writes back
    /// and never evaluates achievements.
    pub fn apply_remote(&mut self, change: &RecordChange) {
        let Some(document) = &change.document else {
            return;
        };
        self.tracker.apply_snapshot(document.to_snapshot());
        self.sync.remember_profile(document);
        debug!(user = %change.user_id, steps = document.step_count, "remote snapshot applied");
    }

    /// Release the remote listener.
    pub fn close(&mut self) {
        if let Some(subscription) = self.remote.take() {
            subscription.close();
        }
    }

    pub(crate) fn take_remote(&mut self) -> Option<RecordSubscription> {
        self.remote.take()
    }

    pub(crate) fn restore_remote(&mut self, remote: Option<RecordSubscription>) {
        self.remote = remote;
    }
}

impl Drop for TrackerSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn log_achievement(event: &AchievementEvent) {
    info!(points = event.points, "achievement unlocked");
    if event.badge_earned {
        info!("badge earned");
    }
}
