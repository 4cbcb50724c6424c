use storage::repository::{RecordChange, RecordSubscription};
use stride_core::tracker::AchievementEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::session::{SampleOutcome, SyncStatus, TrackerSession};
use super::view::ActivityView;
use crate::error::TrackerServiceError;
use crate::step_source::{StepFeed, StepSource};

/// User actions delivered to a running tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerCommand {
    /// A step reading delivered in order with the other commands.
    Sample(u32),
    SetCalorieGoal(f64),
    SetRunningMode(bool),
    /// New goal entered after an achievement; starts the next cycle.
    SubmitNewGoal(f64),
    AcknowledgeGoalPrompt,
    AcknowledgeBadge,
    Shutdown,
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    Updated(Box<ActivityView>),
    AchievementUnlocked(AchievementEvent),
    BadgeEarned,
    PromptNewGoal,
    Error(String),
}

/// Handle to a tracker running on its own task.
pub struct TrackerHandle {
    commands: mpsc::UnboundedSender<TrackerCommand>,
    events: mpsc::UnboundedReceiver<TrackerEvent>,
    task: JoinHandle<TrackerSession>,
}

impl TrackerHandle {
    /// Queue a command for the tracker.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Closed` if the loop has already stopped.
    pub fn send(&self, command: TrackerCommand) -> Result<(), TrackerServiceError> {
        self.commands
            .send(command)
            .map_err(|_| TrackerServiceError::Closed)
    }

    pub async fn next_event(&mut self) -> Option<TrackerEvent> {
        self.events.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_next_event(&mut self) -> Option<TrackerEvent> {
        self.events.try_recv().ok()
    }

    /// Stop the loop, release the sensor and the remote listener, and hand
    /// back the session.
    ///
    /// Commands sent earlier and readings the sensor already delivered are
    /// applied first.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Task` if the loop panicked.
    pub async fn shutdown(self) -> Result<TrackerSession, TrackerServiceError> {
        // the loop may already be gone; joining tells us either way
        let _ = self.commands.send(TrackerCommand::Shutdown);
        self.task
            .await
            .map_err(|err| TrackerServiceError::Task(err.to_string()))
    }
}

/// Start the sensor and the remote listener, then run the tracker on a task.
///
/// A missing or failing step counter is logged and the tracker runs without
/// samples. A failing remote listener is reported as the first event.
pub async fn spawn_tracker(mut session: TrackerSession, source: &dyn StepSource) -> TrackerHandle {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (event_tx, events) = mpsc::unbounded_channel();

    let feed = open_feed(source).await;
    if session.load_from_remote().await.is_err() {
        if let Some(message) = session.last_error() {
            emit(&event_tx, TrackerEvent::Error(message.to_owned()));
        }
    }

    let task = tokio::spawn(run(session, feed, command_rx, event_tx));
    TrackerHandle {
        commands,
        events,
        task,
    }
}

async fn open_feed(source: &dyn StepSource) -> Option<StepFeed> {
    if !source.is_available().await {
        warn!("step counter unavailable, tracking without samples");
        return None;
    }
    match source.watch().await {
        Ok(feed) => Some(feed),
        Err(err) => {
            warn!(error = %err, "could not watch step counter");
            None
        }
    }
}

async fn run(
    mut session: TrackerSession,
    mut feed: Option<StepFeed>,
    mut commands: mpsc::UnboundedReceiver<TrackerCommand>,
    events: mpsc::UnboundedSender<TrackerEvent>,
) -> TrackerSession {
    let mut remote = session.take_remote();

    // commands first: a mode or goal change sent before a reading applies to it
    loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(TrackerCommand::Shutdown) | None => break,
                Some(command) => handle_command(&mut session, command, &events).await,
            },
            steps = next_step(&mut feed) => match steps {
                Some(steps) => apply_sample(&mut session, steps, &events).await,
                None => {
                    debug!("step feed ended");
                    feed = None;
                }
            },
            change = next_change(&mut remote) => match change {
                Some(change) => {
                    session.apply_remote(&change);
                    emit(&events, updated(&session));
                }
                None => {
                    debug!("remote listener ended");
                    remote = None;
                }
            },
        }
    }

    if let Some(mut feed) = feed {
        // readings delivered before shutdown still count
        while let Some(steps) = feed.try_next() {
            apply_sample(&mut session, steps, &events).await;
        }
        feed.stop();
    }
    session.restore_remote(remote);
    session.close();
    debug!(user = %session.user_id(), "tracker stopped");
    session
}

async fn next_step(feed: &mut Option<StepFeed>) -> Option<u32> {
    match feed {
        Some(feed) => feed.next().await,
        None => std::future::pending().await,
    }
}

async fn next_change(remote: &mut Option<RecordSubscription>) -> Option<RecordChange> {
    match remote {
        Some(remote) => remote.next().await,
        None => std::future::pending().await,
    }
}

async fn apply_sample(
    session: &mut TrackerSession,
    steps: u32,
    events: &mpsc::UnboundedSender<TrackerEvent>,
) {
    let outcome = session.on_step_sample(steps).await;
    report_outcome(outcome, events);
    emit(events, updated(session));
}

async fn handle_command(
    session: &mut TrackerSession,
    command: TrackerCommand,
    events: &mpsc::UnboundedSender<TrackerEvent>,
) {
    match command {
        TrackerCommand::Sample(steps) => return apply_sample(session, steps, events).await,
        TrackerCommand::SetCalorieGoal(goal) => {
            if let Err(err) = session.set_calorie_goal(goal) {
                emit(events, TrackerEvent::Error(err.to_string()));
            }
        }
        TrackerCommand::SetRunningMode(enabled) => session.set_running_mode(enabled),
        TrackerCommand::SubmitNewGoal(goal) => match session.submit_new_goal(goal).await {
            Ok(outcome) => report_outcome(outcome, events),
            Err(err) => emit(events, TrackerEvent::Error(err.to_string())),
        },
        TrackerCommand::AcknowledgeGoalPrompt => session.acknowledge_goal_prompt(),
        TrackerCommand::AcknowledgeBadge => session.acknowledge_badge(),
        TrackerCommand::Shutdown => return,
    }
    emit(events, updated(session));
}

fn report_outcome(outcome: SampleOutcome, events: &mpsc::UnboundedSender<TrackerEvent>) {
    if let Some(event) = outcome.achievement {
        report_achievement(event, events);
    }
    if let SyncStatus::Failed(message) = outcome.sync {
        emit(events, TrackerEvent::Error(message));
    }
}

fn report_achievement(event: AchievementEvent, events: &mpsc::UnboundedSender<TrackerEvent>) {
    let badge_earned = event.badge_earned;
    emit(events, TrackerEvent::AchievementUnlocked(event));
    if badge_earned {
        emit(events, TrackerEvent::BadgeEarned);
    }
    emit(events, TrackerEvent::PromptNewGoal);
}

fn updated(session: &TrackerSession) -> TrackerEvent {
    TrackerEvent::Updated(Box::new(session.view()))
}

fn emit(events: &mpsc::UnboundedSender<TrackerEvent>, event: TrackerEvent) {
    // a dropped receiver just means nobody is rendering
    let _ = events.send(event);
}
