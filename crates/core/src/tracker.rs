use std::collections::VecDeque;
use std::fmt;

use thiserror::Error;

use crate::model::{
    AchievementRecord, DayIndex, HistoryPolicy, ProgressChart, ProgressEntry, ProgressHistory,
    TrackerSettings, validate_calorie_goal,
};

/// Goal completions needed to earn a badge.
pub const POINTS_PER_BADGE: u8 = 3;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum TrackerError {
    #[error("calorie goal must be a positive finite number, got {provided}")]
    InvalidCalorieGoal { provided: f64 },
    #[error("calories per step must be a positive finite number, got {provided}")]
    InvalidRate { provided: f64 },
}

//
// ─── EVENTS & VIEWS ────────────────────────────────────────────────────────────
//

/// Where the tracker is in the current achievement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    /// No achievement unlocked yet; samples are evaluated against the goal.
    Tracking,
    /// The goal was just completed and the new-goal prompt is pending.
    GoalReached,
    /// The prompt has been shown; waiting for the user to submit a new goal.
    AwaitingNewGoal,
}

/// Emitted once per completed goal.
///
/// Every achievement asks the caller to prompt for a new calorie goal.
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementEvent {
    pub record: AchievementRecord,
    /// Points after this achievement was counted (already wrapped back to 0 on a badge).
    pub points: u8,
    pub badge_earned: bool,
}

/// State that is written to, and read back from, the remote user record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivitySnapshot {
    pub step_count: u32,
    pub calories_burned: f64,
    pub points: u8,
    pub progress: ProgressHistory,
}

/// Distance left to a goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Remaining<T> {
    Left(T),
    Reached,
}

/// Remaining calories and steps, as shown on the daily goal card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalSummary {
    pub calories: Remaining<f64>,
    pub steps: Remaining<u32>,
}

impl GoalSummary {
    #[must_use]
    pub fn calories_label(&self) -> String {
        match self.calories {
            Remaining::Left(cal) => format!("{cal:.2} Cal left"),
            Remaining::Reached => "Goal reached!".to_string(),
        }
    }

    #[must_use]
    pub fn steps_label(&self) -> String {
        match self.steps {
            Remaining::Left(steps) => format!("{steps} steps left"),
            Remaining::Reached => "Goal reached!".to_string(),
        }
    }
}

impl fmt::Display for GoalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.calories_label(), self.steps_label())
    }
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Owns the day's step, calorie and point state and applies the goal rules.
///
/// The tracker is purely synchronous: it never talks to storage. Callers ask
/// [`ActivityTracker::should_sync`] after a sample and persist
/// [`ActivityTracker::snapshot`] themselves.
///
/// # Examples
///
/// ```
/// # use stride_core::ActivityTracker;
/// # use stride_core::model::TrackerSettings;
/// let mut tracker = ActivityTracker::new(TrackerSettings::default());
/// assert_eq!(tracker.step_goal(), 10_000);
///
/// let event = tracker.on_step_sample(10_000).expect("goal reached");
/// assert_eq!(event.points, 1);
/// assert_eq!(tracker.calories_burned(), 450.0);
/// ```
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    settings: TrackerSettings,
    step_count: u32,
    calories_burned: f64,
    calorie_goal: f64,
    step_goal: u32,
    points: u8,
    running_mode: bool,
    phase: TrackerPhase,
    badge_pending: bool,
    achievements: VecDeque<AchievementRecord>,
    progress: ProgressHistory,
}

impl ActivityTracker {
    /// Fresh tracker with zero counts and the configured goal.
    #[must_use]
    pub fn new(settings: TrackerSettings) -> Self {
        let mut tracker = Self {
            step_count: 0,
            calories_burned: 0.0,
            calorie_goal: settings.calorie_goal(),
            step_goal: 0,
            points: 0,
            running_mode: settings.running_mode(),
            phase: TrackerPhase::Tracking,
            badge_pending: false,
            achievements: VecDeque::new(),
            progress: ProgressHistory::new(),
            settings,
        };
        tracker.recompute_step_goal();
        tracker
    }

    /// Replace the step count with a new sensor reading.
    ///
    /// Lower readings than before are accepted as-is (sensor resets). Calories
    /// are recomputed with the current mode's rate, without rounding.
    pub fn on_step_sample(&mut self, steps: u32) -> Option<AchievementEvent> {
        self.step_count = steps;
        self.calories_burned = f64::from(steps) * self.rate();
        self.evaluate_achievement()
    }

    /// Set a new calorie target and derive the matching step goal.
    ///
    /// Does not evaluate achievements; the next sample does.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidCalorieGoal` for zero, negative or
    /// non-finite values. The tracker is left unchanged in that case.
    pub fn set_calorie_goal(&mut self, calorie_goal: f64) -> Result<(), TrackerError> {
        validate_calorie_goal(calorie_goal)?;
        self.calorie_goal = calorie_goal;
        self.recompute_step_goal();
        Ok(())
    }

    /// Switch between walking and running rates.
    ///
    /// Only the step goal is recomputed; calories already burned keep their
    /// value until the next sample arrives.
    pub fn set_running_mode(&mut self, enabled: bool) {
        self.running_mode = enabled;
        self.recompute_step_goal();
    }

    /// Check the compound goal and count an achievement if it was just met.
    ///
    /// Fires at most once per cycle: nothing happens until the caller submits
    /// a new goal via [`ActivityTracker::submit_new_goal`].
    pub fn evaluate_achievement(&mut self) -> Option<AchievementEvent> {
        if self.phase != TrackerPhase::Tracking {
            return None;
        }
        if self.step_count < self.step_goal || self.calories_burned < self.calorie_goal {
            return None;
        }

        self.phase = TrackerPhase::GoalReached;
        self.points += 1;
        let badge_earned = self.points >= POINTS_PER_BADGE;
        if badge_earned {
            self.points = 0;
            self.badge_pending = true;
        }

        let record = AchievementRecord::goal_reached(self.step_count, self.calories_burned);
        self.achievements.push_front(record.clone());

        Some(AchievementEvent {
            record,
            points: self.points,
            badge_earned,
        })
    }

    /// The new-goal prompt has been shown to the user.
    pub fn acknowledge_goal_prompt(&mut self) {
        if self.phase == TrackerPhase::GoalReached {
            self.phase = TrackerPhase::AwaitingNewGoal;
        }
    }

    /// Accept the goal entered after an achievement and start a new cycle.
    ///
    /// The current counts are evaluated against the new goal right away, so a
    /// goal that is already met completes the new cycle immediately.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidCalorieGoal` for a degenerate goal; the
    /// cycle does not restart in that case.
    pub fn submit_new_goal(
        &mut self,
        calorie_goal: f64,
    ) -> Result<Option<AchievementEvent>, TrackerError> {
        self.set_calorie_goal(calorie_goal)?;
        self.phase = TrackerPhase::Tracking;
        Ok(self.evaluate_achievement())
    }

    /// Dismiss the badge popup.
    pub fn acknowledge_badge(&mut self) {
        self.badge_pending = false;
    }

    /// The all-zero state is never written to the remote record.
    #[must_use]
    pub fn should_sync(&self) -> bool {
        self.step_count > 0 || self.calories_burned > 0.0
    }

    /// Build the state to persist, with today's progress entry.
    #[must_use]
    pub fn snapshot(&self, today: DayIndex) -> ActivitySnapshot {
        let mut progress = match self.settings.history_policy() {
            HistoryPolicy::TodayOnly => ProgressHistory::new(),
            HistoryPolicy::KeepWeek => self.progress.clone(),
        };
        progress.record(ProgressEntry::new(
            today,
            self.step_count,
            self.calories_burned,
        ));

        ActivitySnapshot {
            step_count: self.step_count,
            calories_burned: self.calories_burned,
            points: self.points,
            progress,
        }
    }

    /// Replace local counts and history with a snapshot from the remote record.
    ///
    /// Goals, mode and the achievement cycle are local and stay untouched.
    /// Points outside the badge range are wrapped back into it.
    pub fn apply_snapshot(&mut self, snapshot: ActivitySnapshot) {
        self.step_count = snapshot.step_count;
        self.calories_burned = snapshot.calories_burned;
        self.points = snapshot.points % POINTS_PER_BADGE;
        self.progress = snapshot.progress;
    }

    #[must_use]
    pub fn goal_summary(&self) -> GoalSummary {
        let calories_left = self.calorie_goal - self.calories_burned;
        let calories = if calories_left > 0.0 {
            Remaining::Left(calories_left)
        } else {
            Remaining::Reached
        };
        let steps = match self.step_goal.checked_sub(self.step_count) {
            Some(left) if left > 0 => Remaining::Left(left),
            _ => Remaining::Reached,
        };
        GoalSummary { calories, steps }
    }

    #[must_use]
    pub fn chart(&self) -> ProgressChart {
        self.progress.chart()
    }

    // Accessors
    #[must_use]
    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    #[must_use]
    pub fn calories_burned(&self) -> f64 {
        self.calories_burned
    }

    #[must_use]
    pub fn calorie_goal(&self) -> f64 {
        self.calorie_goal
    }

    #[must_use]
    pub fn step_goal(&self) -> u32 {
        self.step_goal
    }

    #[must_use]
    pub fn points(&self) -> u8 {
        self.points
    }

    #[must_use]
    pub fn running_mode(&self) -> bool {
        self.running_mode
    }

    #[must_use]
    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    #[must_use]
    pub fn achievement_unlocked(&self) -> bool {
        self.phase != TrackerPhase::Tracking
    }

    #[must_use]
    pub fn is_goal_prompt_pending(&self) -> bool {
        self.phase == TrackerPhase::GoalReached
    }

    #[must_use]
    pub fn badge_pending(&self) -> bool {
        self.badge_pending
    }

    /// Unlocked achievements, newest first.
    pub fn achievements(&self) -> impl Iterator<Item = &AchievementRecord> {
        self.achievements.iter()
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressHistory {
        &self.progress
    }

    #[must_use]
    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Calories per step in the current mode.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.settings.rate(self.running_mode)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn recompute_step_goal(&mut self) {
        // goal and rate are both positive and finite; `as` saturates on overflow
        self.step_goal = (self.calorie_goal / self.rate()).round() as u32;
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new(TrackerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(value: u8) -> DayIndex {
        DayIndex::new(value).unwrap()
    }

    #[test]
    fn calories_follow_mode_rate() {
        let mut tracker = ActivityTracker::default();
        for steps in [0, 1, 37, 4_444, 10_000, 123_457] {
            tracker.on_step_sample(steps);
            assert_eq!(tracker.calories_burned(), f64::from(steps) * 0.045);
        }

        tracker.set_running_mode(true);
        for steps in [0, 3, 5_000, 99_999] {
            tracker.on_step_sample(steps);
            assert_eq!(tracker.calories_burned(), f64::from(steps) * 0.06);
        }
    }

    #[test]
    fn lower_sample_replaces_count() {
        let mut tracker = ActivityTracker::default();
        tracker.on_step_sample(3_000);
        tracker.on_step_sample(120);
        assert_eq!(tracker.step_count(), 120);
        assert_eq!(tracker.calories_burned(), 120.0 * 0.045);
    }

    #[test]
    fn step_goal_tracks_goal_and_mode() {
        let mut tracker = ActivityTracker::default();
        assert_eq!(tracker.step_goal(), 10_000);

        tracker.set_calorie_goal(200.0).unwrap();
        assert_eq!(tracker.step_goal(), 4_444);

        tracker.set_running_mode(true);
        assert_eq!(tracker.step_goal(), 3_333);

        tracker.set_calorie_goal(600.0).unwrap();
        assert_eq!(tracker.step_goal(), 10_000);
    }

    #[test]
    fn invalid_goal_leaves_state_untouched() {
        let mut tracker = ActivityTracker::default();
        for bad in [0.0, -5.0, f64::NAN, f64::NEG_INFINITY] {
            let err = tracker.set_calorie_goal(bad).unwrap_err();
            assert!(matches!(err, TrackerError::InvalidCalorieGoal { .. }));
        }
        assert_eq!(tracker.calorie_goal(), 450.0);
        assert_eq!(tracker.step_goal(), 10_000);
    }

    #[test]
    fn both_conditions_are_required() {
        let mut tracker = ActivityTracker::default();
        tracker.set_calorie_goal(200.0).unwrap();

        // 4444 steps meets the step goal but only burns 199.98 Cal
        assert!(tracker.on_step_sample(4_444).is_none());
        assert_eq!(tracker.phase(), TrackerPhase::Tracking);

        let event = tracker.on_step_sample(4_445).unwrap();
        assert_eq!(event.points, 1);
    }

    #[test]
    fn achievement_fires_once_per_cycle() {
        let mut tracker = ActivityTracker::default();
        assert!(tracker.on_step_sample(10_000).is_some());
        assert_eq!(tracker.phase(), TrackerPhase::GoalReached);

        for steps in [10_500, 11_000, 20_000] {
            assert!(tracker.on_step_sample(steps).is_none());
        }
        assert!(tracker.evaluate_achievement().is_none());
        assert_eq!(tracker.points(), 1);
        assert_eq!(tracker.achievements().count(), 1);
    }

    #[test]
    fn prompt_acknowledgment_moves_to_awaiting() {
        let mut tracker = ActivityTracker::default();
        tracker.on_step_sample(10_000);
        assert!(tracker.is_goal_prompt_pending());

        tracker.acknowledge_goal_prompt();
        assert_eq!(tracker.phase(), TrackerPhase::AwaitingNewGoal);
        assert!(tracker.achievement_unlocked());
        assert!(tracker.on_step_sample(12_000).is_none());

        let event = tracker.submit_new_goal(900.0).unwrap();
        assert!(event.is_none());
        assert_eq!(tracker.phase(), TrackerPhase::Tracking);
        assert_eq!(tracker.step_goal(), 20_000);
    }

    #[test]
    fn submitting_a_met_goal_completes_immediately() {
        let mut tracker = ActivityTracker::default();
        tracker.on_step_sample(12_000);
        let event = tracker.submit_new_goal(450.0).unwrap().unwrap();
        assert_eq!(event.points, 2);
        assert_eq!(tracker.achievements().count(), 2);
    }

    #[test]
    fn rejected_new_goal_keeps_cycle_closed() {
        let mut tracker = ActivityTracker::default();
        tracker.on_step_sample(10_000);
        assert!(tracker.submit_new_goal(0.0).is_err());
        assert!(tracker.achievement_unlocked());
    }

    #[test]
    fn third_point_earns_badge_and_wraps() {
        let mut tracker = ActivityTracker::default();
        let mut badges = 0;
        for cycle in 1..=3u32 {
            let goal = 450.0 * f64::from(cycle);
            if cycle > 1 {
                assert!(tracker.submit_new_goal(goal).unwrap().is_none());
            }
            let event = tracker.on_step_sample(10_000 * cycle).unwrap();
            assert!(tracker.points() < POINTS_PER_BADGE);
            if event.badge_earned {
                badges += 1;
            }
        }

        assert_eq!(badges, 1);
        assert_eq!(tracker.points(), 0);
        assert!(tracker.badge_pending());
        tracker.acknowledge_badge();
        assert!(!tracker.badge_pending());
    }

    #[test]
    fn achievements_are_newest_first() {
        let mut tracker = ActivityTracker::default();
        tracker.on_step_sample(10_000);
        tracker.submit_new_goal(900.0).unwrap();
        tracker.on_step_sample(20_000);

        let subtitles: Vec<_> = tracker.achievements().map(|a| a.subtitle.clone()).collect();
        assert_eq!(
            subtitles,
            vec![
                "Steps: 20000 and calories: 900.00 burned!".to_string(),
                "Steps: 10000 and calories: 450.00 burned!".to_string(),
            ]
        );
    }

    #[test]
    fn zero_state_is_not_synced() {
        let mut tracker = ActivityTracker::default();
        assert!(!tracker.should_sync());
        tracker.on_step_sample(1);
        assert!(tracker.should_sync());
        tracker.on_step_sample(0);
        assert!(!tracker.should_sync());
    }

    #[test]
    fn today_only_snapshot_drops_other_days() {
        let mut tracker = ActivityTracker::default();
        tracker.apply_snapshot(ActivitySnapshot {
            step_count: 0,
            calories_burned: 0.0,
            points: 0,
            progress: [ProgressEntry::new(day(1), 8_000, 360.0)].into_iter().collect(),
        });
        tracker.on_step_sample(2_000);

        let snapshot = tracker.snapshot(day(2));
        assert_eq!(snapshot.progress.len(), 1);
        assert_eq!(snapshot.progress.get(day(2)).unwrap().steps, 2_000);
        assert!(snapshot.progress.get(day(1)).is_none());
    }

    #[test]
    fn keep_week_snapshot_carries_history() {
        let settings =
            TrackerSettings::default().with_history_policy(HistoryPolicy::KeepWeek);
        let mut tracker = ActivityTracker::new(settings);
        tracker.apply_snapshot(ActivitySnapshot {
            step_count: 0,
            calories_burned: 0.0,
            points: 0,
            progress: [
                ProgressEntry::new(day(1), 8_000, 360.0),
                ProgressEntry::new(day(2), 500, 22.5),
            ]
            .into_iter()
            .collect(),
        });
        tracker.on_step_sample(2_000);

        let snapshot = tracker.snapshot(day(2));
        assert_eq!(snapshot.progress.len(), 2);
        assert_eq!(snapshot.progress.get(day(1)).unwrap().steps, 8_000);
        assert_eq!(snapshot.progress.get(day(2)).unwrap().steps, 2_000);
    }

    #[test]
    fn applying_same_snapshot_twice_is_idempotent() {
        let snapshot = ActivitySnapshot {
            step_count: 7_000,
            calories_burned: 315.0,
            points: 2,
            progress: [
                ProgressEntry::new(day(0), 1_000, 45.0),
                ProgressEntry::new(day(4), 7_000, 315.0),
            ]
            .into_iter()
            .collect(),
        };
        let mut tracker = ActivityTracker::default();
        tracker.apply_snapshot(snapshot.clone());
        let once = (
            tracker.step_count(),
            tracker.calories_burned(),
            tracker.points(),
            tracker.progress().clone(),
        );
        tracker.apply_snapshot(snapshot);
        let twice = (
            tracker.step_count(),
            tracker.calories_burned(),
            tracker.points(),
            tracker.progress().clone(),
        );
        assert_eq!(once, twice);
        assert_eq!(tracker.progress().len(), 2);
    }

    #[test]
    fn snapshot_points_are_wrapped() {
        let mut tracker = ActivityTracker::default();
        tracker.apply_snapshot(ActivitySnapshot {
            points: 4,
            ..ActivitySnapshot::default()
        });
        assert_eq!(tracker.points(), 1);
    }

    #[test]
    fn goal_summary_reports_remaining() {
        let mut tracker = ActivityTracker::default();
        tracker.on_step_sample(4_000);
        let summary = tracker.goal_summary();
        assert_eq!(summary.steps, Remaining::Left(6_000));
        assert_eq!(summary.calories_label(), "270.00 Cal left");
        assert_eq!(summary.steps_label(), "6000 steps left");

        tracker.on_step_sample(10_000);
        let summary = tracker.goal_summary();
        assert_eq!(summary.calories, Remaining::Reached);
        assert_eq!(summary.steps, Remaining::Reached);
        assert_eq!(summary.to_string(), "Goal reached! / Goal reached!");
    }
}
