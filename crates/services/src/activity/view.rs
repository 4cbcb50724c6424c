use stride_core::ActivityTracker;
use stride_core::model::{AchievementRecord, ProgressChart};
use stride_core::tracker::{GoalSummary, TrackerPhase};

/// Everything the activity screen renders, computed from one tracker state.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityView {
    pub step_count: u32,
    pub calories_burned: f64,
    pub points: u8,
    pub calorie_goal: f64,
    pub step_goal: u32,
    pub running_mode: bool,
    pub phase: TrackerPhase,
    pub goal: GoalSummary,
    pub chart: ProgressChart,
    pub achievements: Vec<AchievementRecord>,
    pub prompt_new_goal: bool,
    pub badge_pending: bool,
    pub error: Option<String>,
}

impl ActivityView {
    #[must_use]
    pub fn from_tracker(tracker: &ActivityTracker, error: Option<&str>) -> Self {
        Self {
            step_count: tracker.step_count(),
            calories_burned: tracker.calories_burned(),
            points: tracker.points(),
            calorie_goal: tracker.calorie_goal(),
            step_goal: tracker.step_goal(),
            running_mode: tracker.running_mode(),
            phase: tracker.phase(),
            goal: tracker.goal_summary(),
            chart: tracker.chart(),
            achievements: tracker.achievements().cloned().collect(),
            prompt_new_goal: tracker.is_goal_prompt_pending(),
            badge_pending: tracker.badge_pending(),
            error: error.map(str::to_owned),
        }
    }

    /// Calories as displayed on the goal card.
    #[must_use]
    pub fn calories_label(&self) -> String {
        format!("{:.2} Cal", self.calories_burned)
    }
}
