use crate::tracker::TrackerError;

/// Default daily calorie target.
pub const DEFAULT_CALORIE_GOAL: f64 = 450.0;
/// Calories burned per step while walking.
pub const WALKING_CALORIES_PER_STEP: f64 = 0.045;
/// Calories burned per step while running.
pub const RUNNING_CALORIES_PER_STEP: f64 = 0.06;

/// How much progress history a sync writes to the remote record.
///
/// The record is always overwritten as a whole, so `TodayOnly` drops any
/// other day's entry that was stored before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPolicy {
    #[default]
    TodayOnly,
    /// Write every day known locally plus today's entry.
    KeepWeek,
}

/// Starting configuration for an activity tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSettings {
    calorie_goal: f64,
    running_mode: bool,
    walking_rate: f64,
    running_rate: f64,
    history_policy: HistoryPolicy,
}

impl TrackerSettings {
    /// Creates custom tracker settings.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidCalorieGoal` if the goal is not a positive
    /// finite number, or `TrackerError::InvalidRate` for a bad per-step rate.
    pub fn new(
        calorie_goal: f64,
        running_mode: bool,
        walking_rate: f64,
        running_rate: f64,
        history_policy: HistoryPolicy,
    ) -> Result<Self, TrackerError> {
        validate_calorie_goal(calorie_goal)?;
        validate_rate(walking_rate)?;
        validate_rate(running_rate)?;
        Ok(Self {
            calorie_goal,
            running_mode,
            walking_rate,
            running_rate,
            history_policy,
        })
    }

    /// Replace the starting calorie goal.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidCalorieGoal` for zero, negative or non-finite goals.
    pub fn with_calorie_goal(mut self, calorie_goal: f64) -> Result<Self, TrackerError> {
        validate_calorie_goal(calorie_goal)?;
        self.calorie_goal = calorie_goal;
        Ok(self)
    }

    #[must_use]
    pub fn with_running_mode(mut self, running_mode: bool) -> Self {
        self.running_mode = running_mode;
        self
    }

    #[must_use]
    pub fn with_history_policy(mut self, history_policy: HistoryPolicy) -> Self {
        self.history_policy = history_policy;
        self
    }

    #[must_use]
    pub fn calorie_goal(&self) -> f64 {
        self.calorie_goal
    }

    #[must_use]
    pub fn running_mode(&self) -> bool {
        self.running_mode
    }

    #[must_use]
    pub fn walking_rate(&self) -> f64 {
        self.walking_rate
    }

    #[must_use]
    pub fn running_rate(&self) -> f64 {
        self.running_rate
    }

    #[must_use]
    pub fn history_policy(&self) -> HistoryPolicy {
        self.history_policy
    }

    /// Calories per step for the given mode.
    #[must_use]
    pub fn rate(&self, running_mode: bool) -> f64 {
        if running_mode {
            self.running_rate
        } else {
            self.walking_rate
        }
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            calorie_goal: DEFAULT_CALORIE_GOAL,
            running_mode: false,
            walking_rate: WALKING_CALORIES_PER_STEP,
            running_rate: RUNNING_CALORIES_PER_STEP,
            history_policy: HistoryPolicy::TodayOnly,
        }
    }
}

pub(crate) fn validate_calorie_goal(value: f64) -> Result<(), TrackerError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TrackerError::InvalidCalorieGoal { provided: value });
    }
    Ok(())
}

fn validate_rate(value: f64) -> Result<(), TrackerError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TrackerError::InvalidRate { provided: value });
    }
    Ok(())
}
