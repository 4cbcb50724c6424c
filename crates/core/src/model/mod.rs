mod achievement;
mod day;
mod fitness_goal;
mod ids;
mod progress;
mod settings;

pub use achievement::{AchievementRecord, BadgeIcon};
pub use day::{DayIndex, DayIndexError};
pub use fitness_goal::{FitnessGoal, FitnessGoalError};
pub use ids::{ParseIdError, UserId};
pub use progress::{ProgressChart, ProgressEntry, ProgressHistory};
pub use settings::{HistoryPolicy, TrackerSettings};

pub(crate) use settings::validate_calorie_goal;
pub use settings::{DEFAULT_CALORIE_GOAL, RUNNING_CALORIES_PER_STEP, WALKING_CALORIES_PER_STEP};
