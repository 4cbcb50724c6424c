use serde::{Deserialize, Serialize};

pub(crate) const GOAL_REACHED_TITLE: &str = "Goal reached!";

/// Icon shown next to an achievement card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BadgeIcon {
    GoalBadge,
}

impl BadgeIcon {
    /// Asset path the presentation layer resolves.
    #[must_use]
    pub fn asset(self) -> &'static str {
        match self {
            BadgeIcon::GoalBadge => "img/badge.png",
        }
    }
}

/// One unlocked achievement, kept in memory for the session only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub title: String,
    pub subtitle: String,
    pub achieved: bool,
    pub badge: Option<BadgeIcon>,
}

impl AchievementRecord {
    /// Record for a completed daily goal, stamped with the numbers at unlock time.
    #[must_use]
    pub fn goal_reached(steps: u32, calories: f64) -> Self {
        Self {
            title: GOAL_REACHED_TITLE.to_string(),
            subtitle: format!("Steps: {steps} and calories: {calories:.2} burned!"),
            achieved: true,
            badge: Some(BadgeIcon::GoalBadge),
        }
    }
}
