use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FitnessGoalError {
    #[error("unknown fitness goal: {0:?}")]
    Unknown(String),
}

/// Long-term goal picked during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
    ImproveShape,
    LoseWeight,
    IncreaseStrength,
    ImproveEndurance,
}

impl FitnessGoal {
    pub const ALL: [FitnessGoal; 4] = [
        FitnessGoal::ImproveShape,
        FitnessGoal::LoseWeight,
        FitnessGoal::IncreaseStrength,
        FitnessGoal::ImproveEndurance,
    ];

    /// Stable key used on the user record.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            FitnessGoal::ImproveShape => "improve_shape",
            FitnessGoal::LoseWeight => "lose_weight",
            FitnessGoal::IncreaseStrength => "increase_strength",
            FitnessGoal::ImproveEndurance => "improve_endurance",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            FitnessGoal::ImproveShape => "Improve your body shape",
            FitnessGoal::LoseWeight => "Lose weight",
            FitnessGoal::IncreaseStrength => "Increase your strength",
            FitnessGoal::ImproveEndurance => "Improve your endurance",
        }
    }
}

impl fmt::Display for FitnessGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for FitnessGoal {
    type Err = FitnessGoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        FitnessGoal::ALL
            .into_iter()
            .find(|goal| goal.key() == needle || goal.title().eq_ignore_ascii_case(needle))
            .ok_or_else(|| FitnessGoalError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_titles() {
        assert_eq!(
            "lose_weight".parse::<FitnessGoal>(),
            Ok(FitnessGoal::LoseWeight)
        );
        assert_eq!(
            "improve your endurance".parse::<FitnessGoal>(),
            Ok(FitnessGoal::ImproveEndurance)
        );
    }

    #[test]
    fn rejects_unknown_goal() {
        assert_eq!(
            "fly".parse::<FitnessGoal>(),
            Err(FitnessGoalError::Unknown("fly".into()))
        );
    }

    #[test]
    fn keys_are_unique() {
        let keys: std::collections::HashSet<_> =
            FitnessGoal::ALL.iter().map(|g| g.key()).collect();
        assert_eq!(keys.len(), FitnessGoal::ALL.len());
    }
}
