use thiserror::Error;

use crate::model::{DayIndexError, FitnessGoalError};
use crate::tracker::TrackerError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    DayIndex(#[from] DayIndexError),
    #[error(transparent)]
    FitnessGoal(#[from] FitnessGoalError),
}
