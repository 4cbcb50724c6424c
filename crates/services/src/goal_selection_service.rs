use std::sync::Arc;

use serde_json::{Map, Value};
use storage::SELECTED_GOAL_FIELD;
use storage::repository::RecordStore;
use stride_core::model::{FitnessGoal, UserId};
use tracing::info;

use crate::error::GoalSelectionError;

/// Stores the user's fitness goal on their record.
///
/// Only the `selectedGoal` field is touched; tracker counts and history stay
/// as stored.
#[derive(Clone)]
pub struct GoalSelectionService {
    records: Arc<dyn RecordStore>,
}

impl GoalSelectionService {
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Persist `goal` as the user's selected fitness goal.
    ///
    /// # Errors
    ///
    /// Returns `GoalSelectionError::Storage` if the merge fails.
    pub async fn select_goal(
        &self,
        user_id: &UserId,
        goal: FitnessGoal,
    ) -> Result<(), GoalSelectionError> {
        let mut fields = Map::new();
        fields.insert(SELECTED_GOAL_FIELD.to_owned(), Value::from(goal.key()));
        self.records.merge_fields(user_id, fields).await?;
        info!(user = %user_id, goal = goal.key(), "fitness goal selected");
        Ok(())
    }

    /// Parse a goal by key or title and persist it.
    ///
    /// # Errors
    ///
    /// Returns `GoalSelectionError::Goal` for an unknown name.
    /// Returns `GoalSelectionError::Storage` if the merge fails.
    pub async fn select_goal_named(
        &self,
        user_id: &UserId,
        name: &str,
    ) -> Result<FitnessGoal, GoalSelectionError> {
        let goal = name.parse::<FitnessGoal>()?;
        self.select_goal(user_id, goal).await?;
        Ok(goal)
    }

    /// Confirm the choice made on the selection screen.
    ///
    /// # Errors
    ///
    /// Returns `GoalSelectionError::NoSelection` if nothing was picked.
    /// Returns `GoalSelectionError::Storage` if the merge fails.
    pub async fn confirm_selection(
        &self,
        user_id: &UserId,
        selection: Option<FitnessGoal>,
    ) -> Result<FitnessGoal, GoalSelectionError> {
        let goal = selection.ok_or(GoalSelectionError::NoSelection)?;
        self.select_goal(user_id, goal).await?;
        Ok(goal)
    }

    /// Currently stored goal, if any.
    ///
    /// # Errors
    ///
    /// Returns `GoalSelectionError::Storage` if the record cannot be read.
    pub async fn selected_goal(
        &self,
        user_id: &UserId,
    ) -> Result<Option<FitnessGoal>, GoalSelectionError> {
        let record = self.records.get_record(user_id).await?;
        Ok(record.and_then(|document| document.selected_goal()))
    }
}
