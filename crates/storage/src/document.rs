//! Persisted shape of a user's activity record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stride_core::model::{DayIndex, FitnessGoal, ProgressEntry, ProgressHistory};
use stride_core::tracker::ActivitySnapshot;
use tracing::warn;

use crate::repository::StorageError;

/// Top-level key holding the goal picked on the goal selection screen.
pub const SELECTED_GOAL_FIELD: &str = "selectedGoal";

/// One day slot inside `progressData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub day: String,
    #[serde(default)]
    pub steps: u32,
    #[serde(default)]
    pub calories: f64,
}

/// The whole per-user document stored remotely.
///
/// Missing tracker fields read as zero/empty. Top-level fields this crate
/// does not know about are kept in `extra` so they survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(default)]
    pub step_count: u32,
    #[serde(default)]
    pub calories_burned: f64,
    #[serde(default)]
    pub points: u8,
    #[serde(default)]
    pub progress_data: BTreeMap<String, ProgressRecord>,
    /// Everything else, `selectedGoal` included, kept as written.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserDocument {
    /// Document holding exactly the tracker snapshot and nothing else.
    #[must_use]
    pub fn from_snapshot(snapshot: &ActivitySnapshot) -> Self {
        let progress_data = snapshot
            .progress
            .iter()
            .map(|entry| {
                (
                    entry.day.key(),
                    ProgressRecord {
                        day: entry.label().to_string(),
                        steps: entry.steps,
                        calories: entry.calories,
                    },
                )
            })
            .collect();

        Self {
            step_count: snapshot.step_count,
            calories_burned: snapshot.calories_burned,
            points: snapshot.points,
            progress_data,
            extra: Map::new(),
        }
    }

    /// Convert back into a tracker snapshot.
    ///
    /// Progress slots whose key is not a day index are skipped.
    #[must_use]
    pub fn to_snapshot(&self) -> ActivitySnapshot {
        let progress: ProgressHistory = self
            .progress_data
            .iter()
            .filter_map(|(key, record)| match DayIndex::from_key(key) {
                Ok(day) => Some(ProgressEntry::new(day, record.steps, record.calories)),
                Err(err) => {
                    warn!(%err, "skipping progress slot");
                    None
                }
            })
            .collect();

        ActivitySnapshot {
            step_count: self.step_count,
            calories_burned: self.calories_burned,
            points: self.points,
            progress,
        }
    }

    /// Copy fields owned by other screens (goal selection, profile) from `other`.
    #[must_use]
    pub fn with_profile_from(mut self, other: &UserDocument) -> Self {
        self.extra.clone_from(&other.extra);
        self
    }

    /// The stored fitness goal, if it names one we know.
    ///
    /// Values written by other clients (a translated title, say) read as `None`
    /// and are left in place.
    #[must_use]
    pub fn selected_goal(&self) -> Option<FitnessGoal> {
        self.extra
            .get(SELECTED_GOAL_FIELD)
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
    }

    pub fn set_selected_goal(&mut self, goal: FitnessGoal) {
        self.extra
            .insert(SELECTED_GOAL_FIELD.to_owned(), Value::from(goal.key()));
    }

    /// Overwrite top-level fields with `fields`, leaving the others intact.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the merged document no longer
    /// has the expected shape (for example `stepCount` set to a string).
    pub fn merged(&self, fields: Map<String, Value>) -> Result<Self, StorageError> {
        let mut value = serde_json::to_value(self).map_err(ser)?;
        let Value::Object(object) = &mut value else {
            return Err(StorageError::Serialization(
                "user document is not an object".into(),
            ));
        };
        object.extend(fields);
        serde_json::from_value(value).map_err(ser)
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the body is not a valid document.
    pub fn from_json(body: &str) -> Result<Self, StorageError> {
        serde_json::from_str(body).map_err(ser)
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a field cannot be encoded.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(ser)
    }
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(value: u8) -> DayIndex {
        DayIndex::new(value).unwrap()
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let snapshot = ActivitySnapshot {
            step_count: 2_000,
            calories_burned: 90.0,
            points: 1,
            progress: [ProgressEntry::new(day(3), 2_000, 90.0)].into_iter().collect(),
        };
        let value = serde_json::to_value(UserDocument::from_snapshot(&snapshot)).unwrap();
        assert_eq!(
            value,
            json!({
                "stepCount": 2000,
                "caloriesBurned": 90.0,
                "points": 1,
                "progressData": { "3": { "day": "Wed", "steps": 2000, "calories": 90.0 } }
            })
        );
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let doc = UserDocument::from_json(r#"{"points": 2}"#).unwrap();
        let snapshot = doc.to_snapshot();
        assert_eq!(snapshot.step_count, 0);
        assert_eq!(snapshot.calories_burned, 0.0);
        assert_eq!(snapshot.points, 2);
        assert!(snapshot.progress.is_empty());
    }

    #[test]
    fn bad_progress_keys_are_skipped() {
        let doc = UserDocument::from_json(
            r#"{"progressData": {"1": {"day": "Mon", "steps": 10, "calories": 0.45},
                                  "week": {"day": "?", "steps": 1, "calories": 1.0}}}"#,
        )
        .unwrap();
        let snapshot = doc.to_snapshot();
        assert_eq!(snapshot.progress.len(), 1);
        assert_eq!(snapshot.progress.get(day(1)).unwrap().steps, 10);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let body = r#"{"stepCount": 5, "selectedGoal": "lose_weight", "weight": 70}"#;
        let doc = UserDocument::from_json(body).unwrap();
        assert_eq!(doc.selected_goal(), Some(FitnessGoal::LoseWeight));
        assert_eq!(doc.extra.get("weight"), Some(&json!(70)));

        let again = UserDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn merge_keeps_other_fields() {
        let doc = UserDocument {
            step_count: 40,
            ..UserDocument::default()
        };
        let mut fields = Map::new();
        fields.insert("selectedGoal".into(), json!("increase_strength"));
        let merged = doc.merged(fields).unwrap();
        assert_eq!(merged.step_count, 40);
        assert_eq!(merged.selected_goal(), Some(FitnessGoal::IncreaseStrength));
    }

    #[test]
    fn foreign_goal_value_does_not_block_tracker_fields() {
        let body = r#"{"stepCount": 5000, "caloriesBurned": 225.0, "points": 1,
                       "selectedGoal": "Verlies gewicht"}"#;
        let doc = UserDocument::from_json(body).unwrap();
        assert_eq!(doc.step_count, 5_000);
        assert_eq!(doc.points, 1);
        assert_eq!(doc.selected_goal(), None);

        let rewritten = UserDocument::default().with_profile_from(&doc);
        assert_eq!(
            rewritten.extra.get(SELECTED_GOAL_FIELD),
            Some(&json!("Verlies gewicht"))
        );
    }

    #[test]
    fn goal_title_is_understood() {
        let doc = UserDocument::from_json(r#"{"selectedGoal": "Lose weight"}"#).unwrap();
        assert_eq!(doc.selected_goal(), Some(FitnessGoal::LoseWeight));

        let mut doc = UserDocument::default();
        doc.set_selected_goal(FitnessGoal::ImproveEndurance);
        assert_eq!(doc.extra.get(SELECTED_GOAL_FIELD), Some(&json!("improve_endurance")));
        assert_eq!(doc.selected_goal(), Some(FitnessGoal::ImproveEndurance));
    }

    #[test]
    fn merge_rejects_wrong_shape() {
        let mut fields = Map::new();
        fields.insert("stepCount".into(), json!("lots"));
        assert!(matches!(
            UserDocument::default().merged(fields),
            Err(StorageError::Serialization(_))
        ));
    }
}
