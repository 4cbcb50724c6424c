use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::DayIndex;

/// Steps and calories recorded for one day of the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub day: DayIndex,
    pub steps: u32,
    pub calories: f64,
}

impl ProgressEntry {
    #[must_use]
    pub fn new(day: DayIndex, steps: u32, calories: f64) -> Self {
        Self {
            day,
            steps,
            calories,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.day.label()
    }
}

/// Weekly progress, at most one entry per day slot.
///
/// Recording a day that already has an entry replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressHistory {
    entries: BTreeMap<DayIndex, ProgressEntry>,
}

impl ProgressHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the entry in its day slot, returning the one it replaced.
    pub fn record(&mut self, entry: ProgressEntry) -> Option<ProgressEntry> {
        self.entries.insert(entry.day, entry)
    }

    #[must_use]
    pub fn get(&self, day: DayIndex) -> Option<&ProgressEntry> {
        self.entries.get(&day)
    }

    /// Entries ordered Sunday first.
    pub fn iter(&self) -> impl Iterator<Item = &ProgressEntry> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Data series for the weekly bar chart.
    #[must_use]
    pub fn chart(&self) -> ProgressChart {
        let mut chart = ProgressChart::default();
        for entry in self.iter() {
            chart.labels.push(entry.label());
            chart.steps.push(entry.steps);
            chart.calories.push(entry.calories);
        }
        chart
    }
}

impl FromIterator<ProgressEntry> for ProgressHistory {
    fn from_iter<T: IntoIterator<Item = ProgressEntry>>(iter: T) -> Self {
        let mut history = Self::new();
        for entry in iter {
            history.record(entry);
        }
        history
    }
}

/// Parallel series rendered by the progress chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressChart {
    pub labels: Vec<&'static str>,
    pub steps: Vec<u32>,
    pub calories: Vec<f64>,
}
