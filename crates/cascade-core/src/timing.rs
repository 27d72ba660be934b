//! Timing of pipeline phases.

use std::collections::BTreeMap;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// Start, end and duration of one measured phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub start: Timestamp,
    pub end: Timestamp,
    pub duration: SignedDuration,
}

impl Timing {
    /// Creates a timing with the given start and end timestamps.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start,
            end,
            duration: end.duration_since(start),
        }
    }

    /// Creates a timing that started at `start` and ends now.
    pub fn since(start: Timestamp) -> Self {
        Self::new(start, Timestamp::now())
    }
}

/// Timings keyed by phase name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasuredSteps(BTreeMap<String, Timing>);

impl MeasuredSteps {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a phase, replacing an earlier entry with the same name.
    pub fn record(&mut self, step: impl Into<String>, timing: Timing) {
        self.0.insert(step.into(), timing);
    }

    /// Returns the timing of a phase.
    pub fn get(&self, step: &str) -> Option<&Timing> {
        self.0.get(step)
    }

    /// Copies every phase of `other` into `self`.
    pub fn merge(&mut self, other: MeasuredSteps) {
        self.0.extend(other.0);
    }

    /// Iterates phases in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Timing)> {
        self.0.iter().map(|(step, timing)| (step.as_str(), timing))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
