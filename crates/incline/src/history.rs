//! Completed runs, kept for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::RampPath;
use crate::physics::RunResult;

/// One completed run as shown in the history table.
///
/// Numbers are stored pre-formatted to two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: u64,
    pub date: DateTime<Utc>,
    #[serde(rename = "pathColor")]
    pub ramp_color: String,
    pub time_to_ascend: String,
    pub terminal_velocity: String,
}

/// Formats a value the way the history table shows it.
pub fn format_value(value: f64) -> String {
    format!("{value:.2}")
}

/// Append-only list of completed runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHistory {
    records: Vec<RunRecord>,
}

impl RunHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one run, stamped now.
    pub fn record(&mut self, ramp_color: &str, result: RunResult) -> &RunRecord {
        self.record_at(ramp_color, result, Utc::now())
    }

    /// Records one run with an explicit timestamp.
    pub fn record_at(&mut self, ramp_color: &str, result: RunResult, date: DateTime<Utc>) -> &RunRecord {
        let id = self.records.len() as u64 + 1;
        debug!(id, ramp_color, "Run recorded");
        self.records.push(RunRecord {
            id,
            date,
            ramp_color: ramp_color.to_string(),
            time_to_ascend: format_value(result.time_to_ascend),
            terminal_velocity: format_value(result.terminal_velocity),
        });
        &self.records[self.records.len() - 1]
    }

    /// Records a finished launch. `results` pair with `ramps` by position;
    /// extra entries on either side are ignored.
    pub fn record_batch(&mut self, ramps: &[RampPath], results: &[RunResult]) -> usize {
        let date = Utc::now();
        let mut recorded = 0;
        for (ramp, result) in ramps.iter().zip(results) {
            self.record_at(&ramp.color, *result, date);
            recorded += 1;
        }
        recorded
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records grouped by ramp color, groups in first-seen order.
    pub fn group_by_color(&self) -> Vec<(&str, Vec<&RunRecord>)> {
        let mut groups: Vec<(&str, Vec<&RunRecord>)> = Vec::new();
        for record in &self.records {
            match groups.iter_mut().find(|(color, _)| *color == record.ramp_color) {
                Some((_, runs)) => runs.push(record),
                None => groups.push((record.ramp_color.as_str(), vec![record])),
            }
        }
        groups
    }
}
