//! User guesses and how they compare with a finished run.
//!
//! A launch is only meaningful once both numbers are guessed, see
//! [`Prediction::is_complete`].
//!
//! ```rust
//! use incline::{Prediction, RunResult, TrajectoryChoice};
//! use incline::registry::default_ramps;
//!
//! let guess = Prediction::new(Some(2.0), Some(80.0), TrajectoryChoice::Quickest);
//! let ramps = default_ramps();
//! let results = vec![RunResult::new(2.5, 82.87)];
//! let report = guess.evaluate(&ramps[..1], &results);
//!
//! let time = report.time.unwrap();
//! assert!((time.absolute - 0.5).abs() < 1e-12);
//! assert_eq!(report.quickest.as_deref(), Some("path1"));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::RampPath;
use crate::physics::RunResult;

/// Which trajectory the user believes wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrajectoryChoice {
    /// The launched ramp is the quickest one.
    #[default]
    Quickest,
    /// No claim.
    None,
}

impl fmt::Display for TrajectoryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quickest => f.write_str("quickest"),
            Self::None => f.write_str("none"),
        }
    }
}

impl FromStr for TrajectoryChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quickest" => Ok(Self::Quickest),
            "none" => Ok(Self::None),
            other => Err(format!("unknown trajectory '{other}', expected quickest or none")),
        }
    }
}

/// A user's guess made before launching.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub time_to_ascend: Option<f64>,
    pub terminal_velocity: Option<f64>,
    pub trajectory: TrajectoryChoice,
}

/// How far one guessed number was from the measured one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionError {
    pub predicted: f64,
    pub actual: f64,
    /// `|predicted - actual|`.
    pub absolute: f64,
    /// `absolute / |actual|`; `None` when `actual` is zero.
    pub relative: Option<f64>,
}

impl PredictionError {
    fn between(predicted: f64, actual: f64) -> Self {
        let absolute = (predicted - actual).abs();
        let relative = (actual != 0.0).then(|| absolute / actual.abs());
        Self {
            predicted,
            actual,
            absolute,
            relative,
        }
    }
}

/// Comparison of a [`Prediction`] with a finished launch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    /// Error on the first result's descent time.
    pub time: Option<PredictionError>,
    /// Error on the first result's terminal velocity.
    pub velocity: Option<PredictionError>,
    /// Id of the ramp with the shortest descent time.
    pub quickest: Option<String>,
    /// Whether the trajectory claim held; `None` when no claim was made.
    pub trajectory_correct: Option<bool>,
}

impl Prediction {
    pub const fn new(
        time_to_ascend: Option<f64>,
        terminal_velocity: Option<f64>,
        trajectory: TrajectoryChoice,
    ) -> Self {
        Self {
            time_to_ascend,
            terminal_velocity,
            trajectory,
        }
    }

    /// Builds a prediction from free-text inputs. Blank or unparsable
    /// fields are treated as missing.
    pub fn from_inputs(time: &str, velocity: &str, trajectory: TrajectoryChoice) -> Self {
        let parse = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        Self::new(parse(time), parse(velocity), trajectory)
    }

    /// Both numbers were guessed.
    pub const fn is_complete(&self) -> bool {
        self.time_to_ascend.is_some() && self.terminal_velocity.is_some()
    }

    /// Compares against `results`, which pair with `ramps` by position.
    ///
    /// The first ramp is the one the guess was about.
    pub fn evaluate(&self, ramps: &[RampPath], results: &[RunResult]) -> PredictionReport {
        let first = results.first();
        let time = self
            .time_to_ascend
            .zip(first)
            .map(|(p, r)| PredictionError::between(p, r.time_to_ascend));
        let velocity = self
            .terminal_velocity
            .zip(first)
            .map(|(p, r)| PredictionError::between(p, r.terminal_velocity));

        let quickest = ramps
            .iter()
            .zip(results)
            .min_by(|(_, a), (_, b)| a.time_to_ascend.total_cmp(&b.time_to_ascend))
            .map(|(ramp, _)| ramp.id.clone());

        let trajectory_correct = match self.trajectory {
            TrajectoryChoice::Quickest => match (&quickest, ramps.first()) {
                (Some(q), Some(launched)) => Some(*q == launched.id),
                _ => None,
            },
            TrajectoryChoice::None => None,
        };

        PredictionReport {
            time,
            velocity,
            quickest,
            trajectory_correct,
        }
    }
}
