//! Closed-form descent kinematics.
//!
//! Heights are in centimeters while gravity is in m/s². The two are combined
//! without unit conversion: the numbers are illustrative, and the displayed
//! values of the visualizer depend on that exact mixture.

use serde::{Deserialize, Serialize};

use crate::geometry::{RampPath, ARC_LENGTH_SEGMENTS};

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f64 = 9.81;

/// Default animation pacing multiplier. Lower is faster.
pub const DEFAULT_SPEED_FACTOR: f64 = 0.1;

/// Duration (seconds) used when a ramp has no height drop.
pub const FALLBACK_DURATION_SECS: f64 = 0.5;

/// Outcome of one completed ramp traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Stylized descent time in seconds.
    pub time_to_ascend: f64,
    /// Speed at the bottom of the ramp.
    pub terminal_velocity: f64,
}

impl RunResult {
    /// Creates a new result.
    #[inline]
    pub const fn new(time_to_ascend: f64, terminal_velocity: f64) -> Self {
        Self {
            time_to_ascend,
            terminal_velocity,
        }
    }
}

/// Speed at the bottom of a ramp by energy conservation:
/// `sqrt(2 * g * |end.y - start.y|)`.
///
/// Never negative; `0.0` when the endpoints are at the same height.
///
/// ```rust
/// use incline::{terminal_velocity, Point, RampPath, RampPoints, GRAVITY};
///
/// let ramp = RampPath::new(
///     "r",
///     "orange",
///     RampPoints::new(
///         Point::new(0.0, 400.0),
///         Point::new(300.0, 300.0),
///         Point::new(600.0, 100.0),
///         Point::new(1180.0, 50.0),
///     ),
/// );
/// assert!((terminal_velocity(&ramp, GRAVITY) - 82.87).abs() < 0.01);
/// ```
pub fn terminal_velocity(path: &RampPath, gravity: f64) -> f64 {
    let drop = (path.points.end.y - path.points.start.y).abs();
    let gravity = if gravity.is_finite() { gravity.abs() } else { 0.0 };
    let v = (2.0 * gravity * drop).sqrt();
    if v.is_finite() { v } else { 0.0 }
}

/// Stylized animation duration for a ramp, in seconds.
///
/// `(2 * arc_length / terminal_vel) * speed_factor` when the ball actually
/// falls, [`FALLBACK_DURATION_SECS`] otherwise. `speed_factor` only paces
/// the animation; it never feeds back into the terminal velocity.
pub fn descent_duration(
    _path: &RampPath,
    arc_length: f64,
    terminal_vel: f64,
    speed_factor: f64,
) -> f64 {
    descent_duration_or(arc_length, terminal_vel, speed_factor, FALLBACK_DURATION_SECS)
}

pub(crate) fn descent_duration_or(
    arc_length: f64,
    terminal_vel: f64,
    speed_factor: f64,
    fallback: f64,
) -> f64 {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(terminal_vel) || !positive(arc_length) {
        return fallback;
    }
    let speed_factor = if speed_factor.is_finite() {
        speed_factor.max(0.0)
    } else {
        0.0
    };
    let duration = (2.0 * arc_length / terminal_vel) * speed_factor;
    if duration.is_finite() { duration } else { fallback }
}

/// Everything the scheduler needs to know about one ramp, computed up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Polyline arc length.
    pub arc_length: f64,
    /// See [`terminal_velocity`].
    pub terminal_velocity: f64,
    /// See [`descent_duration`].
    pub duration: f64,
}

impl Kinematics {
    /// Computes arc length, terminal velocity and duration for `path`.
    pub fn compute(
        path: &RampPath,
        gravity: f64,
        speed_factor: f64,
        segments: usize,
        fallback_duration: f64,
    ) -> Self {
        let arc_length = path.curve().length_with(segments);
        let terminal_velocity = terminal_velocity(path, gravity);
        let duration =
            descent_duration_or(arc_length, terminal_velocity, speed_factor, fallback_duration);
        Self {
            arc_length,
            terminal_velocity,
            duration,
        }
    }

    /// Computes with the default gravity, subdivision and fallback.
    pub fn with_defaults(path: &RampPath, speed_factor: f64) -> Self {
        Self::compute(
            path,
            GRAVITY,
            speed_factor,
            ARC_LENGTH_SEGMENTS,
            FALLBACK_DURATION_SECS,
        )
    }

    /// The result reported once the traversal completes.
    #[inline]
    pub const fn result(&self) -> RunResult {
        RunResult::new(self.duration, self.terminal_velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, RampPoints};

    fn ramp(start_y: f64, end_y: f64) -> RampPath {
        RampPath::new(
            "r",
            "orange",
            RampPoints::new(
                Point::new(0.0, start_y),
                Point::new(400.0, start_y),
                Point::new(800.0, end_y),
                Point::new(1180.0, end_y),
            ),
        )
    }

    #[test]
    fn test_terminal_velocity_scenario() {
        let v = terminal_velocity(&ramp(400.0, 50.0), GRAVITY);
        let expected = (2.0 * 9.81 * 350.0_f64).sqrt();
        assert!((v - expected).abs() < 1e-12);
        assert!((v - 82.9).abs() < 0.05);
    }

    #[test]
    fn test_terminal_velocity_flat_is_zero() {
        assert_eq!(terminal_velocity(&ramp(100.0, 100.0), GRAVITY), 0.0);
    }

    #[test]
    fn test_terminal_velocity_uphill_is_positive() {
        assert!(terminal_velocity(&ramp(50.0, 400.0), GRAVITY) > 0.0);
    }

    #[test]
    fn test_terminal_velocity_bad_gravity() {
        assert_eq!(terminal_velocity(&ramp(400.0, 0.0), f64::NAN), 0.0);
        assert!(terminal_velocity(&ramp(400.0, 0.0), -9.81) > 0.0);
    }

    #[test]
    fn test_descent_duration_formula() {
        let r = ramp(400.0, 50.0);
        let d = descent_duration(&r, 1000.0, 80.0, 0.1);
        assert!((d - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_descent_duration_fallback() {
        let r = ramp(100.0, 100.0);
        assert_eq!(descent_duration(&r, 1000.0, 0.0, 0.1), FALLBACK_DURATION_SECS);
        assert_eq!(descent_duration(&r, 0.0, 0.0, 0.1), FALLBACK_DURATION_SECS);
    }

    #[test]
    fn test_speed_factor_scales_linearly() {
        let r = ramp(400.0, 50.0);
        let slow = descent_duration(&r, 500.0, 50.0, 0.2);
        let fast = descent_duration(&r, 500.0, 50.0, 0.1);
        assert!((slow - 2.0 * fast).abs() < 1e-12);
    }

    #[test]
    fn test_kinematics_result() {
        let r = ramp(400.0, 50.0);
        let k = Kinematics::with_defaults(&r, DEFAULT_SPEED_FACTOR);
        let result = k.result();
        assert_eq!(result.terminal_velocity, k.terminal_velocity);
        assert_eq!(result.time_to_ascend, k.duration);
        assert!(k.arc_length > 1180.0);
    }

    #[test]
    fn test_run_result_camel_case() {
        let json = serde_json::to_string(&RunResult::new(1.5, 2.0)).unwrap();
        assert_eq!(json, r#"{"timeToAscend":1.5,"terminalVelocity":2.0}"#);
    }
}
