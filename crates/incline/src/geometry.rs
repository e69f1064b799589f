//! Ramp geometry: points, cubic Bézier ramps and arc length.
//!
//! A ramp is a cubic Bézier curve with four control points expressed in
//! logical plane units (centimeters, y growing upward).
//!
//! # Example
//!
//! ```rust
//! use incline::{curve_length, point_at_progress, Point, RampPath, RampPoints};
//!
//! let ramp = RampPath::new(
//!     "straight",
//!     "orange",
//!     RampPoints::new(
//!         Point::new(0.0, 300.0),
//!         Point::new(100.0, 200.0),
//!         Point::new(200.0, 100.0),
//!         Point::new(300.0, 0.0),
//!     ),
//! );
//!
//! assert_eq!(point_at_progress(&ramp, 0.0), ramp.points.start);
//! assert!((curve_length(&ramp) - 300.0 * 2f64.sqrt()).abs() < 1e-6);
//! ```

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Neg, Sub};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of polyline segments used to approximate arc length.
pub const ARC_LENGTH_SEGMENTS: usize = 1000;

/// Lower bound on the polyline subdivision count.
pub const MIN_ARC_LENGTH_SEGMENTS: usize = 100;

/// A point on the plane, in logical centimeters.
///
/// ```rust
/// use incline::{Point, Vector};
///
/// let p = Point::new(1.0, 2.0) + Vector::new(3.0, 4.0);
/// assert_eq!(p, Point::new(4.0, 6.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal distance.
    pub x: f64,
    /// Height.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the origin.
    #[inline]
    pub const fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other - self).magnitude()
    }

    /// Linear interpolation between `self` and `other`.
    #[inline]
    pub fn lerp(self, other: Point, t: f64) -> Point {
        self + (other - self) * t
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    #[inline]
    fn add(self, v: Vector) -> Point {
        Point {
            x: self.x + v.x,
            y: self.y + v.y,
        }
    }
}

impl AddAssign<Vector> for Point {
    #[inline]
    fn add_assign(&mut self, v: Vector) {
        self.x += v.x;
        self.y += v.y;
    }
}

impl Sub for Point {
    type Output = Vector;

    #[inline]
    fn sub(self, other: Point) -> Vector {
        Vector {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Point {
        Point {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// A displacement between two points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vector {
    /// Creates a new vector.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the zero vector.
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Returns the length of the vector.
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl Add for Vector {
    type Output = Vector;

    #[inline]
    fn add(self, other: Vector) -> Vector {
        Vector {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    #[inline]
    fn mul(self, scalar: f64) -> Vector {
        Vector {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Mul<Vector> for f64 {
    type Output = Vector;

    #[inline]
    fn mul(self, v: Vector) -> Vector {
        v * self
    }
}

/// Names one of the four control points of a ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKey {
    /// Where the ball is released.
    Start,
    /// First handle.
    Cp1,
    /// Second handle.
    Cp2,
    /// Where the ball lands.
    End,
}

impl PointKey {
    /// All keys in curve order.
    pub const ALL: [PointKey; 4] = [Self::Start, Self::Cp1, Self::Cp2, Self::End];

    /// The key as it appears in persisted state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Cp1 => "cp1",
            Self::Cp2 => "cp2",
            Self::End => "end",
        }
    }
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when a string does not name a control point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown control point '{0}', expected one of start, cp1, cp2, end")]
pub struct UnknownPointKey(pub String);

impl FromStr for PointKey {
    type Err = UnknownPointKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "cp1" => Ok(Self::Cp1),
            "cp2" => Ok(Self::Cp2),
            "end" => Ok(Self::End),
            _ => Err(UnknownPointKey(s.to_string())),
        }
    }
}

/// The four control points of a ramp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RampPoints {
    pub start: Point,
    pub cp1: Point,
    pub cp2: Point,
    pub end: Point,
}

impl RampPoints {
    /// Creates a new set of control points.
    #[inline]
    pub const fn new(start: Point, cp1: Point, cp2: Point, end: Point) -> Self {
        Self {
            start,
            cp1,
            cp2,
            end,
        }
    }

    /// Returns the point stored under `key`.
    #[inline]
    pub const fn get(&self, key: PointKey) -> Point {
        match key {
            PointKey::Start => self.start,
            PointKey::Cp1 => self.cp1,
            PointKey::Cp2 => self.cp2,
            PointKey::End => self.end,
        }
    }

    /// Replaces the point stored under `key`.
    #[inline]
    pub fn set(&mut self, key: PointKey, point: Point) {
        match key {
            PointKey::Start => self.start = point,
            PointKey::Cp1 => self.cp1 = point,
            PointKey::Cp2 => self.cp2 = point,
            PointKey::End => self.end = point,
        }
    }

    /// Iterates the points in curve order.
    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        PointKey::ALL.iter().map(|key| self.get(*key))
    }
}

/// A user-editable ramp.
///
/// Control points may overshoot the endpoints horizontally; only `start`
/// and `end` take part in the energy computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampPath {
    /// Stable identity used by mutations and selection.
    pub id: String,
    /// Display color name.
    pub color: String,
    /// Curve definition.
    pub points: RampPoints,
}

impl RampPath {
    /// Creates a new ramp.
    pub fn new(id: impl Into<String>, color: impl Into<String>, points: RampPoints) -> Self {
        Self {
            id: id.into(),
            color: color.into(),
            points,
        }
    }

    /// The ramp's curve.
    #[inline]
    pub const fn curve(&self) -> CubicBezier {
        CubicBezier::from_points(self.points)
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Bounding box of a set of points, `None` when empty.
    pub fn of(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(
            Self {
                min: first,
                max: first,
            },
            |b, p| Self {
                min: Point::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                max: Point::new(b.max.x.max(p.x), b.max.y.max(p.y)),
            },
        ))
    }

    /// Smallest box covering both.
    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// A cubic Bézier curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    p0: Point,
    p1: Point,
    p2: Point,
    p3: Point,
}

impl CubicBezier {
    /// Creates a curve from its four control points.
    #[inline]
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Creates a curve from a ramp's control points.
    #[inline]
    pub const fn from_points(points: RampPoints) -> Self {
        Self::new(points.start, points.cp1, points.cp2, points.end)
    }

    /// The control points in order.
    #[inline]
    pub const fn control_points(&self) -> [Point; 4] {
        [self.p0, self.p1, self.p2, self.p3]
    }

    /// Evaluates the curve at parameter `t`.
    ///
    /// `t` is clamped to `[0, 1]`; NaN evaluates to the start point. The
    /// endpoints are returned exactly rather than through the blend.
    pub fn point_at(&self, t: f64) -> Point {
        let t = clamp_unit(t);
        if t <= 0.0 {
            return self.p0;
        }
        if t >= 1.0 {
            return self.p3;
        }

        let u = 1.0 - t;
        let b0 = u * u * u;
        let b1 = 3.0 * u * u * t;
        let b2 = 3.0 * u * t * t;
        let b3 = t * t * t;

        Point {
            x: b0 * self.p0.x + b1 * self.p1.x + b2 * self.p2.x + b3 * self.p3.x,
            y: b0 * self.p0.y + b1 * self.p1.y + b2 * self.p2.y + b3 * self.p3.y,
        }
    }

    /// Arc length approximated by a polyline of `segments` pieces.
    ///
    /// `segments` is raised to [`MIN_ARC_LENGTH_SEGMENTS`].
    pub fn length_with(&self, segments: usize) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        let segments = segments.max(MIN_ARC_LENGTH_SEGMENTS);
        let mut prev = self.p0;
        let mut total = 0.0;
        for i in 1..=segments {
            let next = self.point_at(i as f64 / segments as f64);
            total += prev.distance(next);
            prev = next;
        }
        total
    }

    /// Arc length with the default subdivision.
    #[inline]
    pub fn length(&self) -> f64 {
        self.length_with(ARC_LENGTH_SEGMENTS)
    }

    /// The same curve traversed end to start.
    #[inline]
    pub const fn reversed(&self) -> Self {
        Self::new(self.p3, self.p2, self.p1, self.p0)
    }

    /// Bounding box of the control polygon, which contains the curve.
    pub fn bounds(&self) -> Bounds {
        let [a, b, c, d] = self.control_points();
        let min = Point::new(a.x.min(b.x).min(c.x).min(d.x), a.y.min(b.y).min(c.y).min(d.y));
        let max = Point::new(a.x.max(b.x).max(c.x).max(d.x), a.y.max(b.y).max(c.y).max(d.y));
        Bounds { min, max }
    }

    /// True when all four control points coincide.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.p0 == self.p1 && self.p1 == self.p2 && self.p2 == self.p3
    }
}

#[inline]
fn clamp_unit(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Cumulative arc length at evenly spaced parameter values.
///
/// Used to sample a curve by distance travelled instead of by parameter,
/// which keeps on-screen speed proportional to distance.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcLengthTable {
    curve: CubicBezier,
    cumulative: Vec<f64>,
}

impl ArcLengthTable {
    /// Builds the table with `segments` polyline pieces.
    pub fn new(curve: CubicBezier, segments: usize) -> Self {
        let segments = segments.max(MIN_ARC_LENGTH_SEGMENTS);
        let mut cumulative = Vec::with_capacity(segments + 1);
        cumulative.push(0.0);
        let mut prev = curve.point_at(0.0);
        let mut total = 0.0;
        for i in 1..=segments {
            let next = curve.point_at(i as f64 / segments as f64);
            total += prev.distance(next);
            cumulative.push(total);
            prev = next;
        }
        Self { curve, cumulative }
    }

    /// Total length.
    #[inline]
    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Curve parameter reached after travelling `distance` from the start.
    pub fn parameter_at(&self, distance: f64) -> f64 {
        let total = self.length();
        if total <= 0.0 || distance.is_nan() || distance <= 0.0 {
            return 0.0;
        }
        if distance >= total {
            return 1.0;
        }

        let segments = self.cumulative.len() - 1;
        // First sample whose cumulative length is >= distance.
        let hi = self.cumulative.partition_point(|&len| len < distance).max(1);
        let lo = hi - 1;
        let span = self.cumulative[hi] - self.cumulative[lo];
        let frac = if span > 0.0 {
            (distance - self.cumulative[lo]) / span
        } else {
            0.0
        };
        (lo as f64 + frac) / segments as f64
    }

    /// Point reached after travelling `distance` along the curve.
    #[inline]
    pub fn point_at_length(&self, distance: f64) -> Point {
        self.curve.point_at(self.parameter_at(distance))
    }
}

/// Arc length of a ramp, by polyline approximation with
/// [`ARC_LENGTH_SEGMENTS`] segments.
///
/// Returns exactly `0.0` when all control points coincide.
#[inline]
pub fn curve_length(path: &RampPath) -> f64 {
    path.curve().length()
}

/// Point on a ramp at parametric progress `t`, clamped to `[0, 1]`.
#[inline]
pub fn point_at_progress(path: &RampPath, t: f64) -> Point {
    path.curve().point_at(t)
}

/// Point reached after travelling `distance` along a ramp.
pub fn point_at_length(path: &RampPath, distance: f64) -> Point {
    ArcLengthTable::new(path.curve(), ARC_LENGTH_SEGMENTS).point_at_length(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn line(len: f64) -> RampPath {
        RampPath::new(
            "line",
            "red",
            RampPoints::new(
                Point::new(0.0, 0.0),
                Point::new(len / 3.0, 0.0),
                Point::new(2.0 * len / 3.0, 0.0),
                Point::new(len, 0.0),
            ),
        )
    }

    #[test]
    fn test_point_sub_point() {
        let v = Point::new(5.0, 7.0) - Point::new(1.0, 2.0);
        assert!(approx_eq(v.x, 4.0));
        assert!(approx_eq(v.y, 5.0));
    }

    #[test]
    fn test_vector_magnitude() {
        assert!(approx_eq(Vector::new(3.0, 4.0).magnitude(), 5.0));
    }

    #[test]
    fn test_scalar_mul_vector() {
        let v = 2.0 * Vector::new(1.0, -2.0);
        assert_eq!(v, Vector::new(2.0, -4.0));
    }

    #[test]
    fn test_point_key_parse() {
        assert_eq!("cp1".parse::<PointKey>(), Ok(PointKey::Cp1));
        assert_eq!("END".parse::<PointKey>(), Ok(PointKey::End));
        assert!("middle".parse::<PointKey>().is_err());
    }

    #[test]
    fn test_point_key_serde_names() {
        let json = serde_json::to_string(&PointKey::Cp2).unwrap();
        assert_eq!(json, "\"cp2\"");
    }

    #[test]
    fn test_ramp_points_get_set() {
        let mut points = line(3.0).points;
        points.set(PointKey::Cp2, Point::new(9.0, 9.0));
        assert_eq!(points.get(PointKey::Cp2), Point::new(9.0, 9.0));
        assert_eq!(points.get(PointKey::End), Point::new(3.0, 0.0));
    }

    #[test]
    fn test_endpoints_exact() {
        let ramp = RampPath::new(
            "r",
            "blue",
            RampPoints::new(
                Point::new(0.0, 400.0),
                Point::new(93.98, 0.0),
                Point::new(428.98, 59.71),
                Point::new(1180.0, 50.0),
            ),
        );
        assert_eq!(point_at_progress(&ramp, 0.0), ramp.points.start);
        assert_eq!(point_at_progress(&ramp, 1.0), ramp.points.end);
    }

    #[test]
    fn test_progress_clamped() {
        let ramp = line(90.0);
        assert_eq!(point_at_progress(&ramp, -2.0), ramp.points.start);
        assert_eq!(point_at_progress(&ramp, 7.0), ramp.points.end);
        assert_eq!(point_at_progress(&ramp, f64::NAN), ramp.points.start);
    }

    #[test]
    fn test_straight_line_length() {
        let ramp = line(120.0);
        assert!((curve_length(&ramp) - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_length_is_zero() {
        let p = Point::new(5.0, 5.0);
        let ramp = RampPath::new("dot", "red", RampPoints::new(p, p, p, p));
        assert_eq!(curve_length(&ramp), 0.0);
    }

    #[test]
    fn test_length_deterministic() {
        let ramp = line(77.0);
        assert_eq!(curve_length(&ramp).to_bits(), curve_length(&ramp).to_bits());
    }

    #[test]
    fn test_length_segments_floor() {
        let curve = line(10.0).curve();
        assert_eq!(curve.length_with(1), curve.length_with(MIN_ARC_LENGTH_SEGMENTS));
    }

    #[test]
    fn test_bounds_cover_overshoot() {
        let ramp = RampPath::new(
            "r",
            "teal",
            RampPoints::new(
                Point::new(0.0, 400.0),
                Point::new(1200.0, 304.0),
                Point::new(767.0, 119.0),
                Point::new(1180.0, 50.0),
            ),
        );
        let b = ramp.curve().bounds();
        assert!(approx_eq(b.max.x, 1200.0));
        assert!(approx_eq(b.min.y, 50.0));
    }

    #[test]
    fn test_arc_table_endpoints() {
        let ramp = line(50.0);
        let table = ArcLengthTable::new(ramp.curve(), ARC_LENGTH_SEGMENTS);
        assert_eq!(table.point_at_length(0.0), ramp.points.start);
        assert_eq!(table.point_at_length(table.length()), ramp.points.end);
        assert_eq!(table.point_at_length(1e9), ramp.points.end);
    }

    #[test]
    fn test_arc_table_midpoint_on_line() {
        let ramp = line(50.0);
        let mid = point_at_length(&ramp, 25.0);
        assert!((mid.x - 25.0).abs() < 1e-6);
    }
}
