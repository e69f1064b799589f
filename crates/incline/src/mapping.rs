//! Mapping between logical plane coordinates and render space.
//!
//! Plane coordinates are centimeters with y growing upward. Render space is
//! whatever the drawing surface uses, with y growing downward.

use core::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point, RampPath};

/// Padding (plane units) added beyond the furthest control point.
pub const DOMAIN_PADDING: f64 = 20.0;

/// Logical extents of the simulation area, in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneDimensions {
    pub x: f64,
    pub y: f64,
}

impl PlaneDimensions {
    /// Creates new plane dimensions.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for PlaneDimensions {
    fn default() -> Self {
        Self::new(1200.0, 400.0)
    }
}

/// Size of the drawable area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSize {
    pub width: f64,
    pub height: f64,
}

impl RenderSize {
    /// Creates a new render size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Space reserved around the plot for axes and labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 30.0,
            right: 30.0,
            bottom: 50.0,
            left: 50.0,
        }
    }
}

/// Outer canvas with margins around the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasLayout {
    /// Full canvas size.
    pub size: RenderSize,
    /// Space around the plot.
    #[serde(default)]
    pub margins: Margins,
}

impl Default for CanvasLayout {
    fn default() -> Self {
        Self {
            size: RenderSize::new(800.0, 500.0),
            margins: Margins::default(),
        }
    }
}

impl CanvasLayout {
    /// Size of the plot area inside the margins. Never negative.
    pub fn plot_size(&self) -> RenderSize {
        RenderSize::new(
            (self.size.width - self.margins.left - self.margins.right).max(0.0),
            (self.size.height - self.margins.top - self.margins.bottom).max(0.0),
        )
    }

    /// Translates a plot-space point to canvas space.
    #[inline]
    pub fn to_canvas(&self, point: Point) -> Point {
        Point::new(point.x + self.margins.left, point.y + self.margins.top)
    }

    /// Translates a canvas-space point (e.g. a pointer position) to plot space.
    #[inline]
    pub fn to_plot(&self, point: Point) -> Point {
        Point::new(point.x - self.margins.left, point.y - self.margins.top)
    }
}

/// Maps a plane point into render space.
///
/// x: `[0, domain.x] -> [0, width]`; y: `[0, domain.y] -> [height, 0]`.
/// A zero-sized domain axis maps everything to the origin of that axis.
pub fn to_render_space(point: Point, domain: PlaneDimensions, render: RenderSize) -> Point {
    Point::new(
        scale(point.x, domain.x, render.width),
        render.height - scale(point.y, domain.y, render.height),
    )
}

/// Inverse of [`to_render_space`], clamped to `[0, domain.x] x [0, domain.y]`.
pub fn from_render_space(point: Point, domain: PlaneDimensions, render: RenderSize) -> Point {
    let x = scale(point.x, render.width, domain.x);
    let y = scale(render.height - point.y, render.height, domain.y);
    Point::new(clamp_axis(x, domain.x), clamp_axis(y, domain.y))
}

#[inline]
fn scale(value: f64, from: f64, to: f64) -> f64 {
    if from.abs() < f64::EPSILON {
        0.0
    } else {
        value / from * to
    }
}

#[inline]
fn clamp_axis(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max.max(0.0))
    }
}

/// A render mapping whose domain covers every registered ramp.
///
/// The domain spans `[origin, domain]` on each axis. The origin is `(0, 0)`
/// unless a control point lies below zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderMapping {
    origin: Point,
    domain: PlaneDimensions,
    render: RenderSize,
}

impl RenderMapping {
    /// Uses `domain` as-is, with the origin at `(0, 0)`.
    #[inline]
    pub const fn new(domain: PlaneDimensions, render: RenderSize) -> Self {
        Self {
            origin: Point::new(0.0, 0.0),
            domain,
            render,
        }
    }

    /// Expands `plane` so that no control point of `ramps` falls outside
    /// the render area, padding the outermost points by [`DOMAIN_PADDING`].
    /// Points below zero move the origin down by the same padding.
    pub fn fit<'a>(
        plane: PlaneDimensions,
        ramps: impl IntoIterator<Item = &'a RampPath>,
        render: RenderSize,
    ) -> Self {
        Self::fit_with_padding(plane, ramps, render, DOMAIN_PADDING)
    }

    /// Like [`RenderMapping::fit`] with an explicit padding.
    pub fn fit_with_padding<'a>(
        plane: PlaneDimensions,
        ramps: impl IntoIterator<Item = &'a RampPath>,
        render: RenderSize,
        padding: f64,
    ) -> Self {
        let bounds = ramps
            .into_iter()
            .map(|ramp| ramp.curve().bounds())
            .reduce(Bounds::union);

        let Some(b) = bounds else {
            return Self::new(plane, render);
        };
        let low = |min: f64| if min < 0.0 { min - padding } else { 0.0 };
        Self {
            origin: Point::new(low(b.min.x), low(b.min.y)),
            domain: PlaneDimensions::new(
                plane.x.max(b.max.x + padding),
                plane.y.max(b.max.y + padding),
            ),
            render,
        }
    }

    /// The effective (possibly expanded) upper extent of the domain.
    #[inline]
    pub const fn domain(&self) -> PlaneDimensions {
        self.domain
    }

    /// Lower corner of the domain, `(0, 0)` unless a ramp dips below zero.
    #[inline]
    pub const fn origin(&self) -> Point {
        self.origin
    }

    fn span(&self) -> PlaneDimensions {
        PlaneDimensions::new(self.domain.x - self.origin.x, self.domain.y - self.origin.y)
    }

    /// The render size.
    #[inline]
    pub const fn render_size(&self) -> RenderSize {
        self.render
    }

    /// Plane to render space.
    #[inline]
    pub fn to_render(&self, point: Point) -> Point {
        let shifted = Point::new(point.x - self.origin.x, point.y - self.origin.y);
        to_render_space(shifted, self.span(), self.render)
    }

    /// Render to plane space, clamped to the domain. Used for dragging.
    #[inline]
    pub fn from_render(&self, point: Point) -> Point {
        let p = from_render_space(point, self.span(), self.render);
        Point::new(p.x + self.origin.x, p.y + self.origin.y)
    }

    /// SVG path data for a ramp in render space.
    pub fn svg_path(&self, ramp: &RampPath) -> String {
        let [p0, p1, p2, p3] = ramp.curve().control_points().map(|p| self.to_render(p));
        let mut d = String::with_capacity(64);
        let _ = write!(
            d,
            "M{},{} C{},{} {},{} {},{}",
            p0.x, p0.y, p1.x, p1.y, p2.x, p2.y, p3.x, p3.y
        );
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RampPoints;

    const TOLERANCE: f64 = 1e-9;

    fn approx_point(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < TOLERANCE && (a.y - b.y).abs() < TOLERANCE
    }

    #[test]
    fn test_to_render_inverts_y() {
        let domain = PlaneDimensions::new(1000.0, 500.0);
        let render = RenderSize::new(100.0, 50.0);
        assert!(approx_point(
            to_render_space(Point::new(0.0, 0.0), domain, render),
            Point::new(0.0, 50.0)
        ));
        assert!(approx_point(
            to_render_space(Point::new(1000.0, 500.0), domain, render),
            Point::new(100.0, 0.0)
        ));
    }

    #[test]
    fn test_round_trip() {
        let domain = PlaneDimensions::new(1200.0, 400.0);
        let render = RenderSize::new(720.0, 420.0);
        let p = Point::new(321.5, 123.25);
        let back = from_render_space(to_render_space(p, domain, render), domain, render);
        assert!(approx_point(p, back));
    }

    #[test]
    fn test_from_render_clamps() {
        let domain = PlaneDimensions::new(100.0, 100.0);
        let render = RenderSize::new(10.0, 10.0);
        let p = from_render_space(Point::new(-5.0, 50.0), domain, render);
        assert_eq!(p, Point::new(0.0, 0.0));
        let p = from_render_space(Point::new(50.0, -50.0), domain, render);
        assert_eq!(p, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_zero_domain_no_nan() {
        let p = to_render_space(
            Point::new(5.0, 5.0),
            PlaneDimensions::new(0.0, 0.0),
            RenderSize::new(10.0, 10.0),
        );
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    #[test]
    fn test_fit_expands_domain() {
        let ramp = RampPath::new(
            "r",
            "teal",
            RampPoints::new(
                Point::new(0.0, 400.0),
                Point::new(1500.0, 304.0),
                Point::new(767.0, 119.0),
                Point::new(1180.0, 50.0),
            ),
        );
        let mapping = RenderMapping::fit(
            PlaneDimensions::new(1200.0, 400.0),
            [&ramp],
            RenderSize::new(720.0, 420.0),
        );
        assert!((mapping.domain().x - 1520.0).abs() < TOLERANCE);
        assert!((mapping.domain().y - 420.0).abs() < TOLERANCE);
        for p in ramp.points.iter() {
            let r = mapping.to_render(p);
            assert!((0.0..=720.0).contains(&r.x));
            assert!((0.0..=420.0).contains(&r.y));
        }
    }

    #[test]
    fn test_fit_covers_negative_control_points() {
        let ramp = RampPath::new(
            "r",
            "blue",
            RampPoints::new(
                Point::new(0.0, 400.0),
                Point::new(-30.0, 300.0),
                Point::new(10.0, -5.0),
                Point::new(1180.0, 50.0),
            ),
        );
        let render = RenderSize::new(720.0, 420.0);
        let mapping = RenderMapping::fit(PlaneDimensions::new(1200.0, 400.0), [&ramp], render);
        assert_eq!(mapping.origin(), Point::new(-50.0, -25.0));
        for p in ramp.points.iter() {
            let r = mapping.to_render(p);
            assert!((0.0..=720.0).contains(&r.x), "x={} for {p:?}", r.x);
            assert!((0.0..=420.0).contains(&r.y), "y={} for {p:?}", r.y);
            assert!(approx_point(mapping.from_render(r), p));
        }
        // Dragging to the bottom-left corner reaches the origin.
        assert!(approx_point(
            mapping.from_render(Point::new(0.0, 420.0)),
            mapping.origin()
        ));
    }

    #[test]
    fn test_fit_without_negative_points_keeps_zero_origin() {
        let ramp = RampPath::new(
            "r",
            "red",
            RampPoints::new(
                Point::new(0.0, 400.0),
                Point::new(10.0, 300.0),
                Point::new(20.0, 100.0),
                Point::new(30.0, 0.0),
            ),
        );
        let mapping = RenderMapping::fit(
            PlaneDimensions::new(1200.0, 400.0),
            [&ramp],
            RenderSize::new(720.0, 420.0),
        );
        assert_eq!(mapping.origin(), Point::new(0.0, 0.0));
        assert!(approx_point(
            mapping.to_render(Point::new(0.0, 0.0)),
            Point::new(0.0, 420.0)
        ));
    }

    #[test]
    fn test_fit_keeps_larger_plane() {
        let ramp = RampPath::new(
            "r",
            "red",
            RampPoints::new(
                Point::new(0.0, 10.0),
                Point::new(1.0, 10.0),
                Point::new(2.0, 0.0),
                Point::new(3.0, 0.0),
            ),
        );
        let plane = PlaneDimensions::new(1200.0, 400.0);
        let mapping = RenderMapping::fit(plane, [&ramp], RenderSize::new(1.0, 1.0));
        assert_eq!(mapping.domain(), plane);
    }

    #[test]
    fn test_canvas_plot_size() {
        let layout = CanvasLayout::default();
        assert_eq!(layout.plot_size(), RenderSize::new(720.0, 420.0));
        assert_eq!(layout.to_plot(layout.to_canvas(Point::new(3.0, 4.0))), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_svg_path_format() {
        let ramp = RampPath::new(
            "r",
            "red",
            RampPoints::new(
                Point::new(0.0, 100.0),
                Point::new(50.0, 100.0),
                Point::new(50.0, 0.0),
                Point::new(100.0, 0.0),
            ),
        );
        let mapping = RenderMapping::new(
            PlaneDimensions::new(100.0, 100.0),
            RenderSize::new(100.0, 100.0),
        );
        assert_eq!(mapping.svg_path(&ramp), "M0,0 C50,0 50,100 100,100");
    }
}
