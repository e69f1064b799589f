//! The set of ramps, the current selection and the plane extents.

use tracing::debug;

use crate::geometry::{Point, PointKey, RampPath, RampPoints};
use crate::mapping::PlaneDimensions;

/// Smallest allowed plane extent, in centimeters.
pub const MIN_PLANE_DIMENSION: f64 = 100.0;

/// Distance kept between every ramp's end and the right edge after a resize.
pub const RESIZE_END_OFFSET: f64 = 50.0;

/// Distance kept between every ramp's end and the right edge after a reset.
pub const RESET_END_OFFSET: f64 = 20.0;

/// A plane axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// Width.
    X,
    /// Height.
    Y,
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" | "width" => Ok(Self::X),
            "y" | "height" => Ok(Self::Y),
            other => Err(format!("unknown dimension '{other}', expected x or y")),
        }
    }
}

/// The built-in ramp set, all dropping from 400 cm to 50 cm.
pub fn default_ramps() -> Vec<RampPath> {
    let start = Point::new(0.0, 400.0);
    let end = Point::new(1180.0, 50.0);
    let ramp = |id: &str, color: &str, cp1: Point, cp2: Point| {
        RampPath::new(id, color, RampPoints::new(start, cp1, cp2, end))
    };

    vec![
        ramp(
            "path1",
            "orange",
            Point::new(772.962_951_660_156_2, 320.664_687_383_742_55),
            Point::new(274.629_592_895_507_8, 119.712_320_963_541_66),
        ),
        ramp(
            "path2",
            "blue",
            Point::new(93.981_463_114_420_58, 0.0),
            Point::new(428.981_475_830_078_1, 59.712_320_963_541_686),
        ),
        ramp(
            "path3",
            "teal",
            Point::new(1200.0, 304.474_211_193_266_34),
            Point::new(767.962_900_797_526_1, 119.712_320_963_541_66),
        ),
        ramp(
            "path4",
            "red",
            Point::new(570.180_555_555_555_5, 226.195_312_5),
            Point::new(571.875, 226.195_312_5),
        ),
    ]
}

/// Owns the ramps, which of them are selected, and the plane extents.
///
/// Mutations address ramps by id; an unknown id is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct RampRegistry {
    ramps: Vec<RampPath>,
    selected: Vec<String>,
    plane: PlaneDimensions,
}

impl RampRegistry {
    /// Creates a registry with the first ramp selected.
    pub fn new(ramps: Vec<RampPath>, plane: PlaneDimensions) -> Self {
        let selected = ramps.first().map(|r| vec![r.id.clone()]).unwrap_or_default();
        Self {
            ramps,
            selected,
            plane,
        }
    }

    /// Creates a registry holding the built-in ramps scaled to `plane`.
    pub fn with_defaults(plane: PlaneDimensions) -> Self {
        let mut registry = Self::new(Vec::new(), plane);
        registry.reset_to_defaults();
        registry
    }

    /// All ramps in registration order.
    pub fn ramps(&self) -> &[RampPath] {
        &self.ramps
    }

    /// Looks up a ramp.
    pub fn get(&self, id: &str) -> Option<&RampPath> {
        self.ramps.iter().find(|r| r.id == id)
    }

    /// Current plane extents.
    pub const fn plane(&self) -> PlaneDimensions {
        self.plane
    }

    /// Selected ids in registration order.
    pub fn selected_ids(&self) -> Vec<&str> {
        self.selected_ramps().map(|r| r.id.as_str()).collect()
    }

    /// Selected ramps in registration order.
    pub fn selected_ramps(&self) -> impl Iterator<Item = &RampPath> + '_ {
        self.ramps
            .iter()
            .filter(|r| self.selected.iter().any(|id| *id == r.id))
    }

    /// Whether `id` is selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    /// Adds a ramp to the selection. Returns false for unknown ids.
    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            debug!(ramp_id = id, "Select ignored, unknown ramp");
            return false;
        }
        if !self.is_selected(id) {
            self.selected.push(id.to_string());
        }
        true
    }

    /// Makes `id` the only selected ramp. Returns false for unknown ids.
    pub fn select_only(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            debug!(ramp_id = id, "Select ignored, unknown ramp");
            return false;
        }
        self.selected.clear();
        self.selected.push(id.to_string());
        true
    }

    /// Removes a ramp from the selection.
    pub fn deselect(&mut self, id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| s != id);
        self.selected.len() != before
    }

    /// Replaces one named control point of one ramp.
    ///
    /// Returns false, changing nothing, when no ramp has `id`.
    pub fn update_control_point(&mut self, id: &str, key: PointKey, point: Point) -> bool {
        match self.ramps.iter_mut().find(|r| r.id == id) {
            Some(ramp) => {
                ramp.points.set(key, point);
                debug!(ramp_id = id, point = %key, x = point.x, y = point.y, "Control point moved");
                true
            }
            None => {
                debug!(ramp_id = id, point = %key, "Control point update ignored, unknown ramp");
                false
            }
        }
    }

    /// Resizes one plane axis, clamped to [`MIN_PLANE_DIMENSION`].
    ///
    /// Resizing the width moves every ramp's end to
    /// [`RESIZE_END_OFFSET`] from the new right edge. Returns the value
    /// actually applied.
    pub fn resize_plane(&mut self, dimension: Dimension, value: f64) -> f64 {
        let value = if value.is_finite() {
            value.max(MIN_PLANE_DIMENSION)
        } else {
            MIN_PLANE_DIMENSION
        };

        match dimension {
            Dimension::X => {
                self.plane.x = value;
                let end_x = value - RESIZE_END_OFFSET;
                for ramp in &mut self.ramps {
                    ramp.points.end.x = end_x;
                }
            }
            Dimension::Y => self.plane.y = value,
        }
        debug!(?dimension, value, "Plane resized");
        value
    }

    /// Restores the built-in ramps, landing [`RESET_END_OFFSET`] from the
    /// current right edge, and selects the first one.
    pub fn reset_to_defaults(&mut self) {
        let end_x = self.plane.x - RESET_END_OFFSET;
        self.ramps = default_ramps()
            .into_iter()
            .map(|mut ramp| {
                ramp.points.end.x = end_x;
                ramp
            })
            .collect();
        self.selected = self.ramps.first().map(|r| vec![r.id.clone()]).unwrap_or_default();
    }

    /// Replaces every ramp, keeping selections whose ids still exist.
    pub fn replace_ramps(&mut self, ramps: Vec<RampPath>) {
        self.ramps = ramps;
        let ramps = &self.ramps;
        self.selected.retain(|id| ramps.iter().any(|r| r.id == *id));
        if self.selected.is_empty()
            && let Some(first) = self.ramps.first()
        {
            self.selected.push(first.id.clone());
        }
    }
}
