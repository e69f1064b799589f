//! The controller that owns all mutable state.
//!
//! A [`Workbench`] holds the ramp registry, the scheduler, the persistence
//! backend and the edit-mode flag. Editing and animating are mutually
//! exclusive: while a launch is alive every geometry mutation is refused
//! with [`Error::Busy`], and launching is refused while in edit mode.
//!
//! ```rust
//! use incline::{Config, MemoryStore, Workbench};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> incline::Result<()> {
//! let mut bench = Workbench::open(MemoryStore::new(), Config::default())?;
//! bench.select("path2");
//!
//! let launch = bench.launch_selected(0.01)?;
//! assert!(bench.enter_edit_mode().is_err());
//!
//! let results = launch.run().await.into_results().unwrap();
//! assert_eq!(results.len(), 2);
//! # Ok(())
//! # }
//! ```

use tracing::{debug, info};

use crate::animation::{Frame, Launch, Scheduler};
use crate::config::Config;
use crate::error::{BusyReason, Error, Result};
use crate::geometry::{Point, PointKey, RampPath};
use crate::mapping::{PlaneDimensions, RenderMapping, RenderSize};
use crate::registry::{Dimension, RampRegistry};
use crate::store::RampStore;

/// Static drawing data for one ramp.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRamp {
    pub id: String,
    pub color: String,
    pub selected: bool,
    /// SVG path data in render space.
    pub path: String,
    /// Control points in render space, in curve order.
    pub handles: [Point; 4],
    /// Where the ball rests before launch, in render space.
    pub ball: Point,
}

/// Everything needed to draw the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub mapping: RenderMapping,
    pub editing: bool,
    pub animating: bool,
    pub ramps: Vec<SceneRamp>,
}

impl Scene {
    /// Ball positions of a frame in render space, in launch order.
    pub fn project(&self, frame: &Frame) -> Vec<Point> {
        frame
            .balls
            .iter()
            .map(|ball| self.mapping.to_render(ball.point))
            .collect()
    }
}

/// Owns the registry, scheduler, store and edit mode.
pub struct Workbench {
    registry: RampRegistry,
    scheduler: Scheduler,
    store: Box<dyn RampStore>,
    config: Config,
    editing: bool,
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("registry", &self.registry)
            .field("scheduler", &self.scheduler)
            .field("editing", &self.editing)
            .finish_non_exhaustive()
    }
}

impl Workbench {
    /// Opens a workbench, restoring saved ramps from `store`.
    ///
    /// Missing or malformed saved state falls back to the built-in ramps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `config` fails validation.
    pub fn open(store: impl RampStore + 'static, config: Config) -> Result<Self> {
        config.validate()?;
        let registry = match store.load() {
            Some(ramps) => RampRegistry::new(ramps, config.plane),
            None => RampRegistry::with_defaults(config.plane),
        };
        info!(
            ramps = registry.ramps().len(),
            plane_x = config.plane.x,
            plane_y = config.plane.y,
            "Workbench opened"
        );
        Ok(Self {
            registry,
            scheduler: Scheduler::new(config.clone()),
            store: Box::new(store),
            config,
            editing: false,
        })
    }

    /// The ramp registry.
    pub const fn registry(&self) -> &RampRegistry {
        &self.registry
    }

    /// All ramps.
    pub fn ramps(&self) -> &[RampPath] {
        self.registry.ramps()
    }

    /// A handle to the scheduler, e.g. for cancelling from another task.
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Whether edit mode is on.
    pub const fn is_editing(&self) -> bool {
        self.editing
    }

    /// Whether a launch is alive.
    pub fn is_animating(&self) -> bool {
        self.scheduler.is_running()
    }

    fn ensure_not_animating(&self) -> Result<()> {
        if self.scheduler.is_running() {
            debug!("Mutation rejected while animating");
            return Err(Error::Busy(BusyReason::Animating));
        }
        Ok(())
    }

    /// Turns edit mode on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] while a launch is alive.
    pub fn enter_edit_mode(&mut self) -> Result<()> {
        self.ensure_not_animating()?;
        self.editing = true;
        debug!("Edit mode on");
        Ok(())
    }

    /// Turns edit mode off and persists the ramps.
    ///
    /// # Errors
    ///
    /// Returns an error if the ramps cannot be saved. Edit mode is left
    /// either way.
    pub fn exit_edit_mode(&mut self) -> Result<()> {
        if !self.editing {
            return Ok(());
        }
        self.editing = false;
        self.store.save(self.registry.ramps())?;
        info!(ramps = self.registry.ramps().len(), "Edit mode off, ramps saved");
        Ok(())
    }

    /// Flips edit mode, returning the new state.
    ///
    /// # Errors
    ///
    /// As [`Workbench::enter_edit_mode`] and [`Workbench::exit_edit_mode`].
    pub fn toggle_edit_mode(&mut self) -> Result<bool> {
        if self.editing {
            self.exit_edit_mode()?;
        } else {
            self.enter_edit_mode()?;
        }
        Ok(self.editing)
    }

    /// Moves one control point, in plane coordinates.
    ///
    /// Returns `Ok(false)` when no ramp has `id`.
    ///
    /// # Errors
    ///
    /// [`Error::NotEditing`] outside edit mode, [`Error::Busy`] while
    /// animating.
    pub fn move_control_point(&mut self, id: &str, key: PointKey, point: Point) -> Result<bool> {
        self.ensure_not_animating()?;
        if !self.editing {
            return Err(Error::NotEditing);
        }
        Ok(self.registry.update_control_point(id, key, point))
    }

    /// Moves one control point to a position on the configured plot area,
    /// as a drag does.
    ///
    /// The position is mapped back to plane coordinates and clamped to the
    /// visible domain.
    ///
    /// # Errors
    ///
    /// As [`Workbench::move_control_point`].
    pub fn drag_control_point(&mut self, id: &str, key: PointKey, render: Point) -> Result<bool> {
        let point = self.plot_mapping().from_render(render);
        self.move_control_point(id, key, point)
    }

    /// Adds a ramp to the launch selection.
    pub fn select(&mut self, id: &str) -> bool {
        self.registry.select(id)
    }

    /// Makes `id` the only selected ramp.
    pub fn select_only(&mut self, id: &str) -> bool {
        self.registry.select_only(id)
    }

    /// Removes a ramp from the launch selection.
    pub fn deselect(&mut self, id: &str) -> bool {
        self.registry.deselect(id)
    }

    /// Current plane extents.
    pub const fn plane(&self) -> PlaneDimensions {
        self.registry.plane()
    }

    /// Resizes the plane. See [`RampRegistry::resize_plane`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] while animating.
    pub fn resize_plane(&mut self, dimension: Dimension, value: f64) -> Result<f64> {
        self.ensure_not_animating()?;
        Ok(self.registry.resize_plane(dimension, value))
    }

    /// Discards all edits, restores the built-in ramps and forgets the
    /// saved state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] while animating, or a store error.
    pub fn reset_to_defaults(&mut self) -> Result<()> {
        self.ensure_not_animating()?;
        self.registry.reset_to_defaults();
        self.store.clear()?;
        info!("Ramps reset to defaults");
        Ok(())
    }

    /// Launches every selected ramp with the configured speed factor.
    ///
    /// # Errors
    ///
    /// As [`Workbench::launch_selected`].
    pub fn launch(&self) -> Result<Launch> {
        self.launch_selected(self.config.speed_factor)
    }

    /// Launches every selected ramp on a snapshot of their geometry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] in edit mode or while another launch is alive.
    pub fn launch_selected(&self, speed_factor: f64) -> Result<Launch> {
        if self.editing {
            debug!("Launch rejected in edit mode");
            return Err(Error::Busy(BusyReason::Editing));
        }
        let snapshot: Vec<RampPath> = self.registry.selected_ramps().cloned().collect();
        self.scheduler.launch(&snapshot, speed_factor)
    }

    /// A render mapping covering every ramp, drawn at `render`.
    pub fn render_mapping(&self, render: RenderSize) -> RenderMapping {
        RenderMapping::fit_with_padding(
            self.registry.plane(),
            self.registry.ramps(),
            render,
            self.config.domain_padding,
        )
    }

    fn plot_mapping(&self) -> RenderMapping {
        self.render_mapping(self.config.canvas.plot_size())
    }

    /// Static drawing data for every ramp on the configured plot area.
    pub fn scene(&self) -> Scene {
        let mapping = self.plot_mapping();
        let ramps = self
            .registry
            .ramps()
            .iter()
            .map(|ramp| SceneRamp {
                id: ramp.id.clone(),
                color: ramp.color.clone(),
                selected: self.registry.is_selected(&ramp.id),
                path: mapping.svg_path(ramp),
                handles: ramp.curve().control_points().map(|p| mapping.to_render(p)),
                ball: mapping.to_render(ramp.points.start),
            })
            .collect();
        Scene {
            mapping,
            editing: self.editing,
            animating: self.is_animating(),
            ramps,
        }
    }
}
