#![forbid(unsafe_code)]
// Allow these clippy lints for physics/math code readability
#![allow(clippy::must_use_candidate)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::use_self)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::module_name_repetitions)]

//! # Incline
//!
//! Balls rolling down user-drawn ramps.
//!
//! Incline provides:
//! - **Geometry**: cubic Bézier ramps, evaluation and arc length
//! - **Physics**: terminal velocity and a stylized descent duration
//! - **Mapping**: plane coordinates to render space and back
//! - **Animation**: frame-driven traversal of many ramps on one clock
//! - **Workbench**: editing, selection, persistence and launching
//!
//! ## Physics Example
//!
//! ```rust
//! use incline::{curve_length, terminal_velocity, Point, RampPath, RampPoints, GRAVITY};
//!
//! let ramp = RampPath::new(
//!     "path1",
//!     "orange",
//!     RampPoints::new(
//!         Point::new(0.0, 400.0),
//!         Point::new(773.0, 320.7),
//!         Point::new(274.6, 119.7),
//!         Point::new(1180.0, 50.0),
//!     ),
//! );
//!
//! // Heights are centimeters, gravity is m/s², combined as-is.
//! let v = terminal_velocity(&ramp, GRAVITY);
//! assert!((v - 82.87).abs() < 0.01);
//! assert!(curve_length(&ramp) > 1180.0);
//! ```
//!
//! ## Launch Example
//!
//! ```rust
//! use incline::{Config, RampRegistry, PlaneDimensions, Scheduler};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> incline::Result<()> {
//! let registry = RampRegistry::with_defaults(PlaneDimensions::default());
//! let scheduler = Scheduler::new(Config::default());
//!
//! // Results come back in launch order, whichever ball lands first.
//! let outcome = scheduler.run(registry.ramps(), 0.01).await?;
//! let results = outcome.into_results().unwrap();
//! assert_eq!(results.len(), 4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Units
//!
//! Plane coordinates are centimeters with y pointing up. Gravity is in
//! m/s² and is applied to centimeter heights without conversion, so the
//! reported velocities and durations are display values rather than SI
//! quantities.

pub mod animation;
pub mod config;
pub mod error;
pub mod geometry;
pub mod history;
pub mod mapping;
pub mod physics;
pub mod prediction;
pub mod registry;
pub mod store;
pub mod workbench;

pub use animation::{
    fps, AnimationSession, BallPosition, Easing, Frame, Launch, LaunchOutcome, Pacing, Sample,
    Scheduler, Track, TrackState, Traversal,
};
pub use config::{Config, ConfigError};
pub use error::{BusyReason, Error, Result};
pub use geometry::{
    curve_length, point_at_length, point_at_progress, ArcLengthTable, Bounds, CubicBezier, Point,
    PointKey, RampPath, RampPoints, Vector,
};
pub use history::{RunHistory, RunRecord};
pub use mapping::{
    from_render_space, to_render_space, CanvasLayout, Margins, PlaneDimensions, RenderMapping,
    RenderSize,
};
pub use physics::{descent_duration, terminal_velocity, Kinematics, RunResult, GRAVITY};
pub use prediction::{Prediction, PredictionReport, TrajectoryChoice};
pub use registry::{Dimension, RampRegistry};
pub use store::{JsonFileStore, MemoryStore, RampStore};
pub use workbench::{Scene, SceneRamp, Workbench};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::animation::{fps, AnimationSession, LaunchOutcome, Scheduler, Traversal};
    pub use crate::geometry::{curve_length, point_at_progress, Point, PointKey, RampPath, RampPoints};
    pub use crate::mapping::{PlaneDimensions, RenderMapping, RenderSize};
    pub use crate::physics::{terminal_velocity, RunResult, GRAVITY};
    pub use crate::registry::RampRegistry;
    pub use crate::workbench::Workbench;
    pub use crate::{Config, Error, Result};
}
