//! Engine configuration.
//!
//! [`Config`] is the single source of truth for physical constants, pacing
//! and layout. It can be built in code, or loaded from TOML where every
//! field is optional:
//!
//! ```rust
//! use incline::Config;
//!
//! let config = Config::from_toml_str("fps = 30\nspeed_factor = 0.2").unwrap();
//! assert_eq!(config.fps, 30);
//! assert_eq!(config.gravity, incline::GRAVITY);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::animation::{Easing, Pacing};
use crate::geometry::{ARC_LENGTH_SEGMENTS, MIN_ARC_LENGTH_SEGMENTS};
use crate::mapping::{CanvasLayout, PlaneDimensions, DOMAIN_PADDING};
use crate::physics::{DEFAULT_SPEED_FACTOR, FALLBACK_DURATION_SECS, GRAVITY};

/// Default animation frame rate.
pub const DEFAULT_FPS: u32 = 60;

/// Highest accepted frame rate. Faster intervals only burn CPU.
pub const MAX_FPS: u32 = 1000;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ========================================================================
    // Physics
    // ========================================================================
    /// Gravitational acceleration used for terminal velocity.
    pub gravity: f64,

    /// Animation pacing multiplier (lower is faster).
    pub speed_factor: f64,

    /// Duration used for ramps without a height drop.
    pub fallback_duration_secs: f64,

    /// Polyline subdivision for arc length.
    pub arc_length_segments: usize,

    // ========================================================================
    // Animation
    // ========================================================================
    /// Frames per second of the scheduler tick.
    pub fps: u32,

    /// Progress easing.
    pub easing: Easing,

    /// How eased progress is turned into a point on the curve.
    pub pacing: Pacing,

    // ========================================================================
    // Layout
    // ========================================================================
    /// Padding beyond the furthest control point when fitting the domain.
    pub domain_padding: f64,

    /// Initial plane dimensions.
    pub plane: PlaneDimensions,

    /// Canvas and margins.
    pub canvas: CanvasLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            speed_factor: DEFAULT_SPEED_FACTOR,
            fallback_duration_secs: FALLBACK_DURATION_SECS,
            arc_length_segments: ARC_LENGTH_SEGMENTS,
            fps: DEFAULT_FPS,
            easing: Easing::QuadIn,
            pacing: Pacing::Parametric,
            domain_padding: DOMAIN_PADDING,
            plane: PlaneDimensions::default(),
            canvas: CanvasLayout::default(),
        }
    }
}

impl Config {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::InvalidValue`] when validation fails.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// as [`Config::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.is_finite() || self.gravity < 0.0 {
            return Err(ConfigError::invalid("gravity", "must be a finite, non-negative number"));
        }
        if !self.speed_factor.is_finite() || self.speed_factor < 0.0 {
            return Err(ConfigError::invalid(
                "speed_factor",
                "must be a finite, non-negative number",
            ));
        }
        if !self.fallback_duration_secs.is_finite() || self.fallback_duration_secs <= 0.0 {
            return Err(ConfigError::invalid(
                "fallback_duration_secs",
                "must be a finite, positive number",
            ));
        }
        if self.arc_length_segments < MIN_ARC_LENGTH_SEGMENTS {
            return Err(ConfigError::invalid(
                "arc_length_segments",
                format!("must be at least {MIN_ARC_LENGTH_SEGMENTS}"),
            ));
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(ConfigError::invalid(
                "fps",
                format!("must be between 1 and {MAX_FPS}"),
            ));
        }
        if !(self.plane.x.is_finite() && self.plane.y.is_finite())
            || self.plane.x <= 0.0
            || self.plane.y <= 0.0
        {
            return Err(ConfigError::invalid("plane", "dimensions must be positive"));
        }
        let plot = self.canvas.plot_size();
        if plot.width <= 0.0 || plot.height <= 0.0 {
            return Err(ConfigError::invalid(
                "canvas",
                "margins leave no room for the plot",
            ));
        }
        if !self.domain_padding.is_finite() || self.domain_padding < 0.0 {
            return Err(ConfigError::invalid("domain_padding", "must be non-negative"));
        }
        Ok(())
    }

    /// Export configuration as a diagnostic string.
    #[must_use]
    pub fn to_diagnostic_string(&self) -> String {
        let plot = self.canvas.plot_size();
        [
            format!("Gravity: {}", self.gravity),
            format!("Speed factor: {}", self.speed_factor),
            format!("Fallback duration: {}s", self.fallback_duration_secs),
            format!("Arc length segments: {}", self.arc_length_segments),
            format!("FPS: {}", self.fps),
            format!("Easing: {:?}", self.easing),
            format!("Pacing: {:?}", self.pacing),
            format!("Plane: {} x {} cm", self.plane.x, self.plane.y),
            format!(
                "Canvas: {} x {} (plot {} x {})",
                self.canvas.size.width, self.canvas.size.height, plot.width, plot.height
            ),
            format!("Domain padding: {}", self.domain_padding),
        ]
        .join("\n")
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A field holds an unusable value.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },

    /// The document is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// The config file could not be read.
    #[error("failed to read config {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
