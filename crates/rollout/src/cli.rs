//! Command-line interface for `rollout`.
//!
//! # Examples
//!
//! ```bash
//! # Launch the selected ramp and print its results
//! rollout launch
//!
//! # Race two ramps, faster than real time
//! rollout launch --ramp path1 --ramp path3 --speed-factor 0.01
//!
//! # Guess first, then launch and compare
//! rollout predict --time 2.5 --velocity 80 --quickest
//!
//! # Drag a handle
//! rollout set-point path2 cp1 150 20
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use incline::{Dimension, PointKey, TrajectoryChoice};

/// Launch balls down user-drawn ramps and compare their descents.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rollout",
    author,
    version,
    about = "Launch balls down user-drawn Bezier ramps",
    long_about = "Launch balls down user-drawn cubic Bezier ramps, edit the ramps, \
                  and compare predicted descent times with the computed ones."
)]
pub struct Cli {
    /// Directory holding saved ramps and run history
    #[arg(long, global = true, env = "INCLINE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "INCLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override gravitational acceleration
    #[arg(long, global = true, env = "INCLINE_GRAVITY")]
    pub gravity: Option<f64>,

    /// Override the animation frame rate
    #[arg(long, global = true, env = "INCLINE_FPS")]
    pub fps: Option<u32>,

    /// Enable verbose logging (repeat for more)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Launch balls down the selected ramps and wait for them to land
    Launch(LaunchArgs),

    /// Record a guess, launch, and compare the guess with the results
    Predict(PredictArgs),

    /// Show ramps, their render paths and kinematics
    Show(ShowArgs),

    /// Move one control point of a ramp
    SetPoint(SetPointArgs),

    /// Resize the plane along one axis
    Resize(ResizeArgs),

    /// Restore the built-in ramps and forget saved edits
    Reset,

    /// Show past runs grouped by ramp color
    History(HistoryArgs),

    /// Print the effective configuration
    Config,
}

/// Options shared by every command that launches.
#[derive(Args, Debug, Clone, Default)]
pub struct LaunchArgs {
    /// Ramp to launch; repeat for several (defaults to the first ramp)
    #[arg(long = "ramp", short = 'r', value_name = "ID")]
    pub ramps: Vec<String>,

    /// Animation pacing multiplier, lower is faster
    #[arg(long, env = "INCLINE_SPEED_FACTOR")]
    pub speed_factor: Option<f64>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `predict`.
#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Predicted time to reach the bottom, in seconds
    #[arg(long)]
    pub time: f64,

    /// Predicted terminal velocity
    #[arg(long)]
    pub velocity: f64,

    /// Claim that the first launched ramp is the quickest
    #[arg(long)]
    pub quickest: bool,

    #[command(flatten)]
    pub launch: LaunchArgs,
}

impl PredictArgs {
    /// The trajectory claim the flags express.
    pub const fn trajectory(&self) -> TrajectoryChoice {
        if self.quickest {
            TrajectoryChoice::Quickest
        } else {
            TrajectoryChoice::None
        }
    }
}

/// Arguments for `show`.
#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `set-point`.
#[derive(Args, Debug, Clone)]
pub struct SetPointArgs {
    /// Ramp id
    pub id: String,

    /// Control point: start, cp1, cp2 or end
    pub key: PointKey,

    /// Horizontal position in centimeters
    #[arg(allow_negative_numbers = true)]
    pub x: f64,

    /// Height in centimeters
    #[arg(allow_negative_numbers = true)]
    pub y: f64,
}

/// Arguments for `resize`.
#[derive(Args, Debug, Clone)]
pub struct ResizeArgs {
    /// Axis: x (width) or y (height)
    pub dimension: Dimension,

    /// New extent in centimeters
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
}

/// Arguments for `history`.
#[derive(Args, Debug, Clone, Default)]
pub struct HistoryArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,

    /// Forget all recorded runs
    #[arg(long, conflicts_with = "json")]
    pub clear: bool,
}

impl Cli {
    /// Parse command line arguments.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create CLI from iterator (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if argument parsing fails.
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Get log level based on verbosity.
    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        match self.verbose {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// The state directory, defaulting to `.incline` in the working
    /// directory.
    #[must_use]
    pub fn effective_state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".incline"))
    }
}

/// Log level for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Only show warnings and errors
    Warn,
    /// Show info messages
    Info,
    /// Show debug messages
    Debug,
    /// Show all messages including trace
    Trace,
}

impl LogLevel {
    /// The level as an `EnvFilter` directive.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
