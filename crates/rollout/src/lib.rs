#![forbid(unsafe_code)]

//! # Rollout
//!
//! Command-line front end for [`incline`]: launch balls down ramps, edit
//! the ramps, and compare guesses with the computed descents.
//!
//! Saved ramps and the run history live in a state directory
//! (`--state-dir`, `INCLINE_STATE_DIR`, default `.incline`).

pub mod app;
pub mod cli;

pub use app::{resolve_config, run};
pub use cli::{Cli, Command, LogLevel};
