#![forbid(unsafe_code)]

//! # Rollout CLI
//!
//! ## Usage
//!
//! ```bash
//! rollout show                        # Ramps, paths and kinematics
//! rollout launch -r path1 -r path2    # Race two ramps
//! rollout set-point path1 cp1 700 300 # Move a handle
//! rollout history                     # Past runs by color
//! ```

use std::io;

use rollout::{Cli, LogLevel};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: LogLevel) {
    // RUST_LOG wins over -v.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.log_level());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut stdout = io::stdout().lock();
    runtime.block_on(rollout::run(cli, &mut stdout))
}
