//! Command execution.
//!
//! Every command opens a [`Workbench`] over the state directory, does its
//! work, and writes human-readable or JSON output to the given writer.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde_json::json;
use tracing::{debug, info, trace, warn};

use incline::{
    Config, Dimension, JsonFileStore, Kinematics, LaunchOutcome, PlaneDimensions, Prediction,
    PredictionReport, RampPath, RunHistory, RunResult, Workbench,
};

use crate::cli::{Cli, Command, HistoryArgs, LaunchArgs, PredictArgs, SetPointArgs, ShowArgs};

/// File name of the run history inside the state directory.
pub const HISTORY_FILE: &str = "run-history.json";

/// File name of the resized plane inside the state directory.
pub const PLANE_FILE: &str = "plane.json";

/// Resolves the effective configuration: file first, then overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the result is invalid.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(gravity) = cli.gravity {
        config.gravity = gravity;
    }
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }
    config.validate()?;
    debug!(gravity = config.gravity, fps = config.fps, "Config resolved");
    Ok(config)
}

/// Runs one parsed command.
///
/// # Errors
///
/// Returns an error for invalid configuration, unknown ramp ids, rejected
/// edits and I/O failures.
pub async fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    let state_dir = cli.effective_state_dir();
    let mut config = resolve_config(&cli)?;
    if let Some(plane) = load_plane(&state_dir) {
        config.plane = plane;
    }

    let open = || -> anyhow::Result<Workbench> {
        Ok(Workbench::open(JsonFileStore::in_dir(&state_dir), config.clone())?)
    };

    match &cli.command {
        Command::Launch(args) => launch(&mut open()?, &state_dir, args, out).await,
        Command::Predict(args) => predict(&mut open()?, &state_dir, args, out).await,
        Command::Show(args) => show(&open()?, args, out),
        Command::SetPoint(args) => set_point(&mut open()?, args, out),
        Command::Resize(args) => resize(&mut open()?, &state_dir, args.dimension, args.value, out),
        Command::Reset => reset(&mut open()?, out),
        Command::History(args) => history(&state_dir, args, out),
        Command::Config => {
            writeln!(out, "{}", config.to_diagnostic_string())?;
            Ok(())
        }
    }
}

fn apply_selection(bench: &mut Workbench, ids: &[String]) -> anyhow::Result<()> {
    let Some((first, rest)) = ids.split_first() else {
        return Ok(());
    };
    if !bench.select_only(first) {
        bail!("unknown ramp '{first}'");
    }
    for id in rest {
        if !bench.select(id) {
            bail!("unknown ramp '{id}'");
        }
    }
    Ok(())
}

/// Launches the selected ramps, records the results and returns them
/// paired with their ramps.
async fn launch_and_record(
    bench: &mut Workbench,
    state_dir: &Path,
    args: &LaunchArgs,
) -> anyhow::Result<Vec<(RampPath, RunResult)>> {
    apply_selection(bench, &args.ramps)?;
    let ramps: Vec<RampPath> = bench.registry().selected_ramps().cloned().collect();
    let speed_factor = args.speed_factor.unwrap_or(bench.config().speed_factor);

    let launch = bench.launch_selected(speed_factor)?;
    let handle = bench.scheduler().clone();
    let run = launch.run_with(|frame| {
        trace!(
            elapsed_ms = u64::try_from(frame.elapsed.as_millis()).unwrap_or(u64::MAX),
            balls = ?frame.balls.iter().map(|b| (b.point.x, b.point.y)).collect::<Vec<_>>(),
            "Frame"
        );
    });
    tokio::pin!(run);

    let outcome = tokio::select! {
        outcome = &mut run => outcome,
        Ok(()) = tokio::signal::ctrl_c() => {
            handle.cancel();
            run.as_mut().await
        }
    };

    let results = match outcome {
        LaunchOutcome::Completed(results) => results,
        LaunchOutcome::Cancelled => bail!("launch cancelled"),
    };

    let mut history = load_history(state_dir);
    history.record_batch(&ramps, &results);
    save_history(state_dir, &history)?;
    info!(ramps = results.len(), "Results recorded");

    Ok(ramps.into_iter().zip(results).collect())
}

async fn launch(
    bench: &mut Workbench,
    state_dir: &Path,
    args: &LaunchArgs,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let runs = launch_and_record(bench, state_dir, args).await?;

    if args.json {
        let value: Vec<_> = runs
            .iter()
            .map(|(ramp, result)| {
                json!({
                    "id": ramp.id,
                    "color": ramp.color,
                    "timeToAscend": result.time_to_ascend,
                    "terminalVelocity": result.terminal_velocity,
                })
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        return Ok(());
    }

    for (ramp, result) in &runs {
        writeln!(
            out,
            "{} ({}): time to ascend {:.2} s, terminal velocity {:.2}",
            ramp.id, ramp.color, result.time_to_ascend, result.terminal_velocity
        )?;
    }
    Ok(())
}

async fn predict(
    bench: &mut Workbench,
    state_dir: &Path,
    args: &PredictArgs,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let prediction = Prediction::new(Some(args.time), Some(args.velocity), args.trajectory());
    let runs = launch_and_record(bench, state_dir, &args.launch).await?;
    let (ramps, results): (Vec<RampPath>, Vec<RunResult>) = runs.into_iter().unzip();
    let report = prediction.evaluate(&ramps, &results);

    if args.launch.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }
    write_report(&report, out)?;
    Ok(())
}

fn write_report(report: &PredictionReport, out: &mut dyn Write) -> io::Result<()> {
    let rows = [("Time to ascend", report.time), ("Terminal velocity", report.velocity)];
    for (label, error) in rows {
        if let Some(e) = error {
            let relative = e
                .relative
                .map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r * 100.0));
            writeln!(
                out,
                "{label}: predicted {:.2}, actual {:.2}, off by {:.2} ({relative})",
                e.predicted, e.actual, e.absolute
            )?;
        }
    }
    if let Some(quickest) = &report.quickest {
        writeln!(out, "Quickest ramp: {quickest}")?;
    }
    match report.trajectory_correct {
        Some(true) => writeln!(out, "Trajectory guess: correct")?,
        Some(false) => writeln!(out, "Trajectory guess: wrong")?,
        None => {}
    }
    Ok(())
}

fn show(bench: &Workbench, args: &ShowArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let scene = bench.scene();
    let config = bench.config();
    let plane = bench.plane();
    let domain = scene.mapping.domain();

    let kinematics: Vec<Kinematics> = bench
        .ramps()
        .iter()
        .map(|ramp| {
            Kinematics::compute(
                ramp,
                config.gravity,
                config.speed_factor,
                config.arc_length_segments,
                config.fallback_duration_secs,
            )
        })
        .collect();

    if args.json {
        let ramps: Vec<_> = bench
            .ramps()
            .iter()
            .zip(&scene.ramps)
            .zip(&kinematics)
            .map(|((ramp, drawn), k)| {
                json!({
                    "id": ramp.id,
                    "color": ramp.color,
                    "selected": drawn.selected,
                    "points": ramp.points,
                    "svgPath": drawn.path,
                    "arcLength": k.arc_length,
                    "terminalVelocity": k.terminal_velocity,
                    "duration": k.duration,
                })
            })
            .collect();
        let value = json!({
            "plane": plane,
            "domain": domain,
            "origin": scene.mapping.origin(),
            "ramps": ramps,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        return Ok(());
    }

    writeln!(out, "Plane: {} x {} cm (view {} x {})", plane.x, plane.y, domain.x, domain.y)?;
    for ((ramp, drawn), k) in bench.ramps().iter().zip(&scene.ramps).zip(&kinematics) {
        let marker = if drawn.selected { '*' } else { ' ' };
        writeln!(out, "{marker} {} ({})", ramp.id, ramp.color)?;
        for (key, point) in incline::PointKey::ALL.iter().zip(ramp.points.iter()) {
            writeln!(out, "    {key:<5} ({:.1}, {:.1})", point.x, point.y)?;
        }
        writeln!(
            out,
            "    length {:.1} cm, terminal velocity {:.2}, duration {:.2} s",
            k.arc_length, k.terminal_velocity, k.duration
        )?;
        writeln!(out, "    path {}", drawn.path)?;
    }
    Ok(())
}

fn set_point(bench: &mut Workbench, args: &SetPointArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    if bench.registry().get(&args.id).is_none() {
        bail!("unknown ramp '{}'", args.id);
    }
    bench.enter_edit_mode()?;
    bench.move_control_point(&args.id, args.key, incline::Point::new(args.x, args.y))?;
    bench.exit_edit_mode()?;
    writeln!(out, "{} {} -> ({}, {})", args.id, args.key, args.x, args.y)?;
    Ok(())
}

fn resize(
    bench: &mut Workbench,
    state_dir: &Path,
    dimension: Dimension,
    value: f64,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    bench.enter_edit_mode()?;
    let applied = bench.resize_plane(dimension, value)?;
    bench.exit_edit_mode()?;
    save_plane(state_dir, bench.plane())?;
    let axis = match dimension {
        Dimension::X => "width",
        Dimension::Y => "height",
    };
    writeln!(out, "Plane {axis} set to {applied} cm")?;
    Ok(())
}

fn reset(bench: &mut Workbench, out: &mut dyn Write) -> anyhow::Result<()> {
    bench.reset_to_defaults()?;
    writeln!(out, "Ramps reset to defaults")?;
    Ok(())
}

fn history(state_dir: &Path, args: &HistoryArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    if args.clear {
        let path = history_path(state_dir);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("removing {}", path.display())),
        }
        writeln!(out, "Run history cleared")?;
        return Ok(());
    }

    let history = load_history(state_dir);
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(history.records())?)?;
        return Ok(());
    }
    if history.is_empty() {
        writeln!(out, "No runs recorded")?;
        return Ok(());
    }
    for (color, runs) in history.group_by_color() {
        writeln!(out, "{color}")?;
        for run in runs {
            writeln!(
                out,
                "  #{:<4} {}  time {} s  velocity {}",
                run.id,
                run.date.format("%Y-%m-%d %H:%M:%S"),
                run.time_to_ascend,
                run.terminal_velocity
            )?;
        }
    }
    Ok(())
}

/// Loads a plane saved by `resize`. Unusable files are ignored.
fn load_plane(state_dir: &Path) -> Option<PlaneDimensions> {
    let path = state_dir.join(PLANE_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Could not read plane");
            return None;
        }
    };
    match serde_json::from_str::<PlaneDimensions>(&text) {
        Ok(plane) if plane.x.is_finite() && plane.y.is_finite() && plane.x > 0.0 && plane.y > 0.0 => {
            debug!(x = plane.x, y = plane.y, "Loaded saved plane");
            Some(plane)
        }
        Ok(_) => {
            warn!(path = %path.display(), "Saved plane is not positive, using config");
            None
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Malformed plane, using config");
            None
        }
    }
}

fn save_plane(state_dir: &Path, plane: PlaneDimensions) -> anyhow::Result<()> {
    fs::create_dir_all(state_dir)
        .with_context(|| format!("creating state directory {}", state_dir.display()))?;
    let path = state_dir.join(PLANE_FILE);
    fs::write(&path, serde_json::to_string_pretty(&plane)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn history_path(state_dir: &Path) -> PathBuf {
    state_dir.join(HISTORY_FILE)
}

/// Loads the run history; missing or malformed files give an empty one.
fn load_history(state_dir: &Path) -> RunHistory {
    let path = history_path(state_dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return RunHistory::new(),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Could not read run history");
            return RunHistory::new();
        }
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(error = %e, path = %path.display(), "Malformed run history, starting fresh");
        RunHistory::new()
    })
}

fn save_history(state_dir: &Path, history: &RunHistory) -> anyhow::Result<()> {
    fs::create_dir_all(state_dir)
        .with_context(|| format!("creating state directory {}", state_dir.display()))?;
    let path = history_path(state_dir);
    fs::write(&path, serde_json::to_string_pretty(history)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(state: &Path, args: &[&str]) -> Cli {
        let mut argv = vec!["rollout", "--state-dir", state.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    async fn output(cli: Cli) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        run(cli, &mut buf).await?;
        Ok(String::from_utf8(buf).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn launch_prints_results_and_records_history() {
        let dir = tempfile::tempdir().unwrap();
        let text = output(cli(dir.path(), &["launch", "-r", "path1", "-r", "path2"]))
            .await
            .unwrap();
        assert!(text.contains("path1 (orange)"));
        assert!(text.contains("terminal velocity 82.87"));
        assert!(text.contains("path2 (blue)"));

        let history = load_history(dir.path());
        assert_eq!(history.len(), 2);
        assert_eq!(history.records()[0].terminal_velocity, "82.87");
    }

    #[tokio::test(start_paused = true)]
    async fn launch_rejects_unknown_ramp() {
        let dir = tempfile::tempdir().unwrap();
        let err = output(cli(dir.path(), &["launch", "-r", "nope"])).await.unwrap_err();
        assert!(err.to_string().contains("unknown ramp 'nope'"));
    }

    #[tokio::test(start_paused = true)]
    async fn predict_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let text = output(cli(
            dir.path(),
            &["predict", "--time", "1", "--velocity", "80", "--quickest"],
        ))
        .await
        .unwrap();
        assert!(text.contains("Terminal velocity: predicted 80.00, actual 82.87"));
        assert!(text.contains("Quickest ramp: path1"));
        assert!(text.contains("Trajectory guess: correct"));
    }

    #[tokio::test]
    async fn set_point_persists() {
        let dir = tempfile::tempdir().unwrap();
        output(cli(dir.path(), &["set-point", "path3", "cp2", "10", "-5"]))
            .await
            .unwrap();
        let text = output(cli(dir.path(), &["show", "--json"])).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let cp2 = &value["ramps"][2]["points"]["cp2"];
        assert_eq!(cp2["x"], 10.0);
        assert_eq!(cp2["y"], -5.0);
        // The view reaches below zero so the dipping handle stays visible.
        assert_eq!(value["origin"]["y"], -25.0);
    }

    #[tokio::test]
    async fn resize_moves_ends() {
        let dir = tempfile::tempdir().unwrap();
        let text = output(cli(dir.path(), &["resize", "x", "1000"])).await.unwrap();
        assert!(text.contains("width set to 1000 cm"));
        let text = output(cli(dir.path(), &["show", "--json"])).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        for ramp in value["ramps"].as_array().unwrap() {
            assert_eq!(ramp["points"]["end"]["x"], 950.0);
        }
        assert_eq!(value["plane"]["x"], 1000.0);

        let text = output(cli(dir.path(), &["show"])).await.unwrap();
        assert!(text.contains("Plane: 1000 x 400 cm"));
    }

    #[tokio::test]
    async fn malformed_plane_falls_back_to_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PLANE_FILE), "{\"x\": -3, \"y\": 400}").unwrap();
        let text = output(cli(dir.path(), &["config"])).await.unwrap();
        assert!(text.contains("Plane: 1200 x 400 cm"));
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let dir = tempfile::tempdir().unwrap();
        output(cli(dir.path(), &["set-point", "path1", "start", "0", "0"]))
            .await
            .unwrap();
        output(cli(dir.path(), &["reset"])).await.unwrap();
        let text = output(cli(dir.path(), &["show", "--json"])).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["ramps"][0]["points"]["start"]["y"], 400.0);
    }

    #[tokio::test]
    async fn malformed_history_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HISTORY_FILE), "{oops").unwrap();
        let text = output(cli(dir.path(), &["history"])).await.unwrap();
        assert!(text.contains("No runs recorded"));
    }

    #[tokio::test]
    async fn invalid_override_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = output(cli(dir.path(), &["--fps", "0", "show"])).await.unwrap_err();
        assert!(err.to_string().contains("fps"));
    }
}
