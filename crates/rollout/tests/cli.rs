//! End-to-end tests for the rollout CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the rollout binary, isolated in `state`.
#[allow(deprecated)]
fn rollout(state: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rollout").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("INCLINE_CONFIG")
        .env_remove("INCLINE_GRAVITY")
        .env_remove("INCLINE_FPS")
        .env_remove("INCLINE_SPEED_FACTOR")
        .env("INCLINE_STATE_DIR", state);
    cmd
}

// =============================================================================
// Basic usage
// =============================================================================

mod basic_usage {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("launch"))
            .stdout(predicate::str::contains("set-point"))
            .stdout(predicate::str::contains("predict"));
    }

    #[test]
    fn test_missing_subcommand_fails() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path()).assert().failure();
    }

    #[test]
    fn test_show_lists_default_ramps() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .arg("show")
            .assert()
            .success()
            .stdout(predicate::str::contains("* path1 (orange)"))
            .stdout(predicate::str::contains("path4 (red)"))
            .stdout(predicate::str::contains("Plane: 1200 x 400 cm"))
            .stdout(predicate::str::contains("path M"));
    }

    #[test]
    fn test_config_prints_defaults() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("Gravity: 9.81"))
            .stdout(predicate::str::contains("FPS: 60"));
    }
}

// =============================================================================
// Launching
// =============================================================================

mod launching {
    use super::*;

    #[test]
    fn test_launch_prints_results() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .args(["launch", "--speed-factor", "0.001"])
            .assert()
            .success()
            .stdout(predicate::str::contains("path1 (orange)"))
            .stdout(predicate::str::contains("terminal velocity 82.87"));
    }

    #[test]
    fn test_launch_json_keeps_order() {
        let dir = TempDir::new().unwrap();
        let output = rollout(dir.path())
            .args([
                "launch", "-r", "path3", "-r", "path1", "--speed-factor", "0.001", "--json",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let ids: Vec<_> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        // Registry order, not flag order.
        assert_eq!(ids, vec!["path1", "path3"]);
    }

    #[test]
    fn test_launch_unknown_ramp_fails() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .args(["launch", "-r", "ghost"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown ramp 'ghost'"));
    }

    #[test]
    fn test_history_after_launch() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .args(["launch", "-r", "path2", "--speed-factor", "0.001"])
            .assert()
            .success();
        rollout(dir.path())
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("blue"))
            .stdout(predicate::str::contains("velocity 82.87"));
        rollout(dir.path())
            .args(["history", "--clear"])
            .assert()
            .success();
        rollout(dir.path())
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("No runs recorded"));
    }

    #[test]
    fn test_predict_compares() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .args([
                "predict",
                "--time",
                "1",
                "--velocity",
                "90",
                "--quickest",
                "--speed-factor",
                "0.001",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Terminal velocity: predicted 90.00, actual 82.87"))
            .stdout(predicate::str::contains("Trajectory guess: correct"));
    }
}

// =============================================================================
// Editing
// =============================================================================

mod editing {
    use super::*;

    #[test]
    fn test_set_point_is_saved() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .args(["set-point", "path2", "cp1", "150", "-20"])
            .assert()
            .success();
        assert!(dir.path().join("physics-visualizer-paths.json").exists());
        rollout(dir.path())
            .arg("show")
            .assert()
            .success()
            .stdout(predicate::str::contains("cp1   (150.0, -20.0)"));
    }

    #[test]
    fn test_set_point_unknown_ramp_fails() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .args(["set-point", "ghost", "end", "1", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown ramp"));
    }

    #[test]
    fn test_resize_is_clamped() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .args(["resize", "y", "5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("height set to 100 cm"));
    }

    #[test]
    fn test_resize_is_remembered() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .args(["resize", "x", "1000"])
            .assert()
            .success()
            .stdout(predicate::str::contains("width set to 1000 cm"));
        rollout(dir.path())
            .arg("show")
            .assert()
            .success()
            .stdout(predicate::str::contains("Plane: 1000 x 400 cm"))
            .stdout(predicate::str::contains("end   (950.0, 50.0)"));
    }

    #[test]
    fn test_reset_forgets_edits() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .args(["set-point", "path1", "end", "500", "0"])
            .assert()
            .success();
        rollout(dir.path()).arg("reset").assert().success();
        assert!(!dir.path().join("physics-visualizer-paths.json").exists());
        rollout(dir.path())
            .arg("show")
            .assert()
            .success()
            .stdout(predicate::str::contains("end   (1180.0, 50.0)"));
    }

    #[test]
    fn test_malformed_state_falls_back() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("physics-visualizer-paths.json"), "not json").unwrap();
        rollout(dir.path())
            .arg("show")
            .assert()
            .success()
            .stdout(predicate::str::contains("path1 (orange)"))
            .stderr(predicate::str::contains("using defaults"));
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_env_override() {
        let dir = TempDir::new().unwrap();
        rollout(dir.path())
            .env("INCLINE_GRAVITY", "1.62")
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("Gravity: 1.62"));
    }

    #[test]
    fn test_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("incline.toml");
        fs::write(&path, "fps = 30\n[plane]\nx = 800.0\ny = 300.0\n").unwrap();
        rollout(dir.path())
            .arg("--config")
            .arg(&path)
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("FPS: 30"))
            .stdout(predicate::str::contains("Plane: 800 x 300 cm"));
    }

    #[test]
    fn test_invalid_config_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "arc_length_segments = 3\n").unwrap();
        rollout(dir.path())
            .arg("--config")
            .arg(&path)
            .arg("show")
            .assert()
            .failure()
            .stderr(predicate::str::contains("arc_length_segments"));
    }
}
