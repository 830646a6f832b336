//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary in dry-run mode and verify outputs.

use std::path::PathBuf;
use std::process::Command;

/// Run a CLI command and return output.
fn run_cli(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_nanolytica-cli"))
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn scenario(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../scenarios")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn durations(report: &serde_json::Value) -> Vec<u64> {
    report["transmissions"]
        .as_array()
        .expect("transmissions array")
        .iter()
        .map(|t| t["measurement"]["duration_sec"].as_u64().unwrap())
        .collect()
}

#[test]
fn test_simulate_load_unload_json() {
    let (code, stdout, _) = run_cli(&[
        "simulate",
        &scenario("load_unload.toml"),
        "--dry-run",
        "--json",
    ]);
    assert_eq!(code, 0, "simulate failed");
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(durations(&report), vec![0, 12]);
    assert_eq!(
        report["config"]["endpoint"],
        "http://127.0.0.1:8080/api/analytics/collect"
    );
    assert_eq!(
        report["transmissions"][0]["measurement"]["referrer"],
        "https://news.ycombinator.com/"
    );
}

#[test]
fn test_simulate_swap_navigation() {
    let (code, stdout, _) = run_cli(&[
        "simulate",
        &scenario("swap_navigation.toml"),
        "--dry-run",
        "--json",
    ]);
    assert_eq!(code, 0, "simulate failed");
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(durations(&report), vec![0, 2, 0, 3]);
    assert_eq!(report["transmissions"][2]["measurement"]["path"], "/pricing");
}

#[test]
fn test_simulate_script_src_overrides_endpoint() {
    let (code, stdout, _) = run_cli(&[
        "simulate",
        &scenario("load_unload.toml"),
        "--script-src",
        "https://collector.example.org/n.js",
        "--dry-run",
        "--json",
    ]);
    assert_eq!(code, 0, "simulate failed");
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        report["config"]["endpoint"],
        "https://collector.example.org/api/analytics/collect"
    );
    assert_eq!(durations(&report), vec![0, 12]);
}

#[test]
fn test_simulate_do_not_track_sends_nothing() {
    let (code, stdout, _) = run_cli(&["simulate", &scenario("do_not_track.toml"), "--dry-run"]);
    assert_eq!(code, 0, "simulate failed");
    assert!(stdout.contains("Do-not-track: on"));
    assert!(stdout.contains("Transmissions: 0"));
}

#[test]
fn test_simulate_rejected_beacon_uses_fallback() {
    let (code, stdout, _) = run_cli(&[
        "simulate",
        &scenario("load_unload.toml"),
        "--dry-run",
        "--reject-beacon",
        "--json",
    ]);
    assert_eq!(code, 0, "simulate failed");
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(report["transmissions"]
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["route"] == "fallback"));
}

#[test]
fn test_config_shows_resolved_endpoint() {
    let (code, stdout, _) = run_cli(&["config", &scenario("swap_navigation.toml")]);
    assert_eq!(code, 0, "config failed");
    let out: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(out["configuration"]["do_not_track"], false);
    assert_eq!(out["swap_listener"], true);
    assert_eq!(out["options"]["content_region_id"], "main-content");
}

#[test]
fn test_missing_scenario_fails() {
    let (code, _, stderr) = run_cli(&["simulate", "/nonexistent.toml", "--dry-run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_invalid_scenario_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "name = \"bad\"\n[[steps]]\nat_ms = 10\ntype = \"explode\"\n").unwrap();
    let (code, _, stderr) = run_cli(&["config", path.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Failed to parse scenario"));
}
