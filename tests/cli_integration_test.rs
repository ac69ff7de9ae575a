//! CLI integration tests: run the agtool binary against scenario files.
//! Uses CARGO_BIN_EXE_agtool when set (e.g. by `cargo test`).

mod common;

use std::process::{Command, Output};

use allocation_graph::domain::scenario::Scenario;
use common::fixtures::{chain_scenario, link, scenario_file, two_cycle_scenario};

fn bin() -> Option<std::path::PathBuf> {
    std::env::var_os("CARGO_BIN_EXE_agtool").map(std::path::PathBuf::from)
}

fn run(args: &[&str]) -> Option<Output> {
    let Some(bin) = bin() else {
        eprintln!("Skipping CLI test: CARGO_BIN_EXE not set");
        return None;
    };
    Some(Command::new(bin).args(args).output().expect("run agtool"))
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn assert_success(out: &Output) {
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

#[test]
fn test_cli_help_succeeds() {
    let Some(out) = run(&["--help"]) else { return };
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.contains("agtool"));
    assert!(text.contains("detect"));
    assert!(text.contains("resolve"));
}

#[test]
fn test_cli_detect_reports_cycle() {
    let file = scenario_file(&two_cycle_scenario());
    let path = file.path().to_str().unwrap();
    let Some(out) = run(&["detect", path]) else { return };
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.contains("Deadlock detected"));
    assert!(text.contains("P1 -> P2 -> P1"));
    assert!(text.contains("Risk: 100%"));
}

#[test]
fn test_cli_detect_stable_graph() {
    let file = scenario_file(&chain_scenario(3));
    let path = file.path().to_str().unwrap();
    let Some(out) = run(&["detect", path]) else { return };
    assert_success(&out);
    assert!(stdout(&out).contains("Graph is stable"));
}

#[test]
fn test_cli_resolve_json() {
    let file = scenario_file(&two_cycle_scenario());
    let path = file.path().to_str().unwrap();
    let Some(out) = run(&["--json", "resolve", path, "--policy", "youngest"]) else {
        return;
    };
    assert_success(&out);
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["policy"], "youngest");
    assert_eq!(value["victims"], serde_json::json!([2]));
    assert_eq!(value["state"], "stable");
    assert_eq!(value["history"]["total"], 1);
}

#[test]
fn test_cli_resolve_text() {
    let file = scenario_file(&two_cycle_scenario());
    let path = file.path().to_str().unwrap();
    let Some(out) = run(&["resolve", path]) else { return };
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.contains("Terminated P1"));
    assert!(text.contains("Deadlock resolved"));
}

#[test]
fn test_cli_risk_and_graph() {
    let file = scenario_file(&chain_scenario(2));
    let path = file.path().to_str().unwrap();

    let Some(out) = run(&["--json", "risk", path]) else { return };
    assert_success(&out);
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    // 2 processes * 15 + 2 resources * 10
    assert_eq!(value["score"], 50);
    assert_eq!(value["level"], "elevated");

    let Some(out) = run(&["graph", path]) else { return };
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.contains("Processes (2)"));
    assert!(text.contains("R1 held by P1"));
    assert!(text.contains("P1 -> P2"));
}

#[test]
fn test_cli_missing_scenario_fails() {
    let Some(out) = run(&["detect", "nonexistent_scenario_12345.json"]) else {
        return;
    };
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Failed to read scenario file"));
}

#[test]
fn test_cli_bad_reference_fails() {
    let scenario = Scenario {
        requests: vec![link(1, 3)],
        ..chain_scenario(1)
    };
    let file = scenario_file(&scenario);
    let path = file.path().to_str().unwrap();
    let Some(out) = run(&["detect", path]) else { return };
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("out of range"), "stderr: {stderr}");
}
