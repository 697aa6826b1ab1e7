use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_json(path: &Path, value: serde_json::Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
}

fn result(test: &str, name: &str, version: &str) -> serde_json::Value {
    json!({
        "test": test,
        "result": {
            "parsed": {
                "client": {"name": name, "version": version, "isBot": null}
            }
        },
        "parse_time": 0.2,
        "init_time": 4.0,
        "memory_used": 2048,
        "version": "1.0.0"
    })
}

/// One run, one suite, two parsers; returns the workspace and config path.
fn fixture() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write_json(
        &root.join("corpus/browscap.json"),
        json!({
            "tests": {
                "chrome-55": {"client": {"name": "Chrome", "version": "55.0", "isBot": null}}
            },
            "version": "6001"
        }),
    );
    let suite = root.join("results/2024-05-01/browscap");
    write_json(&suite.join("p1/chrome-55.json"), result("chrome-55", "Chrome", "55.0.2883"));
    write_json(&suite.join("p2/chrome-55.json"), result("chrome-55", "chrome", "54"));
    write_json(
        &root.join("results/2024-04-01/browscap/p1/chrome-55.json"),
        result("chrome-55", "Chrome", "55.0"),
    );

    let config = root.join("config.toml");
    fs::write(
        &config,
        format!(
            "results_dir = {:?}\ncorpus_dir = {:?}\n",
            root.join("results").display().to_string(),
            root.join("corpus").display().to_string()
        ),
    )
    .unwrap();
    (dir, config)
}

fn uabench(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("uabench").unwrap();
    cmd.env("NO_COLOR", "1").arg("--config").arg(config);
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("uabench").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Benchmark user-agent parsers"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("uabench").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("uabench"));
}

#[test]
fn test_completions_bash() {
    let mut cmd = Command::cargo_bin("uabench").unwrap();
    cmd.args(["completions", "bash"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("_uabench"))
        .stdout(predicate::str::contains("complete"));
}

#[test]
fn test_runs_lists_latest() {
    let (_dir, config) = fixture();
    uabench(&config)
        .arg("runs")
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-04-01"))
        .stdout(predicate::str::is_match("2024-05-01\\s+1\\s+latest").unwrap());
}

#[test]
fn test_relative_config_resolves_against_working_dir() {
    let (dir, _config) = fixture();
    let home = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("uabench").unwrap();
    cmd.env("NO_COLOR", "1")
        .env("HOME", home.path())
        .current_dir(dir.path().join("corpus"))
        .args(["--config", "../config.toml", "runs"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2024-05-01"));
}

#[test]
fn test_analyze_scores_against_corpus() {
    let (_dir, config) = fixture();
    uabench(&config)
        .arg("analyze")
        .assert()
        .success()
        .stdout(predicate::str::contains("Suite browscap (6001)"))
        .stdout(predicate::str::contains("100.00%"))
        .stdout(predicate::str::contains("50.00%"))
        .stdout(predicate::str::contains("Grand total").not());
}

#[test]
fn test_analyze_diff_and_json_export() {
    let (dir, config) = fixture();
    let out = dir.path().join("report.json");
    uabench(&config)
        .args(["analyze", "--run", "2024-05-01", "--diff", "--json"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("client.version: - 55.0 + 54"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["run"], "2024-05-01");
    let parsers = report["suites"][0]["parsers"].as_array().unwrap();
    assert_eq!(parsers.len(), 2);
    assert_eq!(parsers[1]["parser"], "p2");
    assert_eq!(parsers[1]["failures"][0]["test"], "chrome-55");
}

#[test]
fn test_analyze_comparison_only() {
    let (_dir, config) = fixture();
    uabench(&config)
        .args(["analyze", "--comparison-only", "--reference", "p1", "--details"])
        .assert()
        .success()
        .stdout(predicate::str::contains("against p1"))
        .stdout(predicate::str::contains("client.version"));
}

#[test]
fn test_analyze_unknown_run_fails() {
    let (_dir, config) = fixture();
    uabench(&config)
        .args(["analyze", "--run", "1999-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_normalize_command() {
    let (_dir, config) = fixture();
    uabench(&config)
        .args(["normalize", "platform", "name", "Windows", "--version", "6.1.7601"])
        .assert()
        .success()
        .stdout(predicate::str::diff("windows6.1\n"));
}
