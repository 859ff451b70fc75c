use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const CONFIG: &str = r#"
profile:
  window_days: 5
  interval_minutes: 5
ingest:
  instruments: ["000001.SH"]
"#;

/// Canonical 5-minute bar ends for the two sessions.
fn slot_times() -> Vec<String> {
    let mut out = Vec::new();
    for (open, close) in [(9 * 60 + 30, 11 * 60 + 30), (13 * 60, 15 * 60)] {
        let mut m = open + 5;
        while m <= close {
            out.push(format!("{:02}{:02}00", m / 60, m % 60));
            m += 5;
        }
    }
    out
}

/// `(day label, bars, display value)` rows for one instrument.
fn history_csv(days: &[(&str, usize, f64)]) -> String {
    let mut csv = String::from("instrument,timestamp,amount\n");
    for (day, bars, display) in days {
        for hms in slot_times().iter().take(*bars) {
            writeln!(csv, "000001.SH,{}{},{}", day, hms, display * 1e8).unwrap();
        }
    }
    csv
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, body).unwrap();
    p
}

fn ivp() -> Command {
    Command::cargo_bin("ivp").unwrap()
}

#[test]
fn scenario_cli_profile_prints_aggregate_json() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write(dir.path(), "base.yaml", CONFIG);
    let csv = write(
        dir.path(),
        "history.csv",
        &history_csv(&[
            ("20250102", 48, 10.0),
            ("20250103", 48, 20.0),
            ("20250106", 48, 30.0),
            ("20250107", 48, 40.0),
            ("20250108", 48, 50.0),
        ]),
    );

    let out = ivp()
        .args(["profile", "--config"])
        .arg(&cfg)
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["days"].as_array().unwrap().len(), 5);
    assert_eq!(v["days"][4], "20250108");
    let rows = v["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 48);
    assert_eq!(rows[0]["slot"], "09:35");
    assert_eq!(rows[0]["average"], 30.0);
    assert_eq!(rows[0]["max"], 50.0);
    assert_eq!(rows[0]["min"], 10.0);
    assert_eq!(rows[47]["slot"], "15:00");
}

#[test]
fn scenario_cli_profile_excludes_incomplete_day() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write(dir.path(), "base.yaml", CONFIG);
    let csv = write(
        dir.path(),
        "history.csv",
        &history_csv(&[
            ("20250102", 48, 10.0),
            ("20250103", 48, 20.0),
            ("20250106", 47, 30.0),
            ("20250107", 48, 40.0),
            ("20250108", 48, 50.0),
        ]),
    );

    ivp()
        .args(["profile", "--config"])
        .arg(&cfg)
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("window_ready=false held=4 required=5"))
        .stderr(predicate::str::contains("excluding incomplete day"));
}

#[test]
fn scenario_cli_profile_excludes_day_with_one_short_instrument() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write(
        dir.path(),
        "base.yaml",
        "profile:\n  window_days: 2\ningest:\n  instruments: [\"000001.SH\", \"399001.SZ\"]\n",
    );
    let sh = history_csv(&[("20250102", 48, 1.0), ("20250103", 48, 1.0)]);
    let sz = history_csv(&[("20250102", 48, 1.0), ("20250103", 40, 1.0)])
        .replace("000001.SH", "399001.SZ");
    let body = format!("{}{}", sh, sz.trim_start_matches("instrument,timestamp,amount\n"));
    let csv = write(dir.path(), "history.csv", &body);

    ivp()
        .args(["profile", "--config"])
        .arg(&cfg)
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("window_ready=false held=1 required=2"))
        .stderr(predicate::str::contains("excluding incomplete day"));
}

#[test]
fn scenario_cli_live_hides_slots_after_now() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write(dir.path(), "base.yaml", CONFIG);
    let csv = write(dir.path(), "today.csv", &history_csv(&[("20250109", 12, 2.0)]));

    let out = ivp()
        .args(["live", "--config"])
        .arg(&cfg)
        .arg("--csv")
        .arg(&csv)
        .args(["--day", "20250109", "--now", "10:00:01"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["day"], "20250109");
    let rows = v["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[5]["slot"], "10:00");
    assert_eq!(rows[5]["total"], 2.0);
    assert_eq!(rows[5]["instruments"]["000001.SH"], 2.0);
}

#[test]
fn scenario_cli_live_rejects_bad_day() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write(dir.path(), "base.yaml", CONFIG);
    let csv = write(dir.path(), "today.csv", &history_csv(&[("20250109", 1, 2.0)]));

    ivp()
        .args(["live", "--config"])
        .arg(&cfg)
        .arg("--csv")
        .arg(&csv)
        .args(["--day", "2025-01-09", "--now", "10:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --day"));
}
