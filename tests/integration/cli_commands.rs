#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn cli(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("rlestore");
    cmd.env_remove("RLESTORE_LOG")
        .env_remove("RLESTORE_CONFIG")
        .arg("--config")
        .arg(dir.join("cli.toml"));
    cmd
}

fn build_store(dir: &TempDir, input: &str, typed: bool) -> PathBuf {
    let out = dir.path().join("col.rle");
    let mut cmd = cli(dir.path());
    cmd.arg("build").arg(&out);
    if typed {
        cmd.arg("--typed");
    }
    cmd.write_stdin(input).assert().success();
    out
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("utf8 stdout")
}

#[test]
fn build_reports_counts_as_json() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("lines.txt");
    fs::write(&input, "a\na\nb\nb\na\n").expect("write input");
    let out = dir.path().join("col.rle");

    let stdout = stdout_of(
        cli(dir.path())
            .args(["--format", "json", "build"])
            .arg(&out)
            .arg("--input")
            .arg(&input),
    );
    let json: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["rows"], 5);
    assert_eq!(json["runs"], 3);
    assert!(out.exists());
}

#[test]
fn inspect_prints_stats() {
    let dir = TempDir::new().expect("tempdir");
    let path = build_store(&dir, "x\nx\nx\ny\n", false);

    let stdout = stdout_of(cli(dir.path()).args(["--format", "json", "inspect"]).arg(&path));
    let json: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(json["rows"], 4);
    assert_eq!(json["runs"], 2);
    assert_eq!(json["compression_ratio"], 2.0);

    let text = stdout_of(cli(dir.path()).arg("inspect").arg(&path));
    assert!(text.contains("rows: 4"), "{text}");
    assert!(text.contains("runs: 2"), "{text}");
}

#[test]
fn inspect_missing_file_fails() {
    let dir = TempDir::new().expect("tempdir");
    let output = cli(dir.path())
        .arg("inspect")
        .arg(dir.path().join("absent.rle"))
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("not found"), "{stderr}");
}

#[test]
fn inspect_invalid_file_fails() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("bad.rle");
    fs::write(&path, b"Invalid Data").expect("write file");
    let output = cli(dir.path())
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("RLEARRAY"), "{stderr}");
}

#[test]
fn dump_text_and_json_lines() {
    let dir = TempDir::new().expect("tempdir");
    let path = build_store(&dir, "1\n1\ntrue\n\n2.5\n", true);

    let text = stdout_of(cli(dir.path()).arg("dump").arg(&path));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["0\t1", "1\t1", "2\ttrue", "3\tnull", "4\t2.5"]);

    let json = stdout_of(
        cli(dir.path())
            .args(["--format", "json", "dump"])
            .arg(&path)
            .args(["--start", "1", "--limit", "3"]),
    );
    let rows: Vec<Value> = json
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(
        rows,
        vec![
            serde_json::json!({"row": 1, "value": 1}),
            serde_json::json!({"row": 2, "value": true}),
            serde_json::json!({"row": 3, "value": null}),
        ]
    );
}

#[test]
fn runs_lists_each_run() {
    let dir = TempDir::new().expect("tempdir");
    let path = build_store(&dir, "a\na\nb\nc\nc\nc\n", false);

    let text = stdout_of(cli(dir.path()).arg("runs").arg(&path));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["0\t2\t\"a\"", "2\t1\t\"b\"", "3\t3\t\"c\""]);

    let json = stdout_of(cli(dir.path()).args(["--format", "json", "runs"]).arg(&path));
    let first: Value = serde_json::from_str(json.lines().next().expect("one run"))
        .expect("json line");
    assert_eq!(first["start"], 0);
    assert_eq!(first["length"], 2);
    assert_eq!(first["value"], "a");
}

#[test]
fn config_decode_limits_are_applied() {
    let dir = TempDir::new().expect("tempdir");
    let path = build_store(&dir, &format!("{}\n", "z".repeat(64)), false);
    fs::write(dir.path().join("cli.toml"), "[decode]\nmax_len = 8\n").expect("write config");

    let output = cli(dir.path())
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("exceeds limit"), "{stderr}");
}

#[test]
fn runs_and_dump_render_values_alike() {
    let dir = TempDir::new().expect("tempdir");
    let path = build_store(&dir, "a\u{1}b\na\u{1}b\n", false);

    let dump = stdout_of(cli(dir.path()).arg("dump").arg(&path));
    let dumped: Vec<&str> = dump
        .lines()
        .map(|line| line.rsplit('\t').next().expect("value column"))
        .collect();
    assert_eq!(dumped, vec!["\"a\\u{1}b\"", "\"a\\u{1}b\""]);

    let runs = stdout_of(cli(dir.path()).arg("runs").arg(&path));
    assert_eq!(runs.lines().collect::<Vec<_>>(), vec!["0\t2\t\"a\\u{1}b\""]);
}
