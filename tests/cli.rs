use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

fn ign_extract(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ign-extract").unwrap();
    cmd.current_dir(cwd).env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, json: &str) -> String {
    let path = dir.join("config.ign");
    fs::write(&path, json).unwrap();
    path.display().to_string()
}

fn single_file_config(overwrite: bool, source: &str) -> String {
    format!(
        r#"{{
            "ignition": {{"version": "3.4.0"}},
            "storage": {{"files": [
                {{"path": "etc/hosts", "overwrite": {}, "contents": {{"source": "{}"}}}}
            ]}}
        }}"#,
        overwrite, source
    )
}

fn files_under(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

#[test]
fn writes_declared_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), &single_file_config(true, "data:,hello"));
    let output = temp_dir.path().join("out");
    fs::create_dir(&output).unwrap();

    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("etc/hosts"));

    assert_eq!(fs::read(output.join("etc/hosts")).unwrap(), b"hello");
    assert_eq!(files_under(&output), vec!["etc/hosts"]);
}

#[test]
fn skips_non_overwrite_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), &single_file_config(false, "data:,hello"));
    let output = temp_dir.path().join("out");

    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipping non-overwrite file: etc/hosts"))
        .stdout(predicate::str::contains("output dir not found, creating dir at:"));

    assert!(output.is_dir());
    assert!(files_under(&output).is_empty());
}

#[test]
fn refuses_non_empty_output_directory() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out");
    fs::create_dir(&output).unwrap();
    fs::write(output.join("stale"), "stale").unwrap();

    // The config does not exist; the run must stop before trying to read it.
    let missing_config = temp_dir.path().join("missing.ign");

    ign_extract(temp_dir.path())
        .args([
            "-output",
            output.to_str().unwrap(),
            missing_config.to_str().unwrap(),
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("output dir not empty"))
        .stderr(predicate::str::contains("couldn't read config").not());

    assert_eq!(files_under(&output), vec!["stale"]);
}

#[test]
fn malformed_config_leaves_fresh_output_empty() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "{\"ignition\": ");
    let output = temp_dir.path().join("out");

    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), &config])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("couldn't parse config"));

    assert!(output.is_dir());
    assert!(files_under(&output).is_empty());
}

#[test]
fn zero_entries_is_a_successful_noop() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), r#"{"ignition": {"version": "3.4.0"}}"#);
    let output = temp_dir.path().join("out");

    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), &config])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    assert!(files_under(&output).is_empty());
}

#[test]
fn partial_failure_keeps_exit_zero_unless_strict() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        temp_dir.path(),
        r#"{
            "ignition": {"version": "3.4.0"},
            "storage": {"files": [
                {"path": "a", "overwrite": true, "contents": {"source": "data:,first"}},
                {"path": "b", "overwrite": true, "contents": {"source": "s3://bucket/key"}},
                {"path": "c", "overwrite": true, "contents": {"source": "data:,third"}}
            ]}
        }"#,
    );

    let output = temp_dir.path().join("lenient");
    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), &config])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("cannot write file"));
    assert_eq!(files_under(&output), vec!["a", "b", "c"]);
    assert_eq!(fs::read(output.join("c")).unwrap(), b"third");

    let output = temp_dir.path().join("strict");
    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), "-strict", &config])
        .assert()
        .code(2);
    assert_eq!(fs::read(output.join("a")).unwrap(), b"first");
}

#[test]
fn strict_can_come_from_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("ign-extract.toml"), "[extract]\nstrict = true\n").unwrap();
    let config = write_config(temp_dir.path(), &single_file_config(true, "s3://bucket/key"));
    let output = temp_dir.path().join("out");

    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), &config])
        .assert()
        .code(2);
}

#[test]
fn reads_config_from_stdin() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out");

    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), "-"])
        .write_stdin(single_file_config(true, "data:;base64,aGk="))
        .assert()
        .success();

    assert_eq!(fs::read(output.join("etc/hosts")).unwrap(), b"hi");
}

#[test]
fn version_ignores_other_arguments() {
    let temp_dir = TempDir::new().unwrap();

    ign_extract(temp_dir.path())
        .arg("-version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ign-extract "));

    ign_extract(temp_dir.path())
        .args(["-format=bogus", "a", "b", "-version"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn boolean_flags_accept_explicit_values() {
    let temp_dir = TempDir::new().unwrap();

    ign_extract(temp_dir.path())
        .arg("-version=true")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ign-extract "));

    let config = write_config(temp_dir.path(), &single_file_config(true, "s3://bucket/key"));

    let output = temp_dir.path().join("strict");
    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), "-strict=true", &config])
        .assert()
        .code(2);

    let output = temp_dir.path().join("lenient");
    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), "-strict=false", &config])
        .assert()
        .code(0);
}

#[test]
fn wrong_argument_count_prints_usage() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out");

    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage:"));

    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), "a.ign", "b.ign"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage:"));

    assert!(!output.exists());
}

#[test]
fn missing_output_flag_is_a_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), &single_file_config(true, "data:,hello"));

    ign_extract(temp_dir.path())
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("-output is required"));
}

#[test]
fn second_run_into_same_directory_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), &single_file_config(true, "data:,hello"));
    let output = temp_dir.path().join("out");

    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), &config])
        .assert()
        .success();

    ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), &config])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("output dir not empty"));
}

#[test]
fn json_format_emits_summary_object() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), &single_file_config(true, "data:,hello"));
    let output = temp_dir.path().join("out");

    let assert = ign_extract(temp_dir.path())
        .args(["-output", output.to_str().unwrap(), "-format", "json", &config])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let last: serde_json::Value =
        serde_json::from_str(stdout.lines().last().unwrap()).unwrap();
    assert_eq!(last["type"], "summary");
    assert_eq!(last["written"], 1);
    assert_eq!(last["bytes_written"], 5);
}
