//! Concurrency tests for the overload binary.
//!
//! These tests verify that multiple processes can safely:
//! - Append snapshots to the same client file simultaneously (file locking)
//! - Read the store while imports are running

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use std::thread;
use tempfile::TempDir;

fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("overload"));
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("config"));
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn write_history(temp_dir: &TempDir, index: usize) -> PathBuf {
    let path = temp_dir.path().join(format!("history_{}.csv", index));
    let day = index + 1;
    fs::write(
        &path,
        format!(
            "client_id,date,exercise,set,weight,reps\n\
             gina,2026-08-{:02},Barbell Back Squat,1,{},8\n\
             gina,2026-08-{:02},Barbell Back Squat,2,{},8\n",
            day,
            80 + index * 5,
            day,
            80 + index * 5
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_concurrent_imports_append_whole_lines() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    let files: Vec<PathBuf> = (0..8).map(|i| write_history(&temp_dir, i)).collect();

    let handles: Vec<_> = files
        .into_iter()
        .map(|csv| {
            let data_dir = data_dir.clone();
            let config_home = temp_dir.path().join("config");
            thread::spawn(move || {
                Command::new(assert_cmd::cargo::cargo_bin!("overload"))
                    .env("XDG_CONFIG_HOME", config_home)
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .arg("import")
                    .arg(&csv)
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("import thread panicked");
    }

    let content = fs::read_to_string(data_dir.join("snapshots/gina.jsonl")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 8, "Expected 8 snapshots, got {}", lines.len());
    for line in lines {
        let parsed: serde_json::Value = serde_json::from_str(line).expect("line is whole JSON");
        assert_eq!(parsed["client_id"], "gina");
    }
}

#[test]
fn test_plan_uses_latest_after_concurrent_imports() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    let files: Vec<PathBuf> = (0..4).map(|i| write_history(&temp_dir, i)).collect();

    let handles: Vec<_> = files
        .into_iter()
        .rev()
        .map(|csv| {
            let data_dir = data_dir.clone();
            let config_home = temp_dir.path().join("config");
            thread::spawn(move || {
                Command::new(assert_cmd::cargo::cargo_bin!("overload"))
                    .env("XDG_CONFIG_HOME", config_home)
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .arg("import")
                    .arg(&csv)
                    .assert()
                    .success();
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("import thread panicked");
    }

    fs::write(temp_dir.path().join("catalog.json"), r#"["Barbell Back Squat"]"#).unwrap();

    let output = cli(&temp_dir)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("plan")
        .arg("--client")
        .arg("gina")
        .arg("--catalog")
        .arg(temp_dir.path().join("catalog.json"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["as_of_date"], "2026-08-04");
    assert_eq!(plan["goals"][0]["sets"][0]["weight"], 95.0);
    assert_eq!(plan["goals"][0]["sets"][0]["reps"], 10);
}
