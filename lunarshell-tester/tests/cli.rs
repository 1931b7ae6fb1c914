use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "lunarshell-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_lunarshell-tester");
    let output_path = temp_path("json");
    let output = Command::new(exe)
        .args([
            "--seeds", "1,2", "--minutes", "2", "--policy", "greedy,fighter", "--report", "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Lunar Shell Exploration Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report["records"].as_array().map(Vec::len), Some(4));
    assert_eq!(report["aggregates"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["aggregates"][0]["strategy"], "greedy");
}

#[test]
fn cli_writes_markdown_report() {
    let exe = env!("CARGO_BIN_EXE_lunarshell-tester");
    let output_path = temp_path("markdown");
    let status = Command::new(exe)
        .args(["--minutes", "1", "--policy", "all", "--report", "markdown", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("# Lunar Shell Exploration Simulation"));
    assert!(content.contains("| Random |"));
}

#[test]
fn cli_rejects_invalid_settings_file() {
    let exe = env!("CARGO_BIN_EXE_lunarshell-tester");
    let settings_path = temp_path("settings.json");
    std::fs::write(
        &settings_path,
        r#"{"min_event_interval_secs": 9.0, "max_event_interval_secs": 2.0}"#,
    )
    .expect("write settings");
    let output = Command::new(exe)
        .args(["--minutes", "1", "--settings"])
        .arg(&settings_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid settings"));
}

#[test]
fn cli_save_dir_persists_storage_keys() {
    let exe = env!("CARGO_BIN_EXE_lunarshell-tester");
    let save_dir = temp_path("saves");
    let status = Command::new(exe)
        .args(["--seeds", "7", "--minutes", "1", "--policy", "greedy", "--save-dir"])
        .arg(&save_dir)
        .status()
        .expect("run cli");
    assert!(status.success());

    let run_dir = save_dir.join("greedy-seed-7");
    let history = std::fs::read_to_string(run_dir.join("exploration.log.json")).expect("history");
    let history: serde_json::Value = serde_json::from_str(&history).expect("history json");
    assert!(!history["entries"].as_array().expect("entries").is_empty());

    let state = std::fs::read_to_string(run_dir.join("exploration.state.json")).expect("run state");
    let state: serde_json::Value = serde_json::from_str(&state).expect("state json");
    assert_eq!(state["isExploring"], false);
    assert!(run_dir.join("player.state.json").exists());
}

#[test]
fn cli_offline_run_succeeds() {
    let exe = env!("CARGO_BIN_EXE_lunarshell-tester");
    let output_path = temp_path("offline");
    let status = Command::new(exe)
        .args(["--minutes", "1", "--offline", "--report", "json", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report["records"][0]["choices_resolved"], 0);
}
