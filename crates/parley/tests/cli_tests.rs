// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the `parley` binary end to end.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Runs the binary against an isolated config file.
fn parley(config: &str, args: &[&str]) -> Output {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("parley.toml");
    std::fs::write(&config_path, config).unwrap();

    Command::new(env!("CARGO_BIN_EXE_parley"))
        .arg("--config")
        .arg(&config_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn replay_prints_payload_and_notices() {
    let transcript = fixture("transcript.json");
    let output = parley(
        "[consent]\nnotice_policy = \"always\"\n",
        &["replay", transcript.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["model"], "gpt-4");
    assert_eq!(json["budget"], 7000);
    assert_eq!(json["messages"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["messages"][3]["content"], "User \"Alice\" said: what changed?");
    assert_eq!(json["notices"][0]["mentions"], serde_json::json!([12]));
}

#[test]
fn limit_reports_normalized_model_and_budget() {
    let output = parley("", &["limit", "openai/gpt-4-1106-preview"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "gpt-4-1106-preview 123000");
}

#[test]
fn count_uses_model_tokenizer() {
    let output = parley("", &["count", "gpt-4", ""]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0");
}

#[test]
fn invalid_config_exits_nonzero() {
    let output = parley("[context]\nbackread_limt = 5\n", &["config"]);
    assert!(!output.status.success());
}

#[test]
fn missing_transcript_exits_nonzero() {
    let output = parley("", &["replay", "/nonexistent/transcript.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read transcript"));
}
