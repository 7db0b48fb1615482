//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::Command;

use serde_json::json;

use portguide::cassette::recorder::CassetteRecorder;

fn run_portguide(args: &[&str], envs: &[(&str, &Path)]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_portguide");
    Command::new(bin)
        .args(args)
        .envs(envs.iter().map(|(k, v)| (*k, v.as_os_str())))
        .env_remove("PORTGUIDE_RECORD")
        .output()
        .expect("failed to run portguide binary")
}

#[test]
fn help_lists_subcommands() {
    let output = run_portguide(&["--help"], &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("migrate"));
    assert!(stdout.contains("serve"));
}

#[test]
fn migrate_help_shows_options() {
    let output = run_portguide(&["migrate", "--help"], &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    for flag in ["--owner", "--repo", "--from", "--to", "--out", "--chunk-size", "--granularity"] {
        assert!(stdout.contains(flag), "missing {flag} in help");
    }
}

#[test]
fn migrate_without_args_shows_error() {
    let output = run_portguide(&["migrate"], &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("--owner"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_portguide(&["nonsense"], &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}

fn write_cassette(path: &Path, listing: serde_json::Value) {
    let mut recorder = CassetteRecorder::new(path, "cli-test");
    recorder.record(
        "repo",
        "list_dir",
        json!({"owner": "acme", "repo": "shop", "path": ""}),
        listing,
    );
    recorder.record(
        "repo",
        "fetch_raw",
        json!({"locator": "https://raw.example/main.py"}),
        json!({"ok": "import os\nprint(os.getcwd())\n"}),
    );
    recorder.record(
        "llm",
        "complete",
        serde_json::Value::Null,
        json!({"ok": {"text": "Use std::env::current_dir.", "prompt_tokens": 9, "completion_tokens": 4}}),
    );
    recorder.finish().expect("cassette should be written");
}

#[test]
fn replayed_migrate_writes_guide() {
    let dir = std::env::temp_dir().join("portguide_cli_replay_test");
    std::fs::create_dir_all(&dir).unwrap();
    let cassette = dir.join("run.cassette.yaml");
    let out = dir.join("guide.md");
    write_cassette(
        &cassette,
        json!({"ok": [{
            "name": "main.py",
            "path": "main.py",
            "kind": "file",
            "content": "https://raw.example/main.py",
        }]}),
    );

    let out_arg = out.to_str().unwrap();
    let output = run_portguide(
        &[
            "migrate", "--owner", "acme", "--repo", "shop", "--from", "Python", "--to", "Rust",
            "--out", out_arg,
        ],
        &[("PORTGUIDE_REPLAY", cassette.as_path())],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("guide.md"));

    let guide = std::fs::read_to_string(&out).unwrap();
    assert!(guide.starts_with("# Migration Guide"));
    assert!(guide.contains("## 1. main.py"));
    assert!(guide.contains("- `os`"));
    assert!(guide.contains("Use std::env::current_dir."));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replayed_empty_repository_fails_with_not_found() {
    let dir = std::env::temp_dir().join("portguide_cli_replay_empty_test");
    std::fs::create_dir_all(&dir).unwrap();
    let cassette = dir.join("empty.cassette.yaml");
    write_cassette(&cassette, json!({"ok": []}));

    let output = run_portguide(
        &["migrate", "--owner", "acme", "--repo", "shop", "--from", "Python", "--to", "Rust"],
        &[("PORTGUIDE_REPLAY", cassette.as_path())],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("404 no_files_found"), "stderr: {stderr}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = run_portguide(&["--version"], &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
