//! Headless runs of the askdb binary against the in-memory music store.

use std::io::Write;
use std::process::{Command, Stdio};

/// Runs askdb with the given arguments and no user config.
fn run_askdb(args: &[&str], stdin: Option<&str>) -> (i32, String, String) {
    let config_dir = tempfile::tempdir().unwrap();
    let config_path = config_dir.path().join("config.toml");

    let mut child = Command::new(env!("CARGO_BIN_EXE_askdb"))
        .arg("--config")
        .arg(&config_path)
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("ASKDB_PASSWORD")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute askdb");

    if let Some(input) = stdin {
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
    } else {
        drop(child.stdin.take());
    }

    let output = child.wait_with_output().unwrap();
    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}

#[test]
fn test_headless_text_transcript() {
    let (code, stdout, _) = run_askdb(
        &[
            "--headless",
            "--mock-db",
            "--llm",
            "mock",
            "-q",
            "how many albums we have in database",
        ],
        None,
    );

    assert_eq!(code, 0);
    assert_eq!(
        stdout,
        "> how many albums we have in database\nSQL: SELECT COUNT(*) FROM album\nResult: [(347,)]\nThe query returned [(347,)].\n\n"
    );
}

#[test]
fn test_headless_json_transcript() {
    let (code, stdout, _) = run_askdb(
        &[
            "--headless",
            "--mock-db",
            "--llm",
            "mock",
            "-q",
            "how many customers?",
            "-q",
            "how many artists?",
            "--output",
            "json",
        ],
        None,
    );

    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["connection"], "music_store");
    assert_eq!(json["entries"][0]["result"], "[(59,)]");
    assert_eq!(json["entries"][1]["sql"], "SELECT COUNT(*) FROM artist");
}

#[test]
fn test_headless_without_database_advises_connect() {
    let (code, stdout, _) = run_askdb(
        &["--headless", "--llm", "mock", "-q", "how many albums?"],
        None,
    );

    assert_eq!(code, 0);
    assert!(stdout.contains("Please connect database first."));
}

#[test]
fn test_headless_script_from_stdin() {
    let script = "# albums first\nhow many albums?\n\nhow many customers?\n";
    let (code, stdout, _) = run_askdb(
        &["--headless", "--mock-db", "--llm", "mock", "--script", "-"],
        Some(script),
    );

    assert_eq!(code, 0);
    assert!(stdout.contains("> how many albums?\n"));
    assert!(stdout.contains("> how many customers?\n"));
    assert!(!stdout.contains("albums first"));
}

#[test]
fn test_headless_requires_questions() {
    let (code, _, stderr) = run_askdb(&["--headless", "--mock-db"], None);

    assert_eq!(code, 1);
    assert!(stderr.contains("--headless requires --question or --script"));
}

#[test]
fn test_headless_failed_connect_exits_nonzero() {
    let (code, _, stderr) = run_askdb(
        &[
            "--headless",
            "--llm",
            "mock",
            "--connect",
            "--host",
            "127.0.0.1",
            "--port",
            "1",
            "-q",
            "how many albums?",
        ],
        None,
    );

    assert_eq!(code, 1);
    assert!(stderr.contains("Connection Error"));
}
