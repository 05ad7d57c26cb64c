//! The `gitgym` binary end to end.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::{Builder, TempDir};

/// Runs gitgym with an isolated config path and the given stdin.
fn run_gitgym(args: &[&str], stdin: &str) -> (i32, String, String) {
    let config_dir = TempDir::new().unwrap();
    let config = config_dir.path().join("config.toml");

    let mut child = Command::new(env!("CARGO_BIN_EXE_gitgym"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("GITGYM_SEED")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start gitgym");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .unwrap();
    let output = child.wait_with_output().expect("Failed to wait for gitgym");

    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn test_events_mode_passes() {
    let (code, stdout, _) = run_gitgym(
        &["--events", "git init;assert:contains:Initialized empty Git repository"],
        "",
    );
    assert_eq!(code, 0, "{stdout}");
    assert!(stdout.contains("$ git init"));
    assert!(stdout.contains("Assertions: 1 passed, 0 failed"));
}

#[test]
fn test_failed_assertion_exits_nonzero() {
    let (code, stdout, _) = run_gitgym(
        &["--preset", "diverged", "--events", "git push;assert:state:diverged=false"],
        "",
    );
    assert_eq!(code, 1);
    assert!(stdout.contains("FAILED: step 2: assert:state:diverged=false"));
}

#[test]
fn test_script_from_stdin_with_json_output() {
    let (code, stdout, _) = run_gitgym(
        &["--preset", "conflict", "--script", "-", "--output", "json", "--seed", "7"],
        "git merge feature-a\nresolve:port=8080\ngit add config.txt\ngit commit -m \"Merge\"\nassert:state:session=none\n",
    );
    assert_eq!(code, 0, "{stdout}");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["state"]["files"]["config.txt"], "port=8080");
    assert_eq!(parsed["assertions"]["passed"], 1);
}

#[test]
fn test_seed_makes_hashes_repeatable() {
    let args = [
        "--preset",
        "initialized",
        "--seed",
        "99",
        "--output",
        "json",
        "--events",
        "touch a.txt;git add a.txt;git commit -m \"A\"",
    ];
    let (_, first, _) = run_gitgym(&args, "");
    let (_, second, _) = run_gitgym(&args, "");
    let first: serde_json::Value = serde_json::from_str(&first).unwrap();
    let second: serde_json::Value = serde_json::from_str(&second).unwrap();
    assert_eq!(first["state"]["commits"], second["state"]["commits"]);
}

#[test]
fn test_scenario_file_and_repl() {
    let mut scenario = Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        scenario,
        r#"{{"commits": [{{"hash": "abc1234", "message": "Seeded", "files": {{"seed.txt": "hi"}}}}]}}"#
    )
    .unwrap();

    let (code, stdout, _) = run_gitgym(
        &["--scenario", scenario.path().to_str().unwrap()],
        "git log --oneline\ncat seed.txt\n:quit\n",
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("abc1234 (HEAD -> main) Seeded"));
    assert!(stdout.contains("hi"));
}

#[test]
fn test_bad_preset_reports_category() {
    let (code, _, stderr) = run_gitgym(&["--preset", "nope"], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("Scenario Error"));
}
