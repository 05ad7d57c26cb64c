//! Configuration files and how their settings reach the interpreter.

use gitgym::config::{Config, InterpreterSettings};
use gitgym::repo::hash::SequentialHashes;
use gitgym::{Interpreter, RepositoryState, SessionPayload};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{content}").unwrap();
    file
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from_file(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.interpreter.default_branch, "main");
    assert_eq!(config.cli.prompt, "$");
}

#[test]
fn test_settings_flow_into_commands() {
    let file = write_config(
        r#"
[interpreter]
default_branch = "trunk"
user_name = "Ada"
user_email = "ada@example.org"
workdir = "/srv/lab"

[cli]
echo_input = false
"#,
    );
    let config = Config::load_from_file(file.path()).unwrap();
    assert!(!config.cli.echo_input);

    let mut interpreter =
        Interpreter::with_hashes(config.interpreter.clone(), Box::new(SequentialHashes::new()));
    let payload = SessionPayload::default();
    let mut state = RepositoryState::default();
    for line in ["git init", "touch a.txt", "git add a.txt", "git commit -m \"Start\""] {
        let outcome = interpreter.execute(line, &state, &payload);
        assert!(!outcome.failed(), "{}", outcome.text());
        state = outcome.state;
    }

    assert_eq!(state.current_branch, "trunk");
    let log = interpreter.execute("git log", &state, &payload);
    assert!(log.text().contains("Author: Ada <ada@example.org>"));
    let pwd = interpreter.execute("pwd", &state, &payload);
    assert!(pwd.text().ends_with("/srv/lab"));
}

#[test]
fn test_invalid_values_are_rejected() {
    let file = write_config("[interpreter]\nhash_length = 2\n");
    let err = Config::load_from_file(file.path()).unwrap_err();
    assert_eq!(err.category(), "Configuration Error");
    assert!(err.to_string().contains("hash_length"));

    let file = write_config("[interpreter\n");
    assert!(Config::load_from_file(file.path()).is_err());
}

#[test]
fn test_repository_config_overrides_author() {
    let mut interpreter = Interpreter::with_hashes(
        InterpreterSettings::default(),
        Box::new(SequentialHashes::new()),
    );
    let payload = SessionPayload::default();
    let mut state = gitgym::scenario::preset("initialized").unwrap();
    for line in [
        "git config user.name \"Grace Hopper\"",
        "touch b.txt",
        "git add b.txt",
        "git commit -m \"Add b\"",
    ] {
        let outcome = interpreter.execute(line, &state, &payload);
        assert!(!outcome.failed(), "{}", outcome.text());
        state = outcome.state;
    }
    assert_eq!(state.commits[0].author.as_deref(), Some("Grace Hopper"));
}
