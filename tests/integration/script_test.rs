//! Scripted runs through the library API.

use gitgym::config::InterpreterSettings;
use gitgym::repo::hash::SequentialHashes;
use gitgym::script::{OutputFormat, ScriptConfig, ScriptOutput, ScriptRunner};
use gitgym::{scenario, Interpreter, RepositoryState};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::Builder;

fn runner(state: RepositoryState, output_format: OutputFormat) -> ScriptRunner {
    let interpreter = Interpreter::with_hashes(
        InterpreterSettings::default(),
        Box::new(SequentialHashes::new()),
    );
    ScriptRunner::new(
        ScriptConfig {
            output_format,
            fail_fast: false,
        },
        interpreter,
        state,
    )
}

const SQUASH_EXERCISE: &str = r#"
# Squash the three WIP commits into one.
git rebase -i HEAD~4
assert:state:session=interactive-rebase
todo:pick 1b1b1b1 WIP: start parser\nfixup 2c2c2c2 WIP: more parser\nfixup 3d3d3d3 WIP: fix typo\npick 4e4e4e4 Add parser tests
git rebase --continue
assert:contains:Successfully rebased and updated refs/heads/main.
assert:state:commit_count=3
assert:state:last_message=Add parser tests
git log --oneline
assert:matches:^c00000\d \(HEAD -> main\) Add parser tests
"#;

#[test]
fn test_script_file_squash_exercise() {
    let mut file = Builder::new().suffix(".gym").tempfile().unwrap();
    write!(file, "{SQUASH_EXERCISE}").unwrap();

    let mut runner = runner(scenario::preset("squash").unwrap(), OutputFormat::Text);
    runner.load_script(file.path().to_str().unwrap()).unwrap();
    let result = runner.run();

    assert_eq!(result.failures, Vec::<String>::new());
    assert_eq!(result.assertions_passed, 5);
    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.state.commits[1].message, "WIP: start parser");
}

#[test]
fn test_json_report_carries_state_and_steps() {
    let mut runner = runner(RepositoryState::default(), OutputFormat::Json);
    runner
        .load_events("git init;git status;assert:contains:No commits yet;assert:state:branch=trunk")
        .unwrap();
    let result = runner.run();
    let report = ScriptOutput::new(OutputFormat::Json).format(&result);

    let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(parsed["eventsExecuted"], 4);
    assert_eq!(parsed["assertions"]["passed"], 1);
    assert_eq!(parsed["assertions"]["failed"], 1);
    assert_eq!(
        parsed["assertions"]["failures"][0],
        "step 4: assert:state:branch=trunk"
    );
    assert_eq!(parsed["state"]["currentBranch"], "main");
    assert_eq!(parsed["steps"][2]["passed"], true);
    assert_eq!(parsed["transcript"][0]["kind"], "input");
    assert_eq!(result.exit_code(), 1);
}

#[test]
fn test_unknown_assertion_is_a_script_error() {
    let mut runner = runner(RepositoryState::default(), OutputFormat::Text);
    let err = runner.load_events("git init;assert:equals:x").unwrap_err();
    assert_eq!(err.category(), "Script Error");
}

#[test]
fn test_missing_script_file_is_an_io_error() {
    let mut runner = runner(RepositoryState::default(), OutputFormat::Text);
    let err = runner.load_script("/definitely/not/here.gym").unwrap_err();
    assert_eq!(err.category(), "I/O Error");
}
