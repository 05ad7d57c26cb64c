//! Conflict and interactive-rebase sessions seen through the public API.

use super::common::{errors, output, Term};
use gitgym::commands::SessionDirective;
use gitgym::ActiveSession;
use pretty_assertions::assert_eq;

#[test]
fn test_merge_emits_open_conflict_directive() {
    let mut term = Term::preset("conflict");
    let outcome = term.run("git merge feature-a");

    match outcome.directive {
        Some(SessionDirective::OpenConflict {
            file,
            ours,
            theirs,
            resolved,
        }) => {
            assert_eq!(file, "config.txt");
            assert_eq!(ours, "port=3000");
            assert_eq!(theirs, "port=8080");
            assert!(resolved.contains("<<<<<<< HEAD"));
        }
        other => panic!("expected open-conflict, got {other:?}"),
    }

    term.resolve("port=8080");
    let added = term.run("git add config.txt");
    assert_eq!(added.directive, Some(SessionDirective::CloseSession));
}

#[test]
fn test_conflict_blocks_other_commands() {
    let mut term = Term::preset("conflict");
    term.run("git merge feature-a");
    let open = term.state.clone();

    let checkout = term.run("git checkout feature-a");
    assert!(errors(&checkout).contains("config.txt: needs merge"));

    let commit = term.run("git commit -m \"too early\"");
    assert!(errors(&commit).contains("Committing is not possible because you have unmerged files."));

    let merge = term.run("git merge feature-a");
    assert!(errors(&merge).contains("Merging is not possible because you have unmerged files."));

    assert_eq!(term.state, open);

    // Inspection still works.
    let status = term.run("git status");
    assert!(output(&status).contains("both modified:   config.txt"));
}

#[test]
fn test_merge_abort_closes_conflict() {
    let mut term = Term::preset("conflict");
    let start = term.state.clone();
    term.run("git merge feature-a");

    let aborted = term.run("git merge --abort");
    assert!(!aborted.failed(), "{}", aborted.text());
    assert_eq!(term.state.session, ActiveSession::None);
    assert!(term.state.merge_in_progress.is_none());
    assert_eq!(term.state.commits, start.commits);
    assert_eq!(term.state.files, start.files);
}

#[test]
fn test_resolution_with_markers_warns() {
    let mut term = Term::preset("conflict");
    term.run("git merge feature-a");

    let added = term.run("git add config.txt");
    assert!(output(&added).contains("still contains conflict markers"));
    assert!(term.state.staged_files["config.txt"].contains("======="));
}

#[test]
fn test_rebase_session_directive_and_gating() {
    let mut term = Term::preset("squash");
    let outcome = term.run("git rebase -i HEAD~3");

    match &outcome.directive {
        Some(SessionDirective::OpenRebase { commits, todo_text }) => {
            assert_eq!(commits.len(), 3);
            assert!(todo_text.starts_with("pick 2c2c2c2 WIP: more parser\n"));
        }
        other => panic!("expected open-rebase, got {other:?}"),
    }

    let blocked = term.run("git commit -m \"no\"");
    assert!(errors(&blocked).contains("cannot commit: an interactive rebase is in progress."));

    let log = term.run("git log --oneline");
    assert!(!log.failed());

    let aborted = term.run("git rebase --abort");
    assert_eq!(aborted.directive, Some(SessionDirective::CloseSession));
    assert_eq!(term.state.commits.len(), 5);
    assert_eq!(term.state.commits[4].hash, "4e4e4e4");
}

#[test]
fn test_rebase_drop_and_reword() {
    let mut term = Term::preset("squash");
    term.run_all(&["git rebase -i HEAD~2"]);
    term.todo("reword 3d3d3d3 Fix typo in parser\ndrop 4e4e4e4 Add parser tests");
    term.run_all(&["git rebase --continue"]);

    let subjects: Vec<_> = term.state.commits.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(
        subjects,
        vec![
            "Initial commit",
            "WIP: start parser",
            "WIP: more parser",
            "Fix typo in parser"
        ]
    );
    assert!(!term.state.files.contains_key("parser.test.js"));
}

#[test]
fn test_continue_without_session_is_an_error() {
    let mut term = Term::preset("squash");
    let outcome = term.run("git rebase --continue");
    assert!(errors(&outcome).contains("No rebase in progress?"));
}

#[test]
fn test_stash_round_trip() {
    let mut term = Term::preset("squash");
    term.run_all(&["echo tweak > parser.js", "git stash"]);
    assert_eq!(term.state.stash.len(), 1);
    assert!(!term.state.working_directory.contains_key("parser.js"));

    let list = term.run("git stash list");
    assert!(output(&list).starts_with("stash@{0}: WIP on main: 4e4e4e4"));

    term.run_all(&["git stash pop"]);
    assert!(term.state.stash.is_empty());
    assert_eq!(term.state.working_directory["parser.js"], "tweak");
}
