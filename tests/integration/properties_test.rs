//! Behavioural guarantees every command sequence must keep.

use super::common::{errors, output, Term};
use pretty_assertions::assert_eq;

#[test]
fn test_status_and_log_are_idempotent() {
    let mut term = Term::preset("conflict");
    term.run_all(&["echo draft > notes.txt", "echo port=4000 > config.txt"]);

    for line in ["git status", "git status -s", "git log", "git log --oneline --all"] {
        let first = term.run(line);
        let second = term.run(line);
        assert_eq!(first.lines, second.lines, "{line}");
        assert_eq!(first.state, second.state, "{line}");
    }
}

#[test]
fn test_log_all_reaches_other_branches() {
    let mut term = Term::preset("conflict");
    let head_only = term.run("git log --oneline");
    let all = term.run("git log --oneline --all");

    assert!(!output(&head_only).contains("f1e2d3c"));
    assert_eq!(
        output(&all),
        "f1e2d3c Change port\n\
         b2c3d4e (HEAD -> main) Add config\n\
         a1b2c3d Initial commit"
    );
}

#[test]
fn test_huge_relative_revision_is_an_error() {
    let mut term = Term::preset("squash");
    for line in [
        "git checkout HEAD~18446744073709551615",
        "git show HEAD~18446744073709551615",
        "git revert HEAD~18446744073709551615",
        "git cherry-pick HEAD~18446744073709551615",
    ] {
        let ran = term.run(line);
        assert!(ran.failed(), "{line}");
        assert!(!errors(&ran).is_empty(), "{line}");
    }
}

#[test]
fn test_add_then_restore_staged_round_trips() {
    let mut term = Term::preset("squash");
    term.run_all(&["echo draft > notes.md", "echo faster > parser.js"]);
    let before = term.state.staged_files.clone();

    term.run_all(&["git add notes.md parser.js"]);
    assert_eq!(term.state.staged_files["notes.md"], "draft");
    assert_eq!(term.state.staged_files["parser.js"], "faster");

    term.run_all(&["git restore --staged notes.md parser.js"]);
    assert_eq!(term.state.staged_files, before);
    assert_eq!(term.state.working_directory["parser.js"], "faster");
}

#[test]
fn test_every_new_commit_gets_a_fresh_hash() {
    let mut term = Term::preset("conflict");

    let check = |term: &mut Term, lines: &[&str]| {
        let known = term.state.known_hashes();
        term.run_all(lines);
        let head = term.state.commits.last().expect("history").hash.clone();
        assert!(!known.contains(&head), "{lines:?} reused {head}");
    };

    check(&mut term, &["echo a > a.txt", "git add a.txt", "git commit -m \"Add a\""]);
    check(&mut term, &["git commit --amend -m \"Add a file\""]);
    check(&mut term, &["git cherry-pick f1e2d3c"]);
    check(&mut term, &["git revert HEAD"]);

    let known = term.state.known_hashes();
    term.run_all(&["git rebase -i HEAD~2"]);
    term.todo("pick c000004 Revert\nsquash c000003 Change port");
    term.run_all(&["git rebase --continue"]);
    let tip = term.state.commits.last().expect("history");
    assert!(!known.contains(&tip.hash));
}

#[test]
fn test_conflict_lifecycle() {
    let mut term = Term::preset("conflict");
    let commits_before = term.state.commits.len();

    let merge = term.run("git merge feature-a");
    let session = term.state.session.conflict().expect("conflict session").clone();
    assert_eq!(session.ours, "port=3000");
    assert_eq!(session.theirs, "port=8080");
    assert!(output(&merge).contains("CONFLICT (content): Merge conflict in config.txt"));

    let cat = term.run("cat config.txt");
    assert_eq!(
        output(&cat),
        "<<<<<<< HEAD\nport=3000\n=======\nport=8080\n>>>>>>> feature-a"
    );

    term.resolve("port=3000");
    term.run_all(&["git add config.txt"]);
    assert!(term.state.conflict_state().is_none());
    assert_eq!(term.state.staged_files["config.txt"], "port=3000");

    term.run_all(&["git commit -m \"Resolve conflict\""]);
    assert_eq!(term.state.commits.len(), commits_before + 1);
    assert!(term.state.staged_files.is_empty());
    assert!(term.state.merge_in_progress.is_none());
}

#[test]
fn test_interactive_rebase_squash() {
    let mut term = Term::preset("squash");
    let originals = term.state.known_hashes();

    term.run_all(&["git rebase -i HEAD~4"]);
    assert!(term.state.rebase_in_progress());
    term.todo(
        "pick 1b1b1b1 WIP: start parser\n\
         squash 2c2c2c2 WIP: more parser\n\
         squash 3d3d3d3 WIP: fix typo\n\
         pick 4e4e4e4 Add parser tests",
    );
    term.run_all(&["git rebase --continue"]);

    let after_base = &term.state.commits[1..];
    assert_eq!(after_base.len(), 2);
    for message in ["WIP: start parser", "WIP: more parser", "WIP: fix typo"] {
        assert!(after_base[0].message.contains(message), "{message}");
    }
    assert_eq!(after_base[1].message, "Add parser tests");
    assert!(after_base.iter().all(|c| !originals.contains(&c.hash)));
    assert_eq!(term.state.files["parser.js"], "parse(input);");
    assert!(!term.state.session.is_open());
}

#[test]
fn test_leading_squash_is_kept_as_a_pick() {
    let mut term = Term::preset("squash");

    term.run_all(&["git rebase -i HEAD~4"]);
    term.todo(
        "squash 1b1b1b1 WIP: start parser\n\
         pick 2c2c2c2 WIP: more parser\n\
         pick 3d3d3d3 WIP: fix typo\n\
         pick 4e4e4e4 Add parser tests",
    );
    term.run_all(&["git rebase --continue"]);

    let first = &term.state.commits[1];
    assert_eq!(first.message, "WIP: start parser");
    assert_ne!(first.hash, "1b1b1b1");
    assert_eq!(term.state.commits.len(), 5);
}

#[test]
fn test_force_push_gating() {
    let mut term = Term::preset("diverged");

    let rejected = term.run("git push origin main");
    assert!(errors(&rejected).contains("[rejected]"));
    assert!(term.state.diverged);

    let forced = term.run("git push --force origin main");
    assert!(!forced.failed(), "{}", forced.text());
    assert!(!term.state.diverged);

    let mut term = Term::preset("diverged");
    term.run_all(&["git push --force-with-lease origin main"]);
    assert!(!term.state.diverged);
}

#[test]
fn test_reset_modes() {
    let start = Term::preset("squash").state;
    let last_files = start.commits.last().expect("history").files.clone();
    assert!(start.staged_files.is_empty());

    let mut soft = Term::new(start.clone());
    soft.run_all(&["git reset --soft HEAD~1"]);
    assert_eq!(soft.state.commits.len(), start.commits.len() - 1);
    assert_eq!(soft.state.staged_files, last_files);
    assert_eq!(soft.state.working_directory, start.working_directory);

    let mut mixed = Term::new(start.clone());
    mixed.run_all(&["git reset HEAD~1"]);
    assert_eq!(mixed.state.commits.len(), start.commits.len() - 1);
    assert!(mixed.state.staged_files.is_empty());
    for (path, content) in &last_files {
        assert_eq!(&mixed.state.working_directory[path], content);
    }

    let mut hard = Term::new(start.clone());
    let reset = hard.run("git reset --hard HEAD~1");
    assert_eq!(hard.state.commits.len(), start.commits.len() - 1);
    assert!(hard.state.staged_files.is_empty());
    assert!(hard.state.working_directory.is_empty());
    assert!(output(&reset).contains("HEAD is now at 3d3d3d3 WIP: fix typo"));
}

#[test]
fn test_failed_command_leaves_state_untouched() {
    let mut term = Term::preset("squash");
    let before = term.state.clone();

    let outcome = term.run("git checkout no-such-branch");
    assert!(outcome.failed());
    assert_eq!(term.state, before);

    let outcome = term.run("git frobnicate");
    assert!(errors(&outcome).contains("'frobnicate' is not a git command"));
    assert_eq!(term.state, before);
}
