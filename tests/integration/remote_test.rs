//! Remote workflows: clone, push, fetch and pull.

use super::common::{errors, output, Term};
use gitgym::RepositoryState;
use pretty_assertions::assert_eq;

#[test]
fn test_clone_commit_push() {
    let mut term = Term::new(RepositoryState::default());

    let clone = term.run("git clone https://github.com/acme/widgets.git");
    assert!(output(&clone).starts_with("Cloning into 'widgets'..."));
    assert!(term.state.initialized);
    assert_eq!(term.state.commits.len(), 3);
    assert_eq!(term.state.remotes["origin"], "https://github.com/acme/widgets.git");
    assert_eq!(term.state.upstreams["main"], "origin/main");

    term.run_all(&[
        "echo 'fast mode' >> README.md",
        "git commit -am \"Document fast mode\"",
    ]);
    let tip = term.state.commits.last().expect("history").hash.clone();

    let push = term.run("git push");
    assert_eq!(
        output(&push),
        format!("To https://github.com/acme/widgets.git\n   c000003..{tip}  main -> main")
    );
    assert_eq!(term.state.remote_branches["origin/main"], tip);

    let again = term.run("git push");
    assert_eq!(output(&again), "Everything up-to-date");
}

#[test]
fn test_pull_reconciles_divergence() {
    let mut term = Term::preset("diverged");

    let pull = term.run("git pull");
    assert!(!pull.failed(), "{}", pull.text());
    assert!(output(&pull).starts_with("From https://github.com/team/app.git"));
    assert!(!term.state.diverged);
    assert_eq!(term.state.files["header.html"], "<header/>");
    assert_eq!(term.state.files["footer.html"], "<footer/>");

    let push = term.run("git push origin main");
    assert!(!push.failed(), "{}", push.text());
}

#[test]
fn test_push_requires_a_remote() {
    let mut term = Term::preset("squash");
    let push = term.run("git push");
    assert!(errors(&push).starts_with("fatal: No configured push destination."));
}

#[test]
fn test_new_branch_push_sets_upstream() {
    let mut term = Term::preset("diverged");
    term.run_all(&["git switch -c topic", "git push -u origin topic"]);
    assert_eq!(term.state.upstreams["topic"], "origin/topic");
    assert!(term.state.remote_branches.contains_key("origin/topic"));
}

#[test]
fn test_remote_management() {
    let mut term = Term::preset("squash");
    term.run_all(&["git remote add upstream https://example.com/notes.git"]);

    let listed = term.run("git remote -v");
    assert_eq!(
        output(&listed),
        "upstream\thttps://example.com/notes.git (fetch)\n\
         upstream\thttps://example.com/notes.git (push)"
    );

    let duplicate = term.run("git remote add upstream https://example.com/other.git");
    assert!(errors(&duplicate).contains("remote upstream already exists."));

    term.run_all(&["git remote remove upstream"]);
    assert!(term.state.remotes.is_empty());
}
