//! Branch lineages and committed-file transitions.
//!
//! The snapshot only stores the current branch's commits in full. Other
//! branches are reconstructed from saved lineages, from `feature_commits`,
//! or from remote histories.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{Commit, FileMap, RepositoryState};

static RELATIVE_REV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:HEAD|@)(?:~(\d*)|(\^+))?$").expect("static regex is valid")
});

static HEX_REV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{4,40}$").expect("static regex is valid"));

/// Parses `HEAD`, `HEAD~N`, `HEAD^`, `HEAD^^` into a distance from HEAD.
pub fn parse_relative(rev: &str) -> Option<usize> {
    let caps = RELATIVE_REV.captures(rev)?;
    if let Some(tilde) = caps.get(1) {
        if tilde.as_str().is_empty() {
            return Some(1);
        }
        return tilde.as_str().parse().ok();
    }
    if let Some(carets) = caps.get(2) {
        return Some(carets.as_str().len());
    }
    Some(0)
}

/// Whether `rev` looks like an abbreviated or full commit hash.
pub fn looks_like_hash(rev: &str) -> bool {
    HEX_REV.is_match(rev)
}

/// Splits `origin/main` into `("origin", "main")` when `origin` is a known remote.
pub fn split_remote_ref<'a>(state: &RepositoryState, rev: &'a str) -> Option<(&'a str, &'a str)> {
    let (remote, branch) = rev.split_once('/')?;
    let known = state.remotes.contains_key(remote)
        || state.remote_commits.contains_key(remote)
        || state.remote_branches.contains_key(rev);
    known.then_some((remote, branch))
}

fn resolve_hashes(state: &RepositoryState, hashes: &[String]) -> Vec<Commit> {
    hashes
        .iter()
        .filter_map(|h| {
            state
                .commits
                .iter()
                .chain(state.feature_commits.iter())
                .chain(state.remote_commits.values().flatten())
                .find(|c| &c.hash == h)
                .cloned()
        })
        .collect()
}

/// Commits stored for a remote ref: keyed by the full ref after a push or
/// fetch, or by the bare remote name in hand-written snapshots.
fn remote_side(state: &RepositoryState, remote: &str, full_ref: &str) -> Vec<Commit> {
    state
        .remote_commits
        .get(full_ref)
        .or_else(|| state.remote_commits.get(remote))
        .cloned()
        .unwrap_or_default()
}

fn shares_history(state: &RepositoryState, side: &[Commit]) -> bool {
    let local: BTreeSet<&str> = state.commits.iter().map(|c| c.hash.as_str()).collect();
    side.iter().any(|c| local.contains(c.hash.as_str()))
}

/// Everything the remote holds for `full_ref` (`origin/main`), fetched or not.
///
/// A stored list that shares no commit with ours only holds what the remote
/// has on top of the tracking ref.
pub fn published_history(state: &RepositoryState, remote: &str, full_ref: &str) -> Vec<Commit> {
    let side = remote_side(state, remote, full_ref);
    if shares_history(state, &side) {
        return side;
    }

    let mut base = state.commits.clone();
    if let Some(tip) = state.remote_branches.get(full_ref) {
        if let Some(pos) = base.iter().position(|c| &c.hash == tip) {
            base.truncate(pos + 1);
        }
    }
    base.extend(side);
    base
}

/// History of a remote-tracking ref.
///
/// A full stored history is cut at the tracking ref's tip, so one remote
/// list can serve several refs.
fn remote_history(state: &RepositoryState, remote: &str, full_ref: &str) -> Vec<Commit> {
    let side = remote_side(state, remote, full_ref);
    let mut history = published_history(state, remote, full_ref);
    if shares_history(state, &side) {
        if let Some(tip) = state.remote_branches.get(full_ref) {
            if let Some(pos) = history.iter().position(|c| &c.hash == tip) {
                history.truncate(pos + 1);
            }
        }
    }
    history
}

/// Reconstructs the commit history of `branch`, oldest first.
///
/// Returns `None` when `branch` names nothing known.
pub fn branch_history(
    state: &RepositoryState,
    branch: &str,
    default_branch: &str,
) -> Option<Vec<Commit>> {
    if branch == state.current_branch {
        return Some(state.commits.clone());
    }
    if let Some(hashes) = state.branch_lineages.get(branch) {
        return Some(resolve_hashes(state, hashes));
    }
    if state.branches.contains(branch) || branch == default_branch {
        let current = state.current_branch.as_str();
        let on_default = current == default_branch;
        let mut history: Vec<Commit> = state
            .commits
            .iter()
            .filter(|c| on_default || c.branch != current)
            .cloned()
            .collect();
        history.extend(
            state
                .feature_commits
                .iter()
                .filter(|c| c.branch == branch)
                .cloned(),
        );
        return Some(history);
    }
    if let Some((remote, _)) = split_remote_ref(state, branch) {
        return Some(remote_history(state, remote, branch));
    }
    None
}

/// Commits of `ours` that are not part of `theirs`, in order.
pub fn exclusive_commits(ours: &[Commit], theirs: &[Commit]) -> Vec<Commit> {
    let known: BTreeSet<&str> = theirs.iter().map(|c| c.hash.as_str()).collect();
    ours.iter()
        .filter(|c| !known.contains(c.hash.as_str()))
        .cloned()
        .collect()
}

/// Length of the shared hash prefix of two histories.
pub fn common_prefix(a: &[Commit], b: &[Commit]) -> usize {
    a.iter()
        .zip(b.iter())
        .take_while(|(x, y)| x.hash == y.hash)
        .count()
}

/// Rewrites `files` as if history moved from `old` to `new`.
///
/// Paths touched by the abandoned part of `old` fall back to the last
/// surviving commit that contains them (or disappear); the new part of
/// `new` is then applied in order.
pub fn transition_files(files: &mut FileMap, old: &[Commit], new: &[Commit]) {
    let shared = common_prefix(old, new);

    let touched: BTreeSet<&String> = old[shared..].iter().flat_map(|c| c.files.keys()).collect();
    for path in touched {
        let survivor = old[..shared]
            .iter()
            .rev()
            .find_map(|c| c.files.get(path));
        match survivor {
            Some(content) => {
                files.insert(path.clone(), content.clone());
            }
            None => {
                files.remove(path);
            }
        }
    }

    for commit in &new[shared..] {
        for (path, content) in &commit.files {
            files.insert(path.clone(), content.clone());
        }
    }
}

/// Moves the snapshot onto `target`'s lineage.
///
/// The abandoned lineage is saved so switching back restores it exactly.
pub fn switch_lineage(state: &mut RepositoryState, target: &str, history: Vec<Commit>) {
    let old = std::mem::take(&mut state.commits);
    let from = std::mem::replace(&mut state.current_branch, target.to_string());

    state
        .branch_lineages
        .insert(from, old.iter().map(|c| c.hash.clone()).collect());
    state.branch_lineages.remove(target);

    transition_files(&mut state.files, &old, &history);

    let on_target: BTreeSet<&str> = history.iter().map(|c| c.hash.as_str()).collect();
    let mut seen = BTreeSet::new();
    let parked: Vec<Commit> = old
        .iter()
        .chain(state.feature_commits.iter())
        .filter(|c| !on_target.contains(c.hash.as_str()))
        .filter(|c| seen.insert(c.hash.clone()))
        .cloned()
        .collect();

    state.feature_commits = parked;
    state.commits = history;
}

/// Lineage key holding the history behind a detached HEAD.
pub const DETACHED_LINEAGE: &str = "HEAD";

/// History ending at the commit named by `rev`, searched across every
/// known lineage.
pub fn history_at(
    state: &RepositoryState,
    rev: &str,
    default_branch: &str,
) -> Option<Vec<Commit>> {
    let mut names = vec![state.current_branch.clone()];
    names.extend(state.branches.iter().cloned());
    names.extend(state.branch_lineages.keys().cloned());
    names.extend(state.remote_branches.keys().cloned());

    names.iter().find_map(|name| {
        let mut history = branch_history(state, name, default_branch)?;
        let pos = history.iter().rposition(|c| c.matches(rev))?;
        history.truncate(pos + 1);
        Some(history)
    })
}

/// The history HEAD currently sees: the detached lineage or the branch.
pub fn head_history(state: &RepositoryState) -> Vec<Commit> {
    match state.branch_lineages.get(DETACHED_LINEAGE) {
        Some(hashes) if state.detached_head() => resolve_hashes(state, hashes),
        _ => state.commits.clone(),
    }
}

/// Every commit reachable from HEAD, a local branch or a remote-tracking
/// ref, oldest first, each hash once.
///
/// Each ref's history is merged in after the refs seen before it, so a
/// commit never precedes its parent.
pub fn all_history(state: &RepositoryState, default_branch: &str) -> Vec<Commit> {
    let mut refs: Vec<&str> = vec![default_branch];
    refs.extend(state.branches.iter().map(String::as_str));
    refs.extend(
        state
            .branch_lineages
            .keys()
            .map(String::as_str)
            .filter(|name| *name != DETACHED_LINEAGE),
    );
    refs.extend(state.remote_branches.keys().map(String::as_str));

    let mut merged = head_history(state);
    for name in refs {
        if let Some(history) = branch_history(state, name, default_branch) {
            let extra = exclusive_commits(&history, &merged);
            merged.extend(extra);
        }
    }
    merged
}
