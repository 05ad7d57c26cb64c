//! Initial snapshots for exercises.
//!
//! A scenario is a [`RepositoryState`] written as JSON or TOML. Every field
//! is optional, so a file only spells out what its exercise needs. Named
//! presets cover the exercises the CLI and the tests use most.

use std::path::Path;

use crate::error::{GitGymError, Result};
use crate::repo::{Commit, Conflict, FileMap, RepositoryState};

/// Names accepted by [`preset`].
pub const PRESETS: &[&str] = &["empty", "initialized", "conflict", "squash", "diverged"];

/// Loads a snapshot file; `.toml` files are read as TOML, anything else as JSON.
pub fn load(path: &Path) -> Result<RepositoryState> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GitGymError::scenario(format!("Failed to read {}: {e}", path.display()))
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let parsed = if is_toml {
        from_toml(&content)
    } else {
        from_json(&content)
    };
    let state = parsed.map_err(|e| match e {
        GitGymError::Scenario(msg) => {
            GitGymError::scenario(format!("{}: {msg}", path.display()))
        }
        other => other,
    })?;

    tracing::info!(
        path = %path.display(),
        commits = state.commits.len(),
        "Loaded scenario"
    );
    Ok(state)
}

/// Parses a JSON snapshot.
pub fn from_json(content: &str) -> Result<RepositoryState> {
    let state: RepositoryState = serde_json::from_str(content)
        .map_err(|e| GitGymError::scenario(format!("invalid JSON snapshot: {e}")))?;
    Ok(normalize(state))
}

/// Parses a TOML snapshot.
pub fn from_toml(content: &str) -> Result<RepositoryState> {
    let state: RepositoryState = toml::from_str(content)
        .map_err(|e| GitGymError::scenario(format!("invalid TOML snapshot: {e}")))?;
    Ok(normalize(state))
}

/// Fills in what a hand-written snapshot may leave out.
fn normalize(mut state: RepositoryState) -> RepositoryState {
    state.branches.insert(state.current_branch.clone());
    for commit in &state.feature_commits {
        if !commit.branch.is_empty() {
            state.branches.insert(commit.branch.clone());
        }
    }
    if state.files.is_empty() {
        for commit in &state.commits {
            state.files.extend(commit.files.clone());
        }
    }
    if !state.commits.is_empty() {
        state.initialized = true;
    }
    state
}

/// Returns a named preset snapshot.
pub fn preset(name: &str) -> Result<RepositoryState> {
    let state = match name {
        "empty" => RepositoryState::default(),
        "initialized" => RepositoryState::initialized(),
        "conflict" => conflict(),
        "squash" => squash(),
        "diverged" => diverged(),
        other => {
            return Err(GitGymError::scenario(format!(
                "unknown preset '{other}' (expected one of: {})",
                PRESETS.join(", ")
            )))
        }
    };
    Ok(state)
}

fn files(pairs: &[(&str, &str)]) -> FileMap {
    pairs
        .iter()
        .map(|(path, content)| (path.to_string(), content.to_string()))
        .collect()
}

fn commit(hash: &str, message: &str, branch: &str, pairs: &[(&str, &str)]) -> Commit {
    Commit::new(hash, message, files(pairs), branch)
}

/// `main` and `feature-a` both changed `config.txt`.
fn conflict() -> RepositoryState {
    let mut state = RepositoryState::initialized();
    state.commits = vec![
        commit("a1b2c3d", "Initial commit", "main", &[("README.md", "# Shop")]),
        commit("b2c3d4e", "Add config", "main", &[("config.txt", "port=3000")]),
    ];
    state.feature_commits = vec![commit(
        "f1e2d3c",
        "Change port",
        "feature-a",
        &[("config.txt", "port=8080")],
    )];
    state.branches.insert("feature-a".to_string());
    state.files = files(&[("README.md", "# Shop"), ("config.txt", "port=3000")]);
    state.pending_conflicts.insert(
        "feature-a".to_string(),
        Conflict {
            file: "config.txt".to_string(),
            ours: "port=3000".to_string(),
            theirs: "port=8080".to_string(),
        },
    );
    state
}

/// Work-in-progress commits waiting to be squashed.
fn squash() -> RepositoryState {
    let mut state = RepositoryState::initialized();
    state.commits = vec![
        commit("0a0a0a0", "Initial commit", "main", &[("README.md", "# Notes")]),
        commit("1b1b1b1", "WIP: start parser", "main", &[("parser.js", "parse()")]),
        commit("2c2c2c2", "WIP: more parser", "main", &[("parser.js", "parse(input)")]),
        commit("3d3d3d3", "WIP: fix typo", "main", &[("parser.js", "parse(input);")]),
        commit("4e4e4e4", "Add parser tests", "main", &[("parser.test.js", "test()")]),
    ];
    state.files = files(&[
        ("README.md", "# Notes"),
        ("parser.js", "parse(input);"),
        ("parser.test.js", "test()"),
    ]);
    state
}

/// Local and remote `main` have each gained a commit.
fn diverged() -> RepositoryState {
    let mut state = RepositoryState::initialized();
    state.commits = vec![
        commit("a1a1a1a", "Initial commit", "main", &[("README.md", "# Team app")]),
        commit("b2b2b2b", "Add index", "main", &[("index.html", "<h1>Hi</h1>")]),
        commit("c3c3c3c", "Local: add footer", "main", &[("footer.html", "<footer/>")]),
    ];
    state.files = files(&[
        ("README.md", "# Team app"),
        ("index.html", "<h1>Hi</h1>"),
        ("footer.html", "<footer/>"),
    ]);
    state.remotes.insert(
        "origin".to_string(),
        "https://github.com/team/app.git".to_string(),
    );
    state
        .remote_branches
        .insert("origin/main".to_string(), "b2b2b2b".to_string());
    state.remote_commits.insert(
        "origin".to_string(),
        vec![commit(
            "d4d4d4d",
            "Remote: add header",
            "main",
            &[("header.html", "<header/>")],
        )],
    );
    state
        .upstreams
        .insert("main".to_string(), "origin/main".to_string());
    state.diverged = true;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_every_preset_loads() {
        for name in PRESETS {
            let state = preset(name).unwrap();
            assert!(state.branches.contains(&state.current_branch), "{name}");
        }
        assert!(!preset("empty").unwrap().initialized);
        assert!(preset("diverged").unwrap().diverged);
    }

    #[test]
    fn test_unknown_preset() {
        let err = preset("nope").unwrap_err();
        assert_eq!(err.category(), "Scenario Error");
        assert!(err.to_string().contains("unknown preset 'nope'"));
    }

    #[test]
    fn test_minimal_json_snapshot_defaults() {
        let state = from_json(
            r#"{
                "commits": [{"hash": "abc1234", "message": "Init", "files": {"a.txt": "a"}}],
                "featureCommits": [{"hash": "def5678", "message": "Work", "branch": "feature-a"}]
            }"#,
        )
        .unwrap();
        assert!(state.initialized);
        assert_eq!(state.current_branch, "main");
        assert!(state.branches.contains("feature-a"));
        assert_eq!(state.files["a.txt"], "a");
        assert!(!state.diverged);
        assert!(state.stash.is_empty());
    }

    #[test]
    fn test_toml_snapshot_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
initialized = true
currentBranch = "trunk"
diverged = true

[files]
"README.md" = "hello"
"#
        )
        .unwrap();
        let state = load(file.path()).unwrap();
        assert_eq!(state.current_branch, "trunk");
        assert!(state.branches.contains("trunk"));
        assert!(state.diverged);
        assert_eq!(state.files["README.md"], "hello");
    }

    #[test]
    fn test_malformed_snapshot_reports_path() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "{{\"commits\": 3}}").unwrap();
        let err = load(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid JSON snapshot"));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let state = preset("conflict").unwrap();
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(from_json(&json).unwrap(), state);
    }
}
