//! Repository state model for the simulated terminal.
//!
//! A [`RepositoryState`] is a complete, self-contained snapshot of one
//! simulated working copy. Commands never mutate a caller's snapshot; they
//! return a new one. Scenario-scoped fields are serde-defaulted so a
//! snapshot file only has to mention what its exercise needs.

pub mod diff;
pub mod hash;
pub mod history;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::session::ActiveSession;

/// Path → content map used for every file collection in the model.
pub type FileMap = BTreeMap<String, String>;

/// Branch every fresh repository starts on.
pub const DEFAULT_BRANCH: &str = "main";

/// A single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Opaque hex identifier, unique within a run.
    pub hash: String,
    /// Full commit message; the first line is the subject.
    pub message: String,
    /// Content staged at commit time.
    #[serde(default)]
    pub files: FileMap,
    /// Branch the commit was created on.
    #[serde(default)]
    pub branch: String,
    /// Author name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Commit {
    /// Creates a commit without an author.
    pub fn new(
        hash: impl Into<String>,
        message: impl Into<String>,
        files: FileMap,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
            files,
            branch: branch.into(),
            author: None,
        }
    }

    /// Sets the author.
    pub fn with_author(self, author: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            ..self
        }
    }

    /// First seven characters of the hash.
    pub fn short_hash(&self) -> &str {
        short(&self.hash)
    }

    /// First line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Whether `rev` names this commit (exact hash or a prefix of at least four characters).
    pub fn matches(&self, rev: &str) -> bool {
        rev == self.hash || (rev.len() >= 4 && self.hash.starts_with(rev))
    }
}

/// Shortens a hash for display.
pub fn short(hash: &str) -> &str {
    match hash.char_indices().nth(7) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}

/// One `git stash` entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StashEntry {
    /// Snapshot of the working-directory changes.
    #[serde(default)]
    pub files: FileMap,
    /// Staged content at stash time.
    #[serde(default)]
    pub staged: FileMap,
    /// Description shown by `stash list`.
    #[serde(default)]
    pub message: String,
}

/// A tag pointing at a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub annotated: bool,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One reflog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflogEntry {
    pub hash: String,
    pub action: String,
    pub message: String,
}

/// The two sides of an unresolved file conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub file: String,
    pub ours: String,
    pub theirs: String,
}

/// A merge that has passed the conflict stage but has not been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeInProgress {
    /// Branch being merged in.
    pub branch: String,
    /// The conflicted path.
    pub file: String,
    /// Working-directory content of `file` before the merge started.
    #[serde(default)]
    pub saved_working: Option<String>,
    /// Staged content of `file` before the merge started.
    #[serde(default)]
    pub saved_staged: Option<String>,
}

/// Where HEAD points.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Head {
    /// HEAD follows `current_branch`.
    #[default]
    Attached,
    /// HEAD points directly at a commit.
    Detached { hash: String },
}

/// Progress of a `git bisect` session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BisectState {
    #[serde(default)]
    pub good: Option<String>,
    #[serde(default)]
    pub bad: Option<String>,
    /// Commit currently checked out for testing.
    #[serde(default)]
    pub current: Option<String>,
}

/// A linked worktree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worktree {
    pub path: String,
    pub branch: String,
}

/// The complete simulated repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryState {
    pub initialized: bool,
    pub current_branch: String,
    pub branches: BTreeSet<String>,
    /// Last-committed content per tracked path.
    pub files: FileMap,
    /// The index.
    pub staged_files: FileMap,
    /// On-disk content that may diverge from `files` and `staged_files`.
    pub working_directory: FileMap,
    /// History of the current branch lineage, oldest first.
    pub commits: Vec<Commit>,
    /// Commits that live only on non-current branches.
    pub feature_commits: Vec<Commit>,
    /// Newest entry first.
    pub stash: Vec<StashEntry>,
    /// The modal sub-session, if any.
    pub session: ActiveSession,
    pub remotes: BTreeMap<String, String>,
    pub remote_commits: BTreeMap<String, Vec<Commit>>,
    /// Remote-tracking ref (`origin/main`) → commit hash.
    pub remote_branches: BTreeMap<String, String>,
    pub tags: BTreeMap<String, Tag>,
    /// Oldest entry first.
    pub reflog: Vec<ReflogEntry>,
    /// Remote history has advanced independently of ours.
    pub diverged: bool,
    /// Declared conflicts, keyed by the branch (or remote ref) whose merge triggers them.
    pub pending_conflicts: BTreeMap<String, Conflict>,
    pub merge_in_progress: Option<MergeInProgress>,
    pub head: Head,
    /// Saved commit lineages of non-current branches, as hash lists.
    pub branch_lineages: BTreeMap<String, Vec<String>>,
    /// Local branch → remote-tracking ref.
    pub upstreams: BTreeMap<String, String>,
    pub bisect: Option<BisectState>,
    pub worktrees: Vec<Worktree>,
    pub submodules: BTreeMap<String, String>,
    pub directories: BTreeSet<String>,
    /// Repository-local `git config` values.
    pub config: BTreeMap<String, String>,
}

impl Default for RepositoryState {
    fn default() -> Self {
        Self {
            initialized: false,
            current_branch: DEFAULT_BRANCH.to_string(),
            branches: BTreeSet::from([DEFAULT_BRANCH.to_string()]),
            files: FileMap::new(),
            staged_files: FileMap::new(),
            working_directory: FileMap::new(),
            commits: Vec::new(),
            feature_commits: Vec::new(),
            stash: Vec::new(),
            session: ActiveSession::None,
            remotes: BTreeMap::new(),
            remote_commits: BTreeMap::new(),
            remote_branches: BTreeMap::new(),
            tags: BTreeMap::new(),
            reflog: Vec::new(),
            diverged: false,
            pending_conflicts: BTreeMap::new(),
            merge_in_progress: None,
            head: Head::Attached,
            branch_lineages: BTreeMap::new(),
            upstreams: BTreeMap::new(),
            bisect: None,
            worktrees: Vec::new(),
            submodules: BTreeMap::new(),
            directories: BTreeSet::new(),
            config: BTreeMap::new(),
        }
    }
}

/// The three disjoint file groups reported by `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSets {
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
}

impl StatusSets {
    /// True when there is nothing to report.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.modified.is_empty() && self.untracked.is_empty()
    }
}

impl RepositoryState {
    /// A freshly initialized, empty repository.
    pub fn initialized() -> Self {
        Self {
            initialized: true,
            ..Self::default()
        }
    }

    /// The unresolved conflict, if the conflict sub-session is open.
    pub fn conflict_state(&self) -> Option<Conflict> {
        self.session.conflict().map(|c| c.conflict())
    }

    /// Whether an interactive rebase is waiting for `--continue`/`--abort`.
    pub fn rebase_in_progress(&self) -> bool {
        self.session.rebase().is_some()
    }

    /// Commits listed in the open interactive rebase.
    pub fn rebase_commits(&self) -> &[Commit] {
        self.session.rebase().map(|r| r.commits.as_slice()).unwrap_or(&[])
    }

    /// Base commit of the open interactive rebase.
    pub fn rebase_base_commit(&self) -> Option<&str> {
        self.session.rebase().and_then(|r| r.base.as_deref())
    }

    /// Target (`HEAD~N` or branch) of the open interactive rebase.
    pub fn rebase_target(&self) -> Option<&str> {
        self.session.rebase().map(|r| r.target.as_str())
    }

    /// Whether HEAD is detached.
    pub fn detached_head(&self) -> bool {
        matches!(self.head, Head::Detached { .. })
    }

    /// The commit HEAD points at.
    pub fn head_commit(&self) -> Option<&Commit> {
        match &self.head {
            Head::Attached => self.commits.last(),
            Head::Detached { hash } => self.find_commit(hash),
        }
    }

    /// Looks up a commit by full hash or prefix across every known history.
    ///
    /// The current lineage is searched newest first, then other branches,
    /// then remote histories.
    pub fn find_commit(&self, rev: &str) -> Option<&Commit> {
        self.commits
            .iter()
            .rev()
            .chain(self.feature_commits.iter().rev())
            .chain(self.remote_commits.values().flat_map(|c| c.iter().rev()))
            .find(|c| c.matches(rev))
    }

    /// Every hash that already names something in this snapshot.
    pub fn known_hashes(&self) -> BTreeSet<String> {
        let mut hashes: BTreeSet<String> = self
            .commits
            .iter()
            .chain(self.feature_commits.iter())
            .chain(self.remote_commits.values().flatten())
            .map(|c| c.hash.clone())
            .collect();
        hashes.extend(self.reflog.iter().map(|e| e.hash.clone()));
        hashes.extend(self.tags.values().map(|t| t.hash.clone()));
        hashes.extend(self.session.commit_hashes());
        hashes
    }

    /// Whether `path` is committed or staged.
    pub fn is_tracked(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.staged_files.contains_key(path)
    }

    /// What the index holds for `path`: the staged copy, else the committed one.
    pub fn index_content(&self, path: &str) -> Option<&String> {
        self.staged_files.get(path).or_else(|| self.files.get(path))
    }

    /// What `cat` would print for `path`.
    pub fn working_content(&self, path: &str) -> Option<&String> {
        self.working_directory
            .get(path)
            .or_else(|| self.files.get(path))
    }

    /// Every path visible in the working tree.
    pub fn visible_paths(&self) -> BTreeSet<String> {
        self.files
            .keys()
            .chain(self.working_directory.keys())
            .chain(self.staged_files.keys())
            .cloned()
            .collect()
    }

    /// Tracked paths whose working content differs from the index.
    pub fn modified_paths(&self) -> Vec<String> {
        self.working_directory
            .iter()
            .filter(|(path, content)| {
                self.index_content(path)
                    .is_some_and(|indexed| indexed != *content)
            })
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Derives the staged / modified / untracked groups.
    pub fn status_sets(&self) -> StatusSets {
        let untracked = self
            .working_directory
            .keys()
            .filter(|path| !self.is_tracked(path))
            .cloned()
            .collect();

        StatusSets {
            staged: self.staged_files.keys().cloned().collect(),
            modified: self.modified_paths(),
            untracked,
        }
    }

    /// Appends a reflog record.
    pub fn record_reflog(
        &mut self,
        hash: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.reflog.push(ReflogEntry {
            hash: hash.into(),
            action: action.into(),
            message: message.into(),
        });
    }

    /// Ref names that point at `hash`, for log decorations.
    pub fn decorations(&self, hash: &str) -> Vec<String> {
        let mut refs = Vec::new();
        let is_head = self.head_commit().is_some_and(|c| c.hash == hash);
        if is_head {
            match &self.head {
                Head::Attached => refs.push(format!("HEAD -> {}", self.current_branch)),
                Head::Detached { .. } => refs.push("HEAD".to_string()),
            }
        }
        for (name, tip) in &self.remote_branches {
            if tip == hash {
                refs.push(name.clone());
            }
        }
        for (name, tag) in &self.tags {
            if tag.hash == hash {
                refs.push(format!("tag: {name}"));
            }
        }
        refs
    }
}
