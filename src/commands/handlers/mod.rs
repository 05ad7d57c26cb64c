//! Command handlers for gitgym.
//!
//! Each handler is a plain function over a [`CommandContext`]: it reads and
//! rewrites the context's working copy of the repository, writes output
//! lines, and returns `Err` for a failed precondition. The dispatcher throws
//! the working copy away on `Err`, so a handler may bail out at any point
//! without leaving a half-applied change behind.

pub mod auxiliary;
pub mod branching;
pub mod history;
pub mod lifecycle;
pub mod remote;
pub mod rewrite;
pub mod shell;
pub mod stash;
pub mod staging;

use std::collections::BTreeSet;

use super::args::Args;
use super::output::{OutputBuffer, SessionDirective};
use crate::config::InterpreterSettings;
use crate::error::CommandError;
use crate::repo::hash::HashGenerator;
use crate::repo::history::{self as lineage, parse_relative};
use crate::repo::{Commit, RepositoryState};

/// Result type returned by every handler.
pub type HandlerResult = Result<(), CommandError>;

/// Signature shared by every entry in the command table.
pub type Handler = fn(&mut CommandContext<'_>, &Args) -> HandlerResult;

/// Upper bound on generator draws before falling back to a derived hash.
const MAX_HASH_ATTEMPTS: usize = 64;

/// Context provided to command handlers.
pub struct CommandContext<'a> {
    /// Working copy of the repository; becomes the new snapshot on success.
    pub state: RepositoryState,
    /// Interpreter settings.
    pub settings: &'a InterpreterSettings,
    /// Lines produced so far.
    pub out: OutputBuffer,
    /// Session change for the UI, if any.
    pub directive: Option<SessionDirective>,
    /// Set by `clear`.
    pub clear_screen: bool,
    hashes: &'a mut dyn HashGenerator,
    taken: BTreeSet<String>,
}

impl<'a> CommandContext<'a> {
    /// Creates a context over a copy of `state`.
    pub fn new(
        state: RepositoryState,
        settings: &'a InterpreterSettings,
        hashes: &'a mut dyn HashGenerator,
    ) -> Self {
        let taken = state.known_hashes();
        Self {
            state,
            settings,
            out: OutputBuffer::new(),
            directive: None,
            clear_screen: false,
            hashes,
            taken,
        }
    }

    /// Draws a hash that names nothing in the snapshot and was not issued
    /// earlier in this command.
    pub fn fresh_hash(&mut self) -> String {
        for _ in 0..MAX_HASH_ATTEMPTS {
            let candidate = self.hashes.next_hash();
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }

        tracing::warn!("hash generator keeps colliding; deriving a hash");
        let width = self.settings.hash_length;
        let mut n = self.taken.len();
        loop {
            let candidate = format!("{n:0width$x}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Author recorded on new commits.
    pub fn author(&self) -> String {
        self.state
            .config
            .get("user.name")
            .cloned()
            .unwrap_or_else(|| self.settings.user_name.clone())
    }

    /// Email shown next to `name` in the full log format.
    pub fn author_email(&self, name: &str) -> String {
        if let Some(email) = self.state.config.get("user.email") {
            if self.author() == name {
                return email.clone();
            }
        }
        if name == self.settings.user_name {
            return self.settings.user_email.clone();
        }
        let local: String = name
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        format!("{local}@example.com")
    }

    /// The configured default branch name.
    pub fn default_branch(&self) -> &str {
        &self.settings.default_branch
    }

    /// History of a branch or remote-tracking ref.
    pub fn branch_history(&self, name: &str) -> Option<Vec<Commit>> {
        lineage::branch_history(&self.state, name, self.default_branch())
    }

    /// Resolves `HEAD~N`, tags, branch names and hash prefixes to a commit.
    pub fn resolve_commit(&self, rev: &str) -> Option<Commit> {
        if let Some(n) = parse_relative(rev) {
            let history = lineage::head_history(&self.state);
            let idx = history.len().checked_sub(n.checked_add(1)?)?;
            return history.get(idx).cloned();
        }
        if let Some(tag) = self.state.tags.get(rev) {
            return self.state.find_commit(&tag.hash).cloned();
        }
        if let Some(history) = self.branch_history(rev) {
            return history.last().cloned();
        }
        self.state.find_commit(rev).cloned()
    }

    /// Short name of what HEAD points at, for messages.
    pub fn head_label(&self) -> String {
        match self.state.head_commit() {
            Some(c) if self.state.detached_head() => c.short_hash().to_string(),
            _ => self.state.current_branch.clone(),
        }
    }
}

/// Returns the positional argument at `idx` or a usage error.
pub fn required<'a>(args: &'a Args, idx: usize, usage: &str) -> Result<&'a str, CommandError> {
    args.positional(idx)
        .ok_or_else(|| CommandError::usage(format!("usage: {usage}")))
}

/// `1 commit`, `2 commits`.
pub fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Validates a branch or tag name the way `check-ref-format` would reject
/// the obvious mistakes.
pub fn valid_ref_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.starts_with('/')
        && !name.ends_with('/')
        && !name.ends_with(".lock")
        && !name.ends_with('.')
        && !name.contains("..")
        && !name.contains("@{")
        && name != "HEAD"
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
}

/// Harness for handler tests: runs one table entry against a snapshot.
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::commands::definitions::{find, Program};
    use crate::commands::tokenizer::tokenize;
    use crate::repo::hash::SequentialHashes;
    use crate::repo::FileMap;

    /// Everything a handler produced.
    pub struct Ran {
        pub result: HandlerResult,
        pub state: RepositoryState,
        pub lines: Vec<String>,
        pub directive: Option<SessionDirective>,
        pub clear_screen: bool,
    }

    impl Ran {
        /// Whether any line contains `needle`.
        pub fn printed(&self, needle: &str) -> bool {
            self.lines.iter().any(|l| l.contains(needle))
        }

        /// The error text, panicking if the handler succeeded.
        pub fn error(&self) -> String {
            match &self.result {
                Err(e) => e.to_string(),
                Ok(()) => panic!("expected an error, got {:?}", self.lines),
            }
        }
    }

    fn run(state: RepositoryState, program: Program, line: &str) -> Ran {
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        let def = find(program, verb).unwrap_or_else(|| panic!("no command {verb}"));
        let args = Args::parse(&tokenize(rest), def.flags).unwrap();
        let settings = InterpreterSettings::default();
        let mut hashes = SequentialHashes::new();
        let mut ctx = CommandContext::new(state, &settings, &mut hashes);
        let result = (def.handler)(&mut ctx, &args);
        Ran {
            result,
            lines: ctx.out.lines().iter().map(|l| l.text.clone()).collect(),
            directive: ctx.directive,
            clear_screen: ctx.clear_screen,
            state: ctx.state,
        }
    }

    /// Runs `git <line>`.
    pub fn git(state: RepositoryState, line: &str) -> Ran {
        run(state, Program::Git, line)
    }

    /// Runs a shell `<line>`.
    pub fn shell(state: RepositoryState, line: &str) -> Ran {
        run(state, Program::Shell, line)
    }

    /// Builds a file map from pairs.
    pub fn files(pairs: &[(&str, &str)]) -> FileMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// A commit on `branch` touching `pairs`.
    pub fn commit(hash: &str, message: &str, branch: &str, pairs: &[(&str, &str)]) -> Commit {
        Commit::new(hash, message, files(pairs), branch)
    }

    /// `main` with two commits and a `feature-a` branch one commit ahead.
    pub fn two_branch_repo() -> RepositoryState {
        let mut state = RepositoryState::initialized();
        state.commits = vec![
            commit("aaaa001", "Initial commit", "main", &[("README.md", "# App")]),
            commit("aaaa002", "Add config", "main", &[("config.txt", "port=3000")]),
        ];
        state.feature_commits = vec![commit(
            "bbbb001",
            "Add login",
            "feature-a",
            &[("login.js", "login()")],
        )];
        state.branches.insert("feature-a".to_string());
        state.files = files(&[("README.md", "# App"), ("config.txt", "port=3000")]);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::hash::SequentialHashes;
    use crate::repo::FileMap;

    /// Generator that always returns the same value.
    struct Stuck;

    impl HashGenerator for Stuck {
        fn next_hash(&mut self) -> String {
            "aaaaaaa".to_string()
        }
    }

    #[test]
    fn test_fresh_hash_skips_known_hashes() {
        let mut state = RepositoryState::initialized();
        state
            .commits
            .push(Commit::new("c000001", "first", FileMap::new(), "main"));
        let settings = InterpreterSettings::default();
        let mut hashes = SequentialHashes::new();
        let mut ctx = CommandContext::new(state, &settings, &mut hashes);

        assert_eq!(ctx.fresh_hash(), "c000002");
        assert_eq!(ctx.fresh_hash(), "c000003");
    }

    #[test]
    fn test_fresh_hash_falls_back_when_generator_is_stuck() {
        let settings = InterpreterSettings::default();
        let mut hashes = Stuck;
        let mut ctx = CommandContext::new(RepositoryState::initialized(), &settings, &mut hashes);

        let first = ctx.fresh_hash();
        let second = ctx.fresh_hash();
        assert_eq!(first, "aaaaaaa");
        assert_ne!(first, second);
        assert_eq!(second.len(), 7);
    }

    #[test]
    fn test_author_prefers_repository_config() {
        let mut state = RepositoryState::initialized();
        let settings = InterpreterSettings::default();
        let mut hashes = SequentialHashes::new();
        state.config.insert("user.name".to_string(), "Ada".to_string());
        let ctx = CommandContext::new(state, &settings, &mut hashes);
        assert_eq!(ctx.author(), "Ada");
        assert_eq!(ctx.author_email("Learner"), "learner@example.com");
        assert_eq!(ctx.author_email("Jane Doe"), "janedoe@example.com");
    }

    #[test]
    fn test_resolve_relative_revisions() {
        let mut state = RepositoryState::initialized();
        state.commits = vec![
            Commit::new("c000001", "one", FileMap::new(), "main"),
            Commit::new("c000002", "two", FileMap::new(), "main"),
        ];
        let settings = InterpreterSettings::default();
        let mut hashes = SequentialHashes::new();
        let ctx = CommandContext::new(state, &settings, &mut hashes);

        assert_eq!(ctx.resolve_commit("HEAD").map(|c| c.message), Some("two".into()));
        assert_eq!(ctx.resolve_commit("HEAD~1").map(|c| c.message), Some("one".into()));
        assert!(ctx.resolve_commit("HEAD~2").is_none());
        assert!(ctx.resolve_commit("HEAD~18446744073709551615").is_none());
        assert_eq!(ctx.resolve_commit("main").map(|c| c.message), Some("two".into()));
    }

    #[test]
    fn test_valid_ref_name() {
        assert!(valid_ref_name("feature/login"));
        assert!(!valid_ref_name("bad name"));
        assert!(!valid_ref_name("a..b"));
        assert!(!valid_ref_name("-x"));
    }
}
