//! Interactive-rebase sub-session.
//!
//! The session holds the candidate commits and an editable todo list.
//! `--continue` replays the todo list in document order; `--abort` simply
//! drops the session because nothing was rewritten while it was open.

use serde::{Deserialize, Serialize};

use crate::repo::{short, Commit};

/// One todo-list verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoAction {
    Pick,
    Reword,
    /// Treated as `pick`; the simulation never stops for amending.
    Edit,
    Squash,
    Fixup,
    Drop,
}

impl TodoAction {
    /// Parses a long or single-letter action word.
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "pick" | "p" => Some(Self::Pick),
            "reword" | "r" => Some(Self::Reword),
            "edit" | "e" => Some(Self::Edit),
            "squash" | "s" => Some(Self::Squash),
            "fixup" | "f" => Some(Self::Fixup),
            "drop" | "d" => Some(Self::Drop),
            _ => None,
        }
    }

    /// The long keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Pick => "pick",
            Self::Reword => "reword",
            Self::Edit => "edit",
            Self::Squash => "squash",
            Self::Fixup => "fixup",
            Self::Drop => "drop",
        }
    }
}

/// A parsed todo line bound to the commit it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoLine {
    pub action: TodoAction,
    pub commit: Commit,
    /// Text after the hash; the new message for `reword`.
    pub message: String,
}

/// An open interactive rebase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebaseSession {
    /// Candidate commits, oldest first.
    pub commits: Vec<Commit>,
    /// History the replayed commits are stacked onto.
    pub onto: Vec<Commit>,
    /// Hash of the commit just below the window, if any.
    pub base: Option<String>,
    /// What the learner asked to rebase onto (`HEAD~3`, `main`).
    pub target: String,
    /// Editable todo text.
    pub todo: String,
}

const TODO_HELP: &str = "#
# Commands:
# p, pick <commit> = use commit
# r, reword <commit> = use commit, but edit the commit message
# e, edit <commit> = use commit, but stop for amending
# s, squash <commit> = use commit, but meld into previous commit
# f, fixup <commit> = like \"squash\" but discard this commit's log message
# d, drop <commit> = remove commit
#
# These lines can be re-ordered; they are executed from top to bottom.
# If you remove a line here THAT COMMIT WILL BE LOST.";

impl RebaseSession {
    /// Opens a session with a default all-`pick` todo list.
    pub fn open(
        commits: Vec<Commit>,
        onto: Vec<Commit>,
        base: Option<String>,
        target: impl Into<String>,
    ) -> Self {
        let todo = render_todo(&commits, base.as_deref(), onto.last());
        Self {
            commits,
            onto,
            base,
            target: target.into(),
            todo,
        }
    }

    /// Parses the todo text.
    ///
    /// Comments and blank lines are ignored silently; other lines that do
    /// not name a known action and commit are returned in the second list.
    pub fn parse_todo(&self) -> (Vec<TodoLine>, Vec<String>) {
        let mut parsed = Vec::new();
        let mut skipped = Vec::new();

        for raw in self.todo.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.splitn(3, char::is_whitespace);
            let action = parts.next().and_then(TodoAction::parse);
            let commit = parts
                .next()
                .and_then(|rev| self.commits.iter().find(|c| c.matches(rev)));

            match (action, commit) {
                (Some(action), Some(commit)) => parsed.push(TodoLine {
                    action,
                    commit: commit.clone(),
                    message: parts.next().unwrap_or("").trim().to_string(),
                }),
                _ => skipped.push(line.to_string()),
            }
        }

        (parsed, skipped)
    }

    /// Replays the todo lines, drawing a fresh hash for every retained commit.
    pub fn replay(lines: &[TodoLine], mut fresh_hash: impl FnMut() -> String) -> Vec<Commit> {
        let mut out: Vec<Commit> = Vec::new();

        for line in lines {
            let action = match (line.action, out.is_empty()) {
                // Nothing to meld into yet.
                (TodoAction::Squash | TodoAction::Fixup, true) => TodoAction::Pick,
                (action, _) => action,
            };

            match action {
                TodoAction::Drop => {}
                TodoAction::Pick | TodoAction::Edit => out.push(Commit {
                    hash: fresh_hash(),
                    ..line.commit.clone()
                }),
                TodoAction::Reword => {
                    let message = if line.message.is_empty() {
                        line.commit.message.clone()
                    } else {
                        line.message.clone()
                    };
                    out.push(Commit {
                        hash: fresh_hash(),
                        message,
                        ..line.commit.clone()
                    });
                }
                TodoAction::Squash | TodoAction::Fixup => {
                    if let Some(last) = out.last_mut() {
                        last.files.extend(line.commit.files.clone());
                        if action == TodoAction::Squash {
                            last.message = format!("{}\n\n{}", last.message, line.commit.message);
                        }
                    }
                }
            }
        }

        out
    }
}

/// Renders the default todo list, oldest commit first.
pub fn render_todo(commits: &[Commit], base: Option<&str>, onto: Option<&Commit>) -> String {
    let mut text: String = commits
        .iter()
        .map(|c| format!("pick {} {}\n", c.short_hash(), c.subject()))
        .collect();

    let range_start = base.map(short).unwrap_or("root");
    let range_end = commits.last().map(|c| c.short_hash()).unwrap_or(range_start);
    let onto_hash = onto.map(|c| c.short_hash()).unwrap_or(range_start);
    let count = commits.len();
    text.push_str(&format!(
        "\n# Rebase {range_start}..{range_end} onto {onto_hash} ({count} command{})\n",
        if count == 1 { "" } else { "s" }
    ));
    text.push_str(TODO_HELP);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::FileMap;

    fn commit(hash: &str, message: &str, file: &str) -> Commit {
        let mut files = FileMap::new();
        files.insert(file.to_string(), message.to_string());
        Commit::new(hash, message, files, "main")
    }

    fn session() -> RebaseSession {
        let base = commit("aaaa000", "base", "base.txt");
        RebaseSession::open(
            vec![
                commit("bbbb001", "wip1", "a.txt"),
                commit("bbbb002", "wip2", "b.txt"),
                commit("bbbb003", "wip3", "c.txt"),
                commit("bbbb004", "finish", "d.txt"),
            ],
            vec![base],
            Some("aaaa000".to_string()),
            "HEAD~4",
        )
    }

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("new{n:04}")
        }
    }

    #[test]
    fn test_default_todo_lists_every_commit() {
        let s = session();
        let (lines, skipped) = s.parse_todo();
        assert_eq!(lines.len(), 4);
        assert!(skipped.is_empty());
        assert!(lines.iter().all(|l| l.action == TodoAction::Pick));
        assert!(s.todo.contains("# Rebase aaaa000..bbbb004 onto aaaa000 (4 commands)"));
    }

    #[test]
    fn test_squash_folds_into_previous() {
        let mut s = session();
        s.todo = "pick bbbb001 wip1\nsquash bbbb002 wip2\ns bbbb003 wip3\npick bbbb004 finish\n"
            .to_string();
        let (lines, _) = s.parse_todo();
        let out = RebaseSession::replay(&lines, counter());

        assert_eq!(out.len(), 2);
        assert!(out[0].message.contains("wip1"));
        assert!(out[0].message.contains("wip2"));
        assert!(out[0].message.contains("wip3"));
        assert_eq!(out[0].files.len(), 3);
        assert_eq!(out[1].message, "finish");
        assert_eq!(out[0].hash, "new0001");
        assert_eq!(out[1].hash, "new0002");
    }

    #[test]
    fn test_first_line_squash_is_demoted() {
        let mut s = session();
        s.todo = "squash bbbb001 wip1\nfixup bbbb002 wip2\n".to_string();
        let (lines, _) = s.parse_todo();
        let out = RebaseSession::replay(&lines, counter());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "wip1");
        assert_ne!(out[0].hash, "bbbb001");
        assert!(out[0].files.contains_key("b.txt"));
    }

    #[test]
    fn test_reword_drop_and_edit() {
        let mut s = session();
        s.todo = "reword bbbb001 Better message\nd bbbb002\ne bbbb003 wip3\n# comment\n\n"
            .to_string();
        let (lines, skipped) = s.parse_todo();
        assert!(skipped.is_empty());
        let out = RebaseSession::replay(&lines, counter());

        let messages: Vec<&str> = out.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["Better message", "wip3"]);
    }

    #[test]
    fn test_unknown_lines_are_skipped() {
        let mut s = session();
        s.todo = "explode bbbb001 wip1\npick ffff999 ghost\npick bbbb004 finish\n".to_string();
        let (lines, skipped) = s.parse_todo();
        assert_eq!(lines.len(), 1);
        assert_eq!(skipped.len(), 2);
    }
}
