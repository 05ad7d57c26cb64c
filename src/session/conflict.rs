//! Merge-conflict sub-session.
//!
//! Holds both sides of the conflicted file and the editable resolution
//! buffer until `git add <file>` consumes it.

use serde::{Deserialize, Serialize};

use crate::repo::Conflict;

/// An open merge conflict on a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSession {
    pub file: String,
    pub ours: String,
    pub theirs: String,
    /// Branch (or remote ref) being merged in.
    pub branch: String,
    /// Resolution buffer; starts as the marked-up two-sided view.
    pub resolved: String,
}

impl ConflictSession {
    /// Opens a session for a declared conflict.
    pub fn open(conflict: Conflict, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        let resolved = render_markers(&conflict.ours, &conflict.theirs, &branch);
        Self {
            file: conflict.file,
            ours: conflict.ours,
            theirs: conflict.theirs,
            branch,
            resolved,
        }
    }

    /// The two-sided view with conflict delimiters.
    pub fn marked_view(&self) -> String {
        render_markers(&self.ours, &self.theirs, &self.branch)
    }

    /// Whether the buffer still contains conflict delimiters.
    pub fn has_markers(&self) -> bool {
        self.resolved
            .lines()
            .any(|l| l.starts_with("<<<<<<<") || l.starts_with(">>>>>>>") || l == "=======")
    }

    /// The plain data view of this conflict.
    pub fn conflict(&self) -> Conflict {
        Conflict {
            file: self.file.clone(),
            ours: self.ours.clone(),
            theirs: self.theirs.clone(),
        }
    }
}

/// Renders both sides between standard conflict markers.
pub fn render_markers(ours: &str, theirs: &str, branch: &str) -> String {
    format!(
        "<<<<<<< HEAD\n{}\n=======\n{}\n>>>>>>> {branch}",
        ours.trim_end_matches('\n'),
        theirs.trim_end_matches('\n')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port_conflict() -> ConflictSession {
        ConflictSession::open(
            Conflict {
                file: "config.txt".to_string(),
                ours: "port=3000".to_string(),
                theirs: "port=8080".to_string(),
            },
            "feature-a",
        )
    }

    #[test]
    fn test_open_initializes_marked_buffer() {
        let session = port_conflict();
        assert_eq!(
            session.resolved,
            "<<<<<<< HEAD\nport=3000\n=======\nport=8080\n>>>>>>> feature-a"
        );
        assert!(session.has_markers());
    }

    #[test]
    fn test_resolved_buffer_without_markers() {
        let mut session = port_conflict();
        session.resolved = "port=3000".to_string();
        assert!(!session.has_markers());
        assert_eq!(session.marked_view().lines().count(), 5);
    }
}
