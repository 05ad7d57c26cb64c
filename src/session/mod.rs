//! Modal sub-sessions that outlive a single command.
//!
//! At most one session can be open at a time; [`ActiveSession`] makes the
//! "conflict and rebase both open" shape unrepresentable.

pub mod conflict;
pub mod rebase;

use serde::{Deserialize, Serialize};

pub use conflict::ConflictSession;
pub use rebase::{RebaseSession, TodoAction, TodoLine};

/// The open sub-session, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActiveSession {
    /// No modal session.
    #[default]
    None,
    /// A merge stopped on a conflicting file.
    Conflict(ConflictSession),
    /// An interactive rebase waiting for its todo list.
    InteractiveRebase(RebaseSession),
}

impl ActiveSession {
    /// Whether any session is open.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// The open conflict session.
    pub fn conflict(&self) -> Option<&ConflictSession> {
        match self {
            Self::Conflict(c) => Some(c),
            _ => None,
        }
    }

    /// The open conflict session, mutably.
    pub fn conflict_mut(&mut self) -> Option<&mut ConflictSession> {
        match self {
            Self::Conflict(c) => Some(c),
            _ => None,
        }
    }

    /// The open interactive rebase.
    pub fn rebase(&self) -> Option<&RebaseSession> {
        match self {
            Self::InteractiveRebase(r) => Some(r),
            _ => None,
        }
    }

    /// Hashes held by the session that must not be reused.
    pub fn commit_hashes(&self) -> Vec<String> {
        match self {
            Self::InteractiveRebase(r) => r
                .commits
                .iter()
                .chain(r.onto.iter())
                .map(|c| c.hash.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Conflict(_) => "conflict",
            Self::InteractiveRebase(_) => "interactive-rebase",
        }
    }
}

/// Side-channel text the UI supplies while a session is open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// The editor's current resolution of the conflicted file.
    #[serde(default)]
    pub conflict_resolved_text: Option<String>,
    /// The edited interactive-rebase todo list.
    #[serde(default)]
    pub rebase_session_text: Option<String>,
}

impl SessionPayload {
    /// A payload carrying a conflict resolution.
    pub fn resolved(text: impl Into<String>) -> Self {
        Self {
            conflict_resolved_text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A payload carrying an edited todo list.
    pub fn todo(text: impl Into<String>) -> Self {
        Self {
            rebase_session_text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Copies the payload into the matching open session.
    pub fn apply_to(&self, session: &mut ActiveSession) {
        match session {
            ActiveSession::Conflict(c) => {
                if let Some(text) = &self.conflict_resolved_text {
                    c.resolved = text.clone();
                }
            }
            ActiveSession::InteractiveRebase(r) => {
                if let Some(text) = &self.rebase_session_text {
                    r.todo = text.clone();
                }
            }
            ActiveSession::None => {}
        }
    }
}
