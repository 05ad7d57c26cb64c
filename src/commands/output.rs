//! Transport-agnostic command output types.
//!
//! These types represent command results in a way that is independent of the
//! presentation layer (REPL, script runner, a web front end, etc.). Each
//! layer decides how to colour or lay out the kinds.

use serde::{Deserialize, Serialize};

use crate::repo::Commit;

/// Display category of an output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Echo of the submitted command.
    Input,
    /// Plain command output.
    Output,
    /// A failed command.
    Error,
    /// A completed mutation.
    Success,
    /// Expected data loss or a suspicious-but-valid request.
    Warning,
    /// Narration from the simulator itself.
    System,
}

impl LineKind {
    /// Short label used by the text renderers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Error => "error",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::System => "system",
        }
    }
}

/// One line of terminal output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub kind: LineKind,
    pub text: String,
}

impl OutputLine {
    /// Creates a line of the given kind.
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Instruction to the UI to open or close a modal editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionDirective {
    /// Show the conflict editor.
    OpenConflict {
        file: String,
        ours: String,
        theirs: String,
        resolved: String,
    },
    /// Show the interactive-rebase todo editor.
    #[serde(rename_all = "camelCase")]
    OpenRebase {
        commits: Vec<Commit>,
        todo_text: String,
    },
    /// Dismiss whichever editor is open.
    CloseSession,
}

/// Accumulates output records while a command runs.
///
/// Multi-line text is split so every record is a single terminal line.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    lines: Vec<OutputLine>,
}

impl OutputBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` (split on newlines) with the given kind.
    pub fn push(&mut self, kind: LineKind, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(OutputLine::new(kind, ""));
            return;
        }
        self.lines
            .extend(text.lines().map(|l| OutputLine::new(kind, l)));
    }

    /// Appends plain output.
    pub fn output(&mut self, text: impl AsRef<str>) {
        self.push(LineKind::Output, text);
    }

    /// Appends success output.
    pub fn success(&mut self, text: impl AsRef<str>) {
        self.push(LineKind::Success, text);
    }

    /// Appends an error.
    pub fn error(&mut self, text: impl AsRef<str>) {
        self.push(LineKind::Error, text);
    }

    /// Appends a warning.
    pub fn warning(&mut self, text: impl AsRef<str>) {
        self.push(LineKind::Warning, text);
    }

    /// Appends simulator narration.
    pub fn system(&mut self, text: impl AsRef<str>) {
        self.push(LineKind::System, text);
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Consumes the buffer.
    pub fn into_lines(self) -> Vec<OutputLine> {
        self.lines
    }

    /// Borrowed view of the records so far.
    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiline_text_is_split() {
        let mut out = OutputBuffer::new();
        out.output("On branch main\nnothing to commit, working tree clean");
        assert_eq!(out.lines().len(), 2);
        assert_eq!(out.lines()[1].text, "nothing to commit, working tree clean");
    }

    #[test]
    fn test_kinds_are_preserved() {
        let mut out = OutputBuffer::new();
        out.error("fatal: bad revision 'x'");
        out.success("Switched to branch 'main'");
        out.warning("HEAD is now at abc1234 Init");
        let kinds: Vec<LineKind> = out.into_lines().iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LineKind::Error, LineKind::Success, LineKind::Warning]);
    }

    #[test]
    fn test_empty_text_is_a_blank_line() {
        let mut out = OutputBuffer::new();
        out.output("");
        assert_eq!(out.lines()[0].text, "");
    }

    #[test]
    fn test_directive_serialization() {
        let json = serde_json::to_string(&SessionDirective::CloseSession).unwrap();
        assert_eq!(json, r#"{"type":"close-session"}"#);
    }
}
