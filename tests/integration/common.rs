//! Common test utilities.

use gitgym::commands::LineKind;
use gitgym::config::InterpreterSettings;
use gitgym::repo::hash::SequentialHashes;
use gitgym::{Interpreter, Outcome, RepositoryState, SessionPayload};

/// A terminal that feeds each outcome's state into the next command.
pub struct Term {
    interpreter: Interpreter,
    pub state: RepositoryState,
    payload: SessionPayload,
}

impl Term {
    pub fn new(state: RepositoryState) -> Self {
        Self {
            interpreter: Interpreter::with_hashes(
                InterpreterSettings::default(),
                Box::new(SequentialHashes::new()),
            ),
            state,
            payload: SessionPayload::default(),
        }
    }

    pub fn preset(name: &str) -> Self {
        Self::new(gitgym::scenario::preset(name).expect("preset exists"))
    }

    /// Runs one line and keeps the resulting state.
    pub fn run(&mut self, line: &str) -> Outcome {
        let outcome = self.interpreter.execute(line, &self.state, &self.payload);
        self.payload = SessionPayload::default();
        self.state = outcome.state.clone();
        outcome
    }

    /// Runs several lines, failing the test on the first error record.
    pub fn run_all(&mut self, lines: &[&str]) {
        for line in lines {
            let outcome = self.run(line);
            assert!(!outcome.failed(), "`{line}` failed:\n{}", outcome.text());
        }
    }

    /// Sets the conflict editor text for the next command.
    pub fn resolve(&mut self, text: &str) {
        self.payload.conflict_resolved_text = Some(text.to_string());
    }

    /// Sets the rebase todo text for the next command.
    pub fn todo(&mut self, text: &str) {
        self.payload.rebase_session_text = Some(text.to_string());
    }
}

/// Record texts of an outcome without the echoed input.
pub fn output(outcome: &Outcome) -> String {
    outcome
        .lines
        .iter()
        .filter(|l| l.kind != LineKind::Input)
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Error record texts of an outcome.
pub fn errors(outcome: &Outcome) -> String {
    outcome
        .lines
        .iter()
        .filter(|l| l.kind == LineKind::Error)
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
