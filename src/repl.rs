//! Line-oriented terminal loop.
//!
//! Lines starting with `:` are meta commands for the editors the simulator
//! would otherwise show in a UI; everything else goes to the interpreter.

use std::io::{BufRead, Write};

use crate::commands::{LineKind, SessionDirective};
use crate::config::CliSettings;
use crate::error::{GitGymError, Result};
use crate::interpreter::Interpreter;
use crate::repo::RepositoryState;
use crate::script::unescape;
use crate::session::SessionPayload;

const META_HELP: &str = "\
Meta commands:
  :resolve <text>   set the conflict resolution (\\n for newlines)
  :resolve          start a multi-line resolution, finish with :end
  :todo             start a multi-line rebase todo list, finish with :end
  :state            print the repository snapshot as JSON
  :help             show this list
  :quit             leave gitgym";

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Which editor buffer a multi-line capture fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Resolve,
    Todo,
}

/// Interactive session state.
pub struct Repl {
    interpreter: Interpreter,
    settings: CliSettings,
    state: RepositoryState,
    payload: SessionPayload,
    capture: Option<(Capture, Vec<String>)>,
}

impl Repl {
    /// Creates a REPL starting from `state`.
    pub fn new(interpreter: Interpreter, settings: CliSettings, state: RepositoryState) -> Self {
        Self {
            interpreter,
            settings,
            state,
            payload: SessionPayload::default(),
            capture: None,
        }
    }

    /// The current snapshot.
    pub fn state(&self) -> &RepositoryState {
        &self.state
    }

    /// Reads lines until EOF or `:quit`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        let mut lines = input.lines();
        loop {
            self.prompt(out)?;
            let Some(line) = lines.next() else {
                break;
            };
            let line = line.map_err(|e| GitGymError::io(format!("Failed to read input: {e}")))?;
            if !self.handle_line(&line, out)? {
                break;
            }
        }
        out.flush().map_err(write_error)?;
        Ok(())
    }

    fn prompt<W: Write>(&self, out: &mut W) -> Result<()> {
        let prompt = if self.capture.is_some() {
            ">".to_string()
        } else {
            self.settings.prompt.clone()
        };
        write!(out, "{prompt} ").map_err(write_error)?;
        out.flush().map_err(write_error)
    }

    /// Handles one input line; returns false when the session should end.
    fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<bool> {
        if let Some((target, mut buffer)) = self.capture.take() {
            if line.trim() == ":end" {
                self.store(target, buffer.join("\n"));
                writeln!(out, "(saved {} line(s))", buffer.len()).map_err(write_error)?;
            } else {
                buffer.push(line.to_string());
                self.capture = Some((target, buffer));
            }
            return Ok(true);
        }

        let trimmed = line.trim();
        let Some(meta) = trimmed.strip_prefix(':') else {
            self.execute(trimmed, out)?;
            return Ok(true);
        };

        let (name, rest) = meta.split_once(' ').unwrap_or((meta, ""));
        match name {
            "quit" | "q" | "exit" => return Ok(false),
            "state" => {
                let json = serde_json::to_string_pretty(&self.state).map_err(|e| {
                    GitGymError::internal(format!("Failed to serialize snapshot: {e}"))
                })?;
                writeln!(out, "{json}").map_err(write_error)?;
            }
            "resolve" if !rest.trim().is_empty() => {
                self.store(Capture::Resolve, unescape(rest.trim()));
            }
            "resolve" => self.capture = Some((Capture::Resolve, Vec::new())),
            "todo" => self.capture = Some((Capture::Todo, Vec::new())),
            "help" => writeln!(out, "{META_HELP}").map_err(write_error)?,
            other => {
                writeln!(out, "Unknown meta command ':{other}'. Try :help.").map_err(write_error)?
            }
        }
        Ok(true)
    }

    fn store(&mut self, target: Capture, text: String) {
        match target {
            Capture::Resolve => self.payload.conflict_resolved_text = Some(text),
            Capture::Todo => self.payload.rebase_session_text = Some(text),
        }
    }

    fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<()> {
        let outcome = self.interpreter.execute(line, &self.state, &self.payload);
        self.payload = SessionPayload::default();

        if outcome.clear_screen {
            write!(out, "{CLEAR_SCREEN}").map_err(write_error)?;
        } else {
            for record in &outcome.lines {
                if record.kind == LineKind::Input && !self.settings.echo_input {
                    continue;
                }
                writeln!(out, "{}", record.text).map_err(write_error)?;
            }
        }

        match &outcome.directive {
            Some(SessionDirective::OpenConflict { file, resolved, .. }) => {
                writeln!(out, "--- {file} ---\n{resolved}\n---").map_err(write_error)?;
                writeln!(
                    out,
                    "Edit with :resolve, then run 'git add {file}' to mark it resolved."
                )
                .map_err(write_error)?;
            }
            Some(SessionDirective::OpenRebase { todo_text, .. }) => {
                writeln!(out, "--- rebase todo ---\n{todo_text}\n---").map_err(write_error)?;
                writeln!(out, "Edit with :todo ... :end, then run 'git rebase --continue'.")
                    .map_err(write_error)?;
            }
            Some(SessionDirective::CloseSession) | None => {}
        }

        self.state = outcome.state;
        Ok(())
    }
}

fn write_error(e: std::io::Error) -> GitGymError {
    GitGymError::io(format!("Failed to write output: {e}"))
}
