//! Scripted runs for automation and exercise checking.
//!
//! A script feeds events to an [`Interpreter`] exactly as the REPL would,
//! without a terminal, and checks assertions along the way. Assertions look
//! at the most recent command's output (its echoed input excluded) and at
//! the current snapshot.

mod events;
mod output;

pub use events::{state_field, Assertion, Event, EventParser};
pub(crate) use events::unescape;
pub use output::{OutputFormat, ScriptOutput};

use std::time::{Duration, Instant};

use crate::commands::{LineKind, OutputLine};
use crate::error::{GitGymError, Result};
use crate::interpreter::Interpreter;
use crate::repo::RepositoryState;
use crate::session::SessionPayload;

/// Configuration for a scripted run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptConfig {
    /// Report format.
    pub output_format: OutputFormat,
    /// Whether to stop on the first failed assertion.
    pub fail_fast: bool,
}

/// Output and verdict of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// 1-based position in the script.
    pub number: usize,
    /// The event as written.
    pub event: String,
    /// Records the event produced; empty for payload events and assertions.
    pub lines: Vec<OutputLine>,
    /// Assertion verdict; `None` for anything else.
    pub passed: Option<bool>,
}

/// Result of a scripted run.
#[derive(Debug)]
pub struct ScriptResult {
    /// Terminal records since the last `clear`.
    pub transcript: Vec<OutputLine>,
    /// One entry per executed event.
    pub steps: Vec<Step>,
    /// Number of events executed.
    pub events_executed: usize,
    /// Total execution duration.
    pub duration: Duration,
    /// Number of assertions passed.
    pub assertions_passed: usize,
    /// Number of assertions failed.
    pub assertions_failed: usize,
    /// Failed assertions as `step N: <event>`.
    pub failures: Vec<String>,
    /// The final snapshot.
    pub state: RepositoryState,
}

impl ScriptResult {
    /// Process exit code: 1 if any assertion failed.
    pub fn exit_code(&self) -> i32 {
        if self.assertions_failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Runs scripted events against an interpreter.
pub struct ScriptRunner {
    config: ScriptConfig,
    interpreter: Interpreter,
    state: RepositoryState,
    payload: SessionPayload,
    events: Vec<Event>,
}

impl ScriptRunner {
    /// Creates a runner starting from `state`.
    pub fn new(config: ScriptConfig, interpreter: Interpreter, state: RepositoryState) -> Self {
        Self {
            config,
            interpreter,
            state,
            payload: SessionPayload::default(),
            events: Vec::new(),
        }
    }

    /// Loads `;`-separated inline events.
    pub fn load_events(&mut self, input: &str) -> Result<()> {
        self.events = EventParser::new().parse_inline(input)?;
        Ok(())
    }

    /// Loads a script from a file, or from stdin when `path` is `-`.
    pub fn load_script(&mut self, path: &str) -> Result<()> {
        let content = if path == "-" {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| GitGymError::io(format!("Failed to read stdin: {e}")))?;
            buffer
        } else {
            std::fs::read_to_string(path)
                .map_err(|e| GitGymError::io(format!("Failed to read script file {path}: {e}")))?
        };

        self.load_script_text(&content)
    }

    /// Loads a script from its text.
    pub fn load_script_text(&mut self, content: &str) -> Result<()> {
        self.events = EventParser::new().parse_script(content)?;
        Ok(())
    }

    /// Runs every loaded event and returns the result.
    pub fn run(mut self) -> ScriptResult {
        let start_time = Instant::now();
        let events = std::mem::take(&mut self.events);

        let mut transcript = Vec::new();
        let mut last_output = String::new();
        let mut steps = Vec::with_capacity(events.len());
        let mut failures = Vec::new();
        let mut assertions_passed = 0;
        let mut assertions_failed = 0;

        for (index, event) in events.into_iter().enumerate() {
            let number = index + 1;
            let mut step = Step {
                number,
                event: event.to_string(),
                lines: Vec::new(),
                passed: None,
            };

            match event {
                Event::Command(line) => {
                    let outcome = self.interpreter.execute(&line, &self.state, &self.payload);
                    // The payload now lives in the snapshot's session.
                    self.payload = SessionPayload::default();
                    self.state = outcome.state;
                    last_output = outcome
                        .lines
                        .iter()
                        .filter(|l| l.kind != LineKind::Input)
                        .map(|l| l.text.as_str())
                        .collect::<Vec<_>>()
                        .join("\n");
                    if outcome.clear_screen {
                        transcript.clear();
                    } else {
                        transcript.extend(outcome.lines.iter().cloned());
                    }
                    step.lines = outcome.lines;
                }
                Event::Resolve(text) => {
                    self.payload.conflict_resolved_text = Some(text);
                }
                Event::Todo(text) => {
                    self.payload.rebase_session_text = Some(text);
                }
                Event::Assert(assertion) => {
                    let passed = assertion.check(&last_output, &self.state);
                    step.passed = Some(passed);
                    if passed {
                        assertions_passed += 1;
                    } else {
                        assertions_failed += 1;
                        tracing::warn!(step = number, event = %step.event, "Assertion failed");
                        failures.push(format!("step {number}: {}", step.event));
                    }
                }
            }

            let stop = self.config.fail_fast && step.passed == Some(false);
            steps.push(step);
            if stop {
                break;
            }
        }

        tracing::debug!(
            events = steps.len(),
            passed = assertions_passed,
            failed = assertions_failed,
            "Script finished"
        );

        ScriptResult {
            transcript,
            events_executed: steps.len(),
            steps,
            duration: start_time.elapsed(),
            assertions_passed,
            assertions_failed,
            failures,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpreterSettings;
    use crate::repo::hash::SequentialHashes;
    use crate::scenario;

    fn runner(state: RepositoryState, fail_fast: bool) -> ScriptRunner {
        let interpreter = Interpreter::with_hashes(
            InterpreterSettings::default(),
            Box::new(SequentialHashes::new()),
        );
        ScriptRunner::new(
            ScriptConfig {
                output_format: OutputFormat::Text,
                fail_fast,
            },
            interpreter,
            state,
        )
    }

    #[test]
    fn test_script_runs_and_asserts() {
        let mut runner = runner(RepositoryState::default(), false);
        runner
            .load_script_text(
                "# start a repository\n\
                 git init\n\
                 assert:state:initialized=true\n\
                 echo hello > a.txt\n\
                 git add a.txt\n\
                 git commit -m \"First\"\n\
                 assert:contains:First\n\
                 assert:not-contains:$ git commit\n\
                 assert:state:commit_count=1\n",
            )
            .unwrap();
        let result = runner.run();
        assert_eq!(result.failures, Vec::<String>::new());
        assert_eq!(result.assertions_passed, 4);
        assert_eq!(result.events_executed, 8);
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.state.commits[0].message, "First");
    }

    #[test]
    fn test_failed_assertion_sets_exit_code() {
        let mut runner = runner(RepositoryState::default(), false);
        runner
            .load_events("git status;assert:contains:On branch;assert:contains:not a git repository")
            .unwrap();
        let result = runner.run();
        assert_eq!(result.assertions_failed, 1);
        assert_eq!(result.assertions_passed, 1);
        assert_eq!(result.failures, vec!["step 2: assert:contains:On branch"]);
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn test_fail_fast_stops_after_first_failure() {
        let mut runner = runner(RepositoryState::default(), true);
        runner
            .load_events("assert:state:initialized=true;git init;assert:state:initialized=true")
            .unwrap();
        let result = runner.run();
        assert_eq!(result.events_executed, 1);
        assert!(!result.state.initialized);
    }

    #[test]
    fn test_resolve_payload_reaches_conflict_session() {
        let mut runner = runner(scenario::preset("conflict").unwrap(), false);
        runner
            .load_script_text(
                "git merge feature-a\n\
                 assert:state:session=conflict\n\
                 resolve:port=8080\n\
                 git add config.txt\n\
                 assert:state:session=none\n\
                 git commit -m \"Merge feature-a\"\n\
                 assert:state:mergeInProgress=null\n",
            )
            .unwrap();
        let result = runner.run();
        assert_eq!(result.failures, Vec::<String>::new());
        assert_eq!(result.state.files["config.txt"], "port=8080");
    }

    #[test]
    fn test_clear_wipes_transcript() {
        let mut runner = runner(RepositoryState::default(), false);
        runner.load_events("pwd;clear;pwd").unwrap();
        let result = runner.run();
        let inputs: Vec<_> = result
            .transcript
            .iter()
            .filter(|l| l.kind == LineKind::Input)
            .collect();
        assert_eq!(inputs.len(), 1);
        assert_eq!(result.steps.len(), 3);
    }
}
