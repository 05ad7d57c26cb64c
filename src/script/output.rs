//! Report formatting for scripted runs.

use serde::Serialize;

use super::ScriptResult;
use crate::commands::{LineKind, OutputLine};
use crate::repo::RepositoryState;

/// Report format for scripted runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The final terminal transcript plus a summary line.
    #[default]
    Text,
    /// Transcript, per-event steps, assertion results and the final snapshot.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid output format: '{}'. Valid formats: text, json",
                s
            )),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    transcript: &'a [OutputLine],
    steps: Vec<JsonStep<'a>>,
    events_executed: usize,
    duration_ms: u64,
    assertions: AssertionSummary<'a>,
    state: &'a RepositoryState,
}

#[derive(Debug, Serialize)]
struct JsonStep<'a> {
    number: usize,
    event: &'a str,
    lines: &'a [OutputLine],
    #[serde(skip_serializing_if = "Option::is_none")]
    passed: Option<bool>,
}

#[derive(Debug, Serialize)]
struct AssertionSummary<'a> {
    passed: usize,
    failed: usize,
    failures: &'a [String],
}

/// Formats script results.
pub struct ScriptOutput {
    format: OutputFormat,
}

impl ScriptOutput {
    /// Creates a new output formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result according to the configured format.
    pub fn format(&self, result: &ScriptResult) -> String {
        match self.format {
            OutputFormat::Text => self.format_text(result),
            OutputFormat::Json => self.format_json(result),
        }
    }

    fn format_text(&self, result: &ScriptResult) -> String {
        let mut out = String::new();
        for line in &result.transcript {
            match line.kind {
                LineKind::Error | LineKind::Warning => {
                    out.push_str(&format!("[{}] {}\n", line.kind.label(), line.text))
                }
                _ => {
                    out.push_str(&line.text);
                    out.push('\n');
                }
            }
        }

        let assertions = if result.assertions_passed > 0 || result.assertions_failed > 0 {
            format!(
                " | Assertions: {} passed, {} failed",
                result.assertions_passed, result.assertions_failed
            )
        } else {
            String::new()
        };
        out.push_str(&format!(
            "\nEvents: {} executed in {}ms{}\n",
            result.events_executed,
            result.duration.as_millis(),
            assertions
        ));
        for failure in &result.failures {
            out.push_str(&format!("FAILED: {failure}\n"));
        }
        out
    }

    fn format_json(&self, result: &ScriptResult) -> String {
        let json_output = JsonOutput {
            transcript: &result.transcript,
            steps: result
                .steps
                .iter()
                .map(|step| JsonStep {
                    number: step.number,
                    event: &step.event,
                    lines: &step.lines,
                    passed: step.passed,
                })
                .collect(),
            events_executed: result.events_executed,
            duration_ms: result.duration.as_millis() as u64,
            assertions: AssertionSummary {
                passed: result.assertions_passed,
                failed: result.assertions_failed,
                failures: &result.failures,
            },
            state: &result.state,
        };

        serde_json::to_string_pretty(&json_output)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
    }
}
