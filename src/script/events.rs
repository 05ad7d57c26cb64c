//! Event DSL for scripted runs.
//!
//! One event per line: a bare command line, `resolve:<text>`, `todo:<text>`
//! or `assert:<kind>:<arg>`. `\n` and `\t` in `resolve:`/`todo:` text are
//! expanded so multi-line buffers fit on one line.

use std::fmt;

use regex::Regex;

use crate::error::{GitGymError, Result};
use crate::repo::RepositoryState;

/// An assertion about the last command's output or the snapshot.
#[derive(Debug, Clone)]
pub enum Assertion {
    /// Output contains text (case-sensitive).
    Contains(String),
    /// Output does not contain text.
    NotContains(String),
    /// Output matches a regex.
    Matches(Regex),
    /// A snapshot field renders as `value`.
    StateEquals { field: String, value: String },
}

impl Assertion {
    /// Checks the assertion against the output text and the snapshot.
    pub fn check(&self, output: &str, state: &RepositoryState) -> bool {
        match self {
            Self::Contains(text) => output.contains(text.as_str()),
            Self::NotContains(text) => !output.contains(text.as_str()),
            Self::Matches(re) => re.is_match(output),
            Self::StateEquals { field, value } => {
                state_field(state, field).as_deref() == Some(value.as_str())
            }
        }
    }
}

/// Renders a snapshot field for `assert:state:`.
///
/// A few derived names are understood directly; anything else is looked up
/// as a top-level key of the JSON snapshot, with collections rendering as
/// their length.
pub fn state_field(state: &RepositoryState, field: &str) -> Option<String> {
    let derived = match field {
        "branch" => Some(state.current_branch.clone()),
        "head" => Some(
            state
                .head_commit()
                .map(|c| c.short_hash().to_string())
                .unwrap_or_default(),
        ),
        "detached" => Some(state.detached_head().to_string()),
        "session" => Some(state.session.label().to_string()),
        "commit_count" => Some(state.commits.len().to_string()),
        "staged_count" => Some(state.staged_files.len().to_string()),
        "stash_count" => Some(state.stash.len().to_string()),
        "last_message" => state.commits.last().map(|c| c.message.clone()),
        _ => None,
    };
    if derived.is_some() {
        return derived;
    }

    let json = serde_json::to_value(state).ok()?;
    match json.get(field)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => Some(items.len().to_string()),
        serde_json::Value::Object(map) => Some(map.len().to_string()),
        serde_json::Value::Null => Some("null".to_string()),
        other => Some(other.to_string()),
    }
}

/// A parsed script event.
#[derive(Debug, Clone)]
pub enum Event {
    /// A line typed at the terminal.
    Command(String),
    /// New text for the conflict editor.
    Resolve(String),
    /// New text for the rebase todo editor.
    Todo(String),
    /// A check on the last output or the snapshot.
    Assert(Assertion),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(line) => write!(f, "{line}"),
            Self::Resolve(text) => write!(f, "resolve:{}", escape(text)),
            Self::Todo(text) => write!(f, "todo:{}", escape(text)),
            Self::Assert(a) => match a {
                Assertion::Contains(t) => write!(f, "assert:contains:{t}"),
                Assertion::NotContains(t) => write!(f, "assert:not-contains:{t}"),
                Assertion::Matches(re) => write!(f, "assert:matches:{}", re.as_str()),
                Assertion::StateEquals { field, value } => {
                    write!(f, "assert:state:{field}={value}")
                }
            },
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parser for the event DSL.
#[derive(Debug, Default)]
pub struct EventParser;

impl EventParser {
    /// Creates a new event parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses a script: one event per line, `#` starts a comment line.
    pub fn parse_script(&self, input: &str) -> Result<Vec<Event>> {
        input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| self.parse_one(line))
            .collect()
    }

    /// Parses `;`-separated inline events, as given to `--events`.
    pub fn parse_inline(&self, input: &str) -> Result<Vec<Event>> {
        input
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| self.parse_one(part))
            .collect()
    }

    /// Parses a single event.
    pub fn parse_one(&self, input: &str) -> Result<Event> {
        let input = input.trim();
        if let Some(text) = input.strip_prefix("resolve:") {
            return Ok(Event::Resolve(unescape(text)));
        }
        if let Some(text) = input.strip_prefix("todo:") {
            return Ok(Event::Todo(unescape(text)));
        }
        if let Some(body) = input.strip_prefix("assert:") {
            return self.parse_assert(body).map(Event::Assert);
        }
        Ok(Event::Command(input.to_string()))
    }

    fn parse_assert(&self, body: &str) -> Result<Assertion> {
        let (kind, arg) = body.split_once(':').ok_or_else(|| {
            GitGymError::script(format!(
                "Invalid assertion: '{body}'. Expected assert:<kind>:<argument>"
            ))
        })?;

        match kind {
            "contains" => Ok(Assertion::Contains(arg.to_string())),
            "not-contains" => Ok(Assertion::NotContains(arg.to_string())),
            "matches" => Regex::new(arg)
                .map(Assertion::Matches)
                .map_err(|e| GitGymError::script(format!("Invalid regex '{arg}': {e}"))),
            "state" => {
                let (field, value) = arg.split_once('=').ok_or_else(|| {
                    GitGymError::script(format!(
                        "Invalid state assertion: '{arg}'. Expected <field>=<value>"
                    ))
                })?;
                Ok(Assertion::StateEquals {
                    field: field.trim().to_string(),
                    value: value.trim().to_string(),
                })
            }
            other => Err(GitGymError::script(format!(
                "Unknown assertion kind: '{other}'. Valid kinds: contains, not-contains, matches, state"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario;

    #[test]
    fn test_parse_script_skips_comments() {
        let events = EventParser::new()
            .parse_script("# setup\ngit init\n\n  git status  \n")
            .unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], Event::Command(line) if line == "git status"));
    }

    #[test]
    fn test_parse_payload_events_unescape() {
        let parser = EventParser::new();
        match parser.parse_one("todo:pick aaa one\\nsquash bbb two").unwrap() {
            Event::Todo(text) => assert_eq!(text, "pick aaa one\nsquash bbb two"),
            other => panic!("unexpected {other:?}"),
        }
        match parser.parse_one("resolve:port=3000").unwrap() {
            Event::Resolve(text) => assert_eq!(text, "port=3000"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_inline_events() {
        let events = EventParser::new()
            .parse_inline("git init; git status ;assert:contains:No commits yet")
            .unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].to_string(), "assert:contains:No commits yet");
    }

    #[test]
    fn test_invalid_assertions() {
        let parser = EventParser::new();
        assert!(parser.parse_one("assert:bogus:x").is_err());
        assert!(parser.parse_one("assert:state:branch").is_err());
        assert!(parser.parse_one("assert:matches:(").is_err());
        assert!(parser.parse_one("assert:contains").is_err());
    }

    #[test]
    fn test_state_fields() {
        let state = scenario::preset("diverged").unwrap();
        assert_eq!(state_field(&state, "branch").as_deref(), Some("main"));
        assert_eq!(state_field(&state, "commit_count").as_deref(), Some("3"));
        assert_eq!(state_field(&state, "diverged").as_deref(), Some("true"));
        assert_eq!(state_field(&state, "currentBranch").as_deref(), Some("main"));
        assert_eq!(state_field(&state, "remotes").as_deref(), Some("1"));
        assert_eq!(state_field(&state, "session").as_deref(), Some("none"));
        assert_eq!(state_field(&state, "mergeInProgress").as_deref(), Some("null"));
        assert!(state_field(&state, "nonsense").is_none());
    }

    #[test]
    fn test_assertion_check() {
        let state = scenario::preset("initialized").unwrap();
        let output = "$ git status\nOn branch main\nNo commits yet";
        assert!(Assertion::Contains("No commits yet".into()).check(output, &state));
        assert!(Assertion::NotContains("fatal".into()).check(output, &state));
        assert!(Assertion::Matches(Regex::new(r"On branch \w+").unwrap()).check(output, &state));
        assert!(Assertion::StateEquals {
            field: "initialized".into(),
            value: "true".into()
        }
        .check(output, &state));
    }
}
