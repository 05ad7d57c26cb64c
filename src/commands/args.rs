//! Declarative per-command flag grammar.
//!
//! Each command lists the flags it understands as [`FlagSpec`]s; [`Args`]
//! resolves tokens against that list so handlers only ever look flags up
//! by their canonical name.

use std::collections::BTreeMap;

use super::tokenizer::Token;
use crate::error::CommandError;

/// One flag a command accepts.
#[derive(Debug, Clone, Copy)]
pub struct FlagSpec {
    /// Canonical name used by handlers.
    pub name: &'static str,
    /// Single-letter alias, if any.
    pub short: Option<char>,
    /// Long spellings (without the leading `--`).
    pub long: &'static [&'static str],
    /// Whether the flag consumes a value.
    pub takes_value: bool,
    /// Parsed and then dropped: the flag asks for what the command does anyway.
    pub redundant: bool,
}

impl FlagSpec {
    /// A boolean flag.
    pub const fn switch(
        name: &'static str,
        short: Option<char>,
        long: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            short,
            long,
            takes_value: false,
            redundant: false,
        }
    }

    /// A flag that takes a value.
    pub const fn value(
        name: &'static str,
        short: Option<char>,
        long: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            short,
            long,
            takes_value: true,
            redundant: false,
        }
    }

    /// A long switch git accepts that only restates the default behaviour.
    pub const fn redundant(name: &'static str, long: &'static [&'static str]) -> Self {
        Self {
            name,
            short: None,
            long,
            takes_value: false,
            redundant: true,
        }
    }
}

/// Resolved flags and positional arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    flags: BTreeMap<&'static str, Vec<String>>,
    /// Positional words, in order.
    pub positionals: Vec<String>,
    /// Flags no spec matched, in command-line form.
    pub unknown: Vec<String>,
    /// Whether a `--` separator was present.
    pub separator: bool,
}

impl Args {
    /// Resolves `tokens` against `specs`.
    pub fn parse(tokens: &[Token], specs: &[FlagSpec]) -> Result<Self, CommandError> {
        let mut args = Args::default();
        let mut iter = tokens.iter().peekable();

        while let Some(token) = iter.next() {
            match token {
                Token::Separator => {
                    args.separator = true;
                    args.positionals.extend(iter.by_ref().map(Token::to_arg));
                }
                Token::Word(word) => args.positionals.push(word.clone()),
                Token::LongFlag { name, value } => {
                    let Some(spec) = specs.iter().find(|s| s.long.contains(&name.as_str())) else {
                        args.unknown.push(token.to_arg());
                        continue;
                    };
                    let value = match (spec.takes_value, value) {
                        (false, _) => String::new(),
                        (true, Some(v)) => v.clone(),
                        (true, None) => match iter.next_if(|t| matches!(t, Token::Word(_))) {
                            Some(Token::Word(v)) => v.clone(),
                            _ => {
                                return Err(CommandError::usage(format!(
                                    "error: option `{name}' requires a value"
                                )))
                            }
                        },
                    };
                    if !spec.redundant {
                        args.flags.entry(spec.name).or_default().push(value);
                    }
                }
                Token::ShortFlags(cluster) => {
                    for (idx, c) in cluster.char_indices() {
                        let Some(spec) = specs.iter().find(|s| s.short == Some(c)) else {
                            args.unknown.push(format!("-{c}"));
                            continue;
                        };
                        if !spec.takes_value {
                            args.flags.entry(spec.name).or_default().push(String::new());
                            continue;
                        }
                        let rest = &cluster[idx + c.len_utf8()..];
                        let value = if !rest.is_empty() {
                            rest.to_string()
                        } else {
                            match iter.next_if(|t| matches!(t, Token::Word(_))) {
                                Some(Token::Word(v)) => v.clone(),
                                _ => {
                                    return Err(CommandError::usage(format!(
                                        "error: switch `{c}' requires a value"
                                    )))
                                }
                            }
                        };
                        args.flags.entry(spec.name).or_default().push(value);
                        break;
                    }
                }
            }
        }

        Ok(args)
    }

    /// Whether the flag was given at least once.
    pub fn has(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// The last value given for the flag.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.flags
            .get(name)
            .and_then(|v| v.last())
            .map(String::as_str)
    }

    /// Every value given for the flag, in order.
    pub fn values(&self, name: &str) -> &[String] {
        self.flags.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Positional argument at `idx`.
    pub fn positional(&self, idx: usize) -> Option<&str> {
        self.positionals.get(idx).map(String::as_str)
    }

    /// The first positional argument, treated as a sub-verb.
    pub fn subcommand(&self) -> Option<&str> {
        self.positional(0)
    }

    /// Positional arguments after the sub-verb.
    pub fn rest(&self) -> &[String] {
        self.positionals.get(1..).unwrap_or(&[])
    }
}
