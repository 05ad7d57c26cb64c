//! Command parsing and routing for gitgym.
//!
//! Splits a command line into the program, the verb and the remaining tokens.
//! Flag resolution happens later against the verb's own grammar.

use super::tokenizer::{tokenize, Token};

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Nothing but whitespace.
    Empty,
    /// `git` with no verb.
    BareGit,
    /// `git <verb> ...`.
    Git { verb: String, tokens: Vec<Token> },
    /// `<verb> ...` for shell verbs.
    Shell { verb: String, tokens: Vec<Token> },
}

impl Command {
    /// The verb, if any.
    pub fn verb(&self) -> Option<&str> {
        match self {
            Self::Git { verb, .. } | Self::Shell { verb, .. } => Some(verb),
            Self::Empty | Self::BareGit => None,
        }
    }
}

/// Command router for parsing user input.
pub struct CommandRouter;

impl CommandRouter {
    /// Parse user input into a Command.
    pub fn parse(input: &str) -> Command {
        let mut tokens = tokenize(input.trim()).into_iter();

        let Some(first) = tokens.next() else {
            return Command::Empty;
        };

        if first.as_word() != Some("git") {
            return Command::Shell {
                verb: first.to_arg(),
                tokens: tokens.collect(),
            };
        }

        let Some(verb_token) = tokens.next() else {
            return Command::BareGit;
        };

        let verb = match &verb_token {
            Token::Word(w) => w.clone(),
            Token::LongFlag { name, .. } if name == "version" => "--version".to_string(),
            Token::ShortFlags(cluster) if cluster == "v" => "--version".to_string(),
            Token::LongFlag { name, .. } if name == "help" => "help".to_string(),
            Token::ShortFlags(cluster) if cluster == "h" => "help".to_string(),
            other => other.to_arg(),
        };

        Command::Git {
            verb,
            tokens: tokens.collect(),
        }
    }
}
