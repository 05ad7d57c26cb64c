//! Error types for gitgym.
//!
//! Two layers live here: [`GitGymError`] for the binary and the loaders that
//! touch the real filesystem, and [`CommandError`] for failures inside the
//! simulated terminal. A `CommandError` never crosses the interpreter
//! boundary; the dispatcher renders it as an `error` output line.

use thiserror::Error;

/// Main error type for gitgym operations outside the interpreter.
#[derive(Error, Debug)]
pub enum GitGymError {
    /// Configuration errors (invalid config file, bad values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Scenario snapshot errors (unreadable file, malformed JSON/TOML, unknown preset).
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// Script errors (unknown event, malformed assertion).
    #[error("Script error: {0}")]
    Script(String),

    /// I/O errors reading scripts or writing reports.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GitGymError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a scenario error with the given message.
    pub fn scenario(msg: impl Into<String>) -> Self {
        Self::Scenario(msg.into())
    }

    /// Creates a script error with the given message.
    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    /// Creates an I/O error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Scenario(_) => "Scenario Error",
            Self::Script(_) => "Script Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

impl From<std::io::Error> for GitGymError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias using GitGymError.
pub type Result<T> = std::result::Result<T, GitGymError>;

/// A failed simulated command.
///
/// The `Display` output is exactly what the learner sees in the terminal,
/// so each variant carries git's own prefix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A git command was run outside an initialized repository.
    #[error("fatal: not a git repository (or any of the parent directories): .git")]
    NotARepository,

    /// The verb did not match any known command.
    #[error("{0}")]
    Unrecognized(String),

    /// A `fatal:` precondition failure.
    #[error("fatal: {0}")]
    Fatal(String),

    /// An `error:` precondition failure.
    #[error("error: {0}")]
    Error(String),

    /// Bad flags or missing arguments.
    #[error("{0}")]
    Usage(String),

    /// The simulated remote refused the update.
    #[error("{0}")]
    Rejected(String),
}

impl CommandError {
    /// Creates a `fatal:` error.
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Creates an `error:` error.
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    /// Creates a usage error.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Creates a remote rejection.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Creates the unknown-git-subcommand error.
    pub fn unknown_git(verb: &str) -> Self {
        Self::Unrecognized(format!(
            "git: '{verb}' is not a git command. See 'git --help'."
        ))
    }

    /// Creates the unknown-shell-command error.
    pub fn unknown_shell(verb: &str) -> Self {
        Self::Unrecognized(format!("{verb}: command not found"))
    }

    /// Returns a short label for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotARepository => "not-a-repository",
            Self::Unrecognized(_) => "unrecognized",
            Self::Fatal(_) | Self::Error(_) => "precondition",
            Self::Usage(_) => "usage",
            Self::Rejected(_) => "rejected",
        }
    }
}
