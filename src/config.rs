//! Configuration management for gitgym.
//!
//! Handles loading configuration from a TOML file. Every key is optional;
//! a missing file or a missing section falls back to the defaults below.

use crate::error::{GitGymError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for gitgym.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Settings the interpreter reads while executing commands.
    #[serde(default)]
    pub interpreter: InterpreterSettings,

    /// Settings for the interactive terminal.
    #[serde(default)]
    pub cli: CliSettings,
}

/// Interpreter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterpreterSettings {
    /// Branch created by `init` and `clone`.
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Author recorded on new commits unless `user.name` is configured.
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Email shown in the full `log` format.
    #[serde(default = "default_user_email")]
    pub user_email: String,

    /// Directory printed by `pwd`.
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Length of generated commit hashes.
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,
}

fn default_branch() -> String {
    crate::repo::DEFAULT_BRANCH.to_string()
}

fn default_user_name() -> String {
    "Learner".to_string()
}

fn default_user_email() -> String {
    "learner@example.com".to_string()
}

fn default_workdir() -> String {
    "/home/learner/project".to_string()
}

fn default_hash_length() -> usize {
    7
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            user_name: default_user_name(),
            user_email: default_user_email(),
            workdir: default_workdir(),
            hash_length: default_hash_length(),
        }
    }
}

/// Interactive terminal settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliSettings {
    /// Prompt printed before each command.
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Whether `input` records are printed back.
    #[serde(default = "default_echo_input")]
    pub echo_input: bool,
}

fn default_prompt() -> String {
    "$".to_string()
}

fn default_echo_input() -> bool {
    true
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            echo_input: default_echo_input(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gitgym")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GitGymError::config(format!("Failed to read config file: {e}")))?;

        let config = Self::parse_toml(&content, path)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            GitGymError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Rejects values the interpreter cannot work with.
    pub fn validate(&self) -> Result<()> {
        let settings = &self.interpreter;
        if !(4..=40).contains(&settings.hash_length) {
            return Err(GitGymError::config(format!(
                "invalid value for 'hash_length': {} (expected 4..=40)",
                settings.hash_length
            )));
        }
        if settings.default_branch.trim().is_empty()
            || settings.default_branch.contains(char::is_whitespace)
        {
            return Err(GitGymError::config(format!(
                "invalid value for 'default_branch': '{}'",
                settings.default_branch
            )));
        }
        Ok(())
    }
}
