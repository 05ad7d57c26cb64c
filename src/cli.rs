//! Command-line argument parsing for gitgym.

use crate::error::{GitGymError, Result};
use crate::repo::RepositoryState;
use crate::scenario;
use crate::script::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// A simulated git terminal for practising version control.
#[derive(Parser, Debug)]
#[command(name = "gitgym")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Starting snapshot (JSON, or TOML when the file ends in .toml)
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Named starting snapshot (empty, initialized, conflict, squash, diverged)
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // === Scripted mode options ===
    /// Path to a script file with events (use "-" for stdin)
    #[arg(long, value_name = "PATH", conflicts_with = "events")]
    pub script: Option<String>,

    /// Semicolon-separated events (e.g., "git init;assert:state:initialized=true")
    #[arg(long, value_name = "EVENTS")]
    pub events: Option<String>,

    /// Report format for scripted runs
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Stop on first assertion failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Seed for repeatable commit hashes
    #[arg(long, value_name = "N", env = "GITGYM_SEED")]
    pub seed: Option<u64>,

    /// Write logs to the state directory instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Returns true if events come from --script or --events.
    pub fn is_scripted(&self) -> bool {
        self.script.is_some() || self.events.is_some()
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Validates scripted mode arguments.
    pub fn validate_script(&self) -> std::result::Result<(), String> {
        if !self.is_scripted() {
            if self.fail_fast {
                return Err("--fail-fast requires --events or --script".to_string());
            }
            return Ok(());
        }
        self.parse_output_format()?;
        Ok(())
    }

    /// Builds the starting snapshot from --scenario or --preset.
    ///
    /// Without either, the session starts outside any repository.
    pub fn initial_state(&self) -> Result<RepositoryState> {
        if let Some(path) = &self.scenario {
            return scenario::load(path);
        }
        match &self.preset {
            Some(name) => scenario::preset(name),
            None => Ok(RepositoryState::default()),
        }
    }

    /// Validates everything and returns the parsed output format.
    pub fn script_format(&self) -> Result<OutputFormat> {
        self.validate_script().map_err(GitGymError::config)?;
        self.parse_output_format().map_err(GitGymError::config)
    }
}
