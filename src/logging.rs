//! Tracing setup for the `gitgym` binary.
//!
//! Stdout belongs to the simulated terminal and the script reports, so
//! diagnostics never go there. They default to stderr at `warn`; with
//! `--log-file` they go to `gitgym.log` at `info`. `RUST_LOG` replaces the
//! default level for either sink.

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Where diagnostics are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    /// Truncated on every run; see [`log_path`].
    File,
}

impl LogSink {
    /// Picks the sink from the `--log-file` switch.
    pub fn from_flag(log_file: bool) -> Self {
        if log_file {
            Self::File
        } else {
            Self::Stderr
        }
    }

    fn default_level(self) -> &'static str {
        match self {
            Self::Stderr => "warn",
            Self::File => "info",
        }
    }
}

/// Installs the global subscriber for `sink`.
///
/// A log file that cannot be opened disables logging with a note on
/// stderr; the session itself still runs.
pub fn init(sink: LogSink) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(sink.default_level()));

    match sink {
        LogSink::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
        LogSink::File => match open_log_file() {
            Ok(file) => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init(),
            Err(e) => eprintln!(
                "gitgym: logging disabled, cannot open {}: {e}",
                log_path().display()
            ),
        },
    }
}

fn open_log_file() -> io::Result<File> {
    let path = log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    File::create(path)
}

/// `gitgym/gitgym.log` under the platform state directory, else the config
/// directory, else the temp directory.
pub fn log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("gitgym").join("gitgym.log"))
        .unwrap_or_else(|| std::env::temp_dir().join("gitgym.log"))
}
