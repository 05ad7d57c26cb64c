//! gitgym - a simulated git terminal for learning version control.
//!
//! The core is [`interpreter::Interpreter`], a pure reducer from a command
//! line and a [`repo::RepositoryState`] snapshot to a new snapshot plus
//! terminal output. Everything else loads snapshots, drives the reducer
//! from a script or a REPL, or configures the ambient stack.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod logging;
pub mod repl;
pub mod repo;
pub mod scenario;
pub mod script;
pub mod session;

pub use error::{CommandError, GitGymError, Result};
pub use interpreter::{Interpreter, Outcome};
pub use repo::RepositoryState;
pub use session::{ActiveSession, SessionPayload};
