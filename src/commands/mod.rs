//! Command parsing and dispatch for gitgym.
//!
//! This module keeps parsing separate from execution: the router and the
//! flag grammar can be unit tested without a repository, and every handler
//! can be tested without the interpreter around it.

pub mod args;
pub mod definitions;
pub mod handlers;
pub mod help;
pub mod output;
pub mod router;
pub mod tokenizer;

pub use args::{Args, FlagSpec};
pub use definitions::{CommandCategory, CommandDef, Program, COMMANDS};
pub use handlers::{CommandContext, HandlerResult};
pub use output::{LineKind, OutputBuffer, OutputLine, SessionDirective};
pub use router::{Command, CommandRouter};
pub use tokenizer::{tokenize, Token};
