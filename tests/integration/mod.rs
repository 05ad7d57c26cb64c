//! Integration tests for gitgym.

pub mod cli_test;
pub mod common;
pub mod config_test;
pub mod properties_test;
pub mod remote_test;
pub mod script_test;
pub mod sessions_test;
