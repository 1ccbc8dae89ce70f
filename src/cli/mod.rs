//! CLI module
//!
//! Command-line interface for fetching paginated APIs.
//!
//! # Commands
//!
//! - `get` - Fetch a URL, optionally following pagination links
//! - `validate` - Check a client configuration file

mod commands;
mod runner;

pub use commands::{Cli, Commands, GetArgs, OutputFormat};
pub use runner::Runner;
