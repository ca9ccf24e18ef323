//! CLI argument models for the Slack relay binary.
//!
//! Every flag falls back to an environment variable so the bot can be
//! configured from a `.env` file.

pub mod cli_args;
pub mod cli_types;

pub use cli_args::Cli;
pub use cli_types::*;
