//! Configuration, commands and HTTP trigger for the `bookingsync` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod secret;
pub mod setup;

pub use cli::Cli;
pub use error::{CliError, CliResult};
