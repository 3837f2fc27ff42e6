//! Command-line interface for the `mango` binary.

use clap::{Parser, Subcommand};

/// mango: single-user credential vault over HTTP.
#[derive(Parser, Debug)]
#[command(name = "mango")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server. This is the default when no command is given.
    Serve,

    /// Print a freshly generated ENCRYPTION_KEY as 64 hex characters.
    Keygen,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}
