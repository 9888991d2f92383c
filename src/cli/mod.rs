//! Command-line interface for the gatekeeper service.

mod commands;

use clap::{Parser, Subcommand};

/// Gatekeeper - token authentication and permission service
#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Grant permission codes to a user
    Grant {
        /// Email address of the user
        email: String,
        /// Permission codes, e.g. movies:write
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

pub use commands::*;
