//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Session-backed chat service for a local or remote LLM.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: {data_dir}/config.toml).
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Send one message and print the reply.
    Chat {
        /// The message text.
        message: String,

        /// Continue an existing session instead of starting a new one.
        #[arg(long, short)]
        session: Option<String>,
    },

    /// Print the stored transcript of a session.
    Show {
        /// Session id returned by `chat` or `POST /api/chat`.
        session_id: String,
    },
}
