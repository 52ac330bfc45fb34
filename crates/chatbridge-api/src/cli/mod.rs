//! CLI command definitions for the `cbridge` binary.
//!
//! Uses clap derive macros for argument parsing. Running `cbridge` with no
//! subcommand starts an interactive chat.

pub mod chat;
pub mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use chatbridge_types::config::BridgeConfig;

/// Chat with a remote LLM while streaming replies to live listeners.
#[derive(Parser)]
#[command(name = "cbridge", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML configuration file (defaults to ./chatbridge.toml).
    #[arg(short, long, global = true, env = "CHATBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port for the inspection API and WebSocket server.
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Host to bind the server to.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Stream replies sentence by sentence instead of waiting for the whole reply.
    #[arg(long, global = true)]
    pub stream: bool,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed log output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    ///
    /// Spans are printed to stdout and interleave with chat replies.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server and an interactive chat (default).
    Chat {
        /// Language tag for prompts (en, fr, es, zh, ja, ko; `-auto` suffix allowed).
        #[arg(short, long)]
        lang: Option<String>,

        /// Skip the warm-up request at startup.
        #[arg(long)]
        no_warmup: bool,
    },

    /// Print the resolved configuration as TOML.
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Cli {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,chatbridge=debug",
            _ => "trace",
        }
    }

    /// Layer command-line flags over the file/environment configuration.
    pub fn apply_overrides(&self, mut config: BridgeConfig) -> BridgeConfig {
        if let Some(port) = self.port {
            config.api_port = port;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if self.stream {
            config.stream = true;
        }
        if let Some(Commands::Chat { no_warmup: true, .. }) = &self.command {
            config.warmup = false;
        }
        config
    }
}
