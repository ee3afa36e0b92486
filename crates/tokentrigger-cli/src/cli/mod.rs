//! CLI command definitions for the `ttrig` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun where there is more than one verb (`ttrig credential add`).

pub mod check;
pub mod credential;
pub mod log_sink;
pub mod trigger;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Trigger parameterized jobs on remote build servers with build tokens.
#[derive(Parser)]
#[command(name = "ttrig", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Root URL of this server, used when no target URL is given.
    /// Overrides `root_url` in config.toml.
    #[arg(long, global = true, env = "TOKENTRIGGER_ROOT_URL", value_name = "URL")]
    pub root_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trigger a job on a remote build server.
    Trigger(trigger::TriggerArgs),

    /// Manage build-token credentials.
    #[command(alias = "cred")]
    Credential {
        #[command(subcommand)]
        action: credential::CredentialCommand,
    },

    /// Validate a single form value.
    Check {
        #[command(subcommand)]
        target: check::CheckCommand,
    },

    /// Print the normalized form of a server URL.
    Normalize {
        /// URL to normalize.
        url: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
