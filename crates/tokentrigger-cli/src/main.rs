//! tokentrigger CLI entry point.
//!
//! Binary name: `ttrig`
//!
//! Parses CLI arguments, loads configuration and the credential store, then
//! dispatches to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use cli::credential::CredentialCommand;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,tokentrigger=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let command = match cli.command {
        // Commands that don't need app state
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "ttrig", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Normalize { url } => {
            cli::check::normalize(&url, cli.json)?;
            return Ok(());
        }
        command => command,
    };

    let state = AppState::init(cli.root_url.as_deref()).await?;

    match command {
        Commands::Trigger(args) => {
            cli::trigger::trigger(&state, args, cli.json).await?;
        }

        Commands::Credential { action } => match action {
            CredentialCommand::Add {
                id,
                url,
                description,
                scope,
                token,
            } => {
                cli::credential::add_credential(
                    &state,
                    &id,
                    &url,
                    &description,
                    scope,
                    token.as_deref(),
                    cli.json,
                )
                .await?;
            }
            CredentialCommand::List { url } => {
                cli::credential::list_credentials(&state, url.as_deref(), cli.json).await?;
            }
            CredentialCommand::Remove { id, scope } => {
                cli::credential::remove_credential(&state, &id, scope, cli.json).await?;
            }
        },

        Commands::Check { target } => {
            cli::check::check(&state, target, cli.json).await?;
        }

        Commands::Completions { .. } | Commands::Normalize { .. } => {}
    }

    Ok(())
}
