//! Credential management CLI commands: add, list, remove.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Password;
use secrecy::SecretString;

use tokentrigger_core::context::LookupContext;
use tokentrigger_core::validation::{Validation, check_credential_url};
use tokentrigger_types::credential::{Credential, CredentialId, CredentialScope, mask_secret};
use tokentrigger_types::error::RepositoryError;

use crate::state::AppState;

/// Credential management subcommands.
#[derive(Subcommand)]
pub enum CredentialCommand {
    /// Store a build token bound to a target server.
    Add {
        /// Credential id, unique within its scope.
        id: String,

        /// Server the token is valid for. Stored normalized.
        #[arg(long)]
        url: String,

        #[arg(long, default_value = "")]
        description: String,

        /// global (usable by triggers) or system (host only).
        #[arg(long, default_value_t = CredentialScope::Global)]
        scope: CredentialScope,

        /// Token value (optional; prompts if omitted).
        #[arg(long)]
        token: Option<String>,
    },

    /// List stored credentials (tokens masked).
    #[command(alias = "ls")]
    List {
        /// Only credentials usable against this server URL.
        #[arg(long)]
        url: Option<String>,
    },

    /// Remove a credential.
    #[command(alias = "rm")]
    Remove {
        id: String,

        #[arg(long, default_value_t = CredentialScope::Global)]
        scope: CredentialScope,
    },
}

/// Store a build-token credential.
///
/// # Examples
///
/// ```bash
/// # Secure prompt (recommended)
/// ttrig credential add remote-ci --url https://ci.example.org
///
/// # Script/automation mode
/// ttrig credential add remote-ci --url https://ci.example.org --token abc123
/// ```
pub async fn add_credential(
    state: &AppState,
    id: &str,
    url: &str,
    description: &str,
    scope: CredentialScope,
    token: Option<&str>,
    json: bool,
) -> Result<()> {
    if id.trim().is_empty() {
        bail!("credential id must not be blank");
    }

    match check_credential_url(url) {
        Validation::Error(message) => bail!("invalid URL '{url}': {message}"),
        Validation::Warning(message) if !json => {
            println!("  {} {message}", style("!").yellow().bold());
        }
        _ => {}
    }

    let token = match token {
        Some(t) => t.to_string(),
        None => Password::new()
            .with_prompt(format!("Enter build token for {}", style(id).bold()))
            .interact()?,
    };
    let masked = mask_secret(&SecretString::from(token.clone()));

    let credential = Credential::build_token(scope, id, description, url, token);
    let bound_url = credential
        .target_url()
        .map(|u| u.to_string())
        .unwrap_or_default();
    state.credentials().save(credential).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "added": true,
                "id": id,
                "scope": scope.to_string(),
                "target_url": bound_url,
                "masked": masked,
            })
        );
    } else {
        println!(
            "  {} Credential '{}' bound to {} ({})",
            style("✓").green().bold(),
            style(id).bold(),
            style(&bound_url).cyan(),
            masked
        );
    }

    Ok(())
}

/// List credentials, optionally only those usable against `url`.
pub async fn list_credentials(state: &AppState, url: Option<&str>, json: bool) -> Result<()> {
    let service = state.credentials();

    if let Some(url) = url {
        let items = service.list_for_url(&LookupContext::System, url).await?;
        if json {
            let items: Vec<_> = items
                .iter()
                .map(|item| serde_json::json!({"id": item.id, "description": item.description}))
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }
        if items.is_empty() {
            println!();
            println!(
                "  {} No credentials bound to {}",
                style("i").blue().bold(),
                style(url).yellow()
            );
            println!();
            return Ok(());
        }
        for item in &items {
            println!("  {}  {}", style(&item.id).cyan(), item.description);
        }
        return Ok(());
    }

    let credentials = service.list(&LookupContext::System).await?;

    if json {
        let entries: Vec<_> = credentials
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.id,
                    "scope": c.scope,
                    "kind": c.kind.name(),
                    "target_url": c.target_url(),
                    "description": c.description,
                    "masked": mask_secret(c.kind.secret()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if credentials.is_empty() {
        println!();
        println!(
            "  {} No credentials stored. Add one with: {}",
            style("i").blue().bold(),
            style("ttrig credential add <id> --url <server>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Scope").fg(Color::White),
        Cell::new("Target URL").fg(Color::White),
        Cell::new("Token").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);

    for credential in &credentials {
        let target = credential
            .target_url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| format!("({})", credential.kind.name()));
        table.add_row(vec![
            Cell::new(&credential.id).fg(Color::Cyan),
            Cell::new(credential.scope.to_string()),
            Cell::new(target),
            Cell::new(mask_secret(credential.kind.secret())).fg(Color::DarkGrey),
            Cell::new(&credential.description),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} credential{}",
        style(credentials.len()).bold(),
        if credentials.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

pub async fn remove_credential(
    state: &AppState,
    id: &str,
    scope: CredentialScope,
    json: bool,
) -> Result<()> {
    let credential_id = CredentialId::new(id);
    match state.credentials().remove(scope, &credential_id).await {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => bail!("no credential '{id}' in {scope} scope"),
        Err(e) => return Err(e).context(format!("failed to remove credential '{id}'")),
    }

    if json {
        println!("{}", serde_json::json!({"removed": true, "id": id, "scope": scope.to_string()}));
    } else {
        println!(
            "  {} Credential '{}' removed from {} scope",
            style("✓").green().bold(),
            style(id).bold(),
            scope
        );
    }
    Ok(())
}
