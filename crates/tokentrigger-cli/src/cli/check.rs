//! Form-value checks: `ttrig check ...` and `ttrig normalize`.

use anyhow::{Result, bail};
use clap::Subcommand;
use console::style;

use tokentrigger_core::validation::{
    Validation, check_credential_url, check_delay, check_job, check_target_url,
};
use tokentrigger_types::server_url::normalize_url;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum CheckCommand {
    /// Job name must not be blank.
    Job {
        #[arg(default_value = "")]
        value: String,
    },

    /// Quiet period must be blank or a non-negative integer.
    Delay {
        #[arg(default_value = "")]
        value: String,
    },

    /// Probe a target server URL. Blank means the configured root URL.
    Url {
        #[arg(default_value = "")]
        value: String,
    },

    /// URL a credential would be bound to.
    #[command(name = "credential-url")]
    CredentialUrl { value: String },
}

pub async fn check(state: &AppState, target: CheckCommand, json: bool) -> Result<()> {
    let (field, verdict) = match target {
        CheckCommand::Job { value } => ("job", check_job(&value)),
        CheckCommand::Delay { value } => ("delay", check_delay(&value)),
        CheckCommand::Url { value } => {
            let transport = state.transport();
            let verdict = check_target_url(
                &value,
                state.root_url.as_ref(),
                transport,
                transport.server_header(),
                true,
            )
            .await;
            ("url", verdict)
        }
        CheckCommand::CredentialUrl { value } => ("credential-url", check_credential_url(&value)),
    };

    report(field, &verdict, json);

    if verdict.is_error() {
        bail!("{field} check failed");
    }
    Ok(())
}

fn report(field: &str, verdict: &Validation, json: bool) {
    let (level, message) = match verdict {
        Validation::Ok(message) => ("ok", message.as_deref()),
        Validation::Warning(message) => ("warning", Some(message.as_str())),
        Validation::Error(message) => ("error", Some(message.as_str())),
    };

    if json {
        println!(
            "{}",
            serde_json::json!({"field": field, "level": level, "message": message})
        );
        return;
    }

    let mark = match verdict {
        Validation::Ok(_) => style("✓").green().bold(),
        Validation::Warning(_) => style("!").yellow().bold(),
        Validation::Error(_) => style("✗").red().bold(),
    };
    match message {
        Some(message) => println!("  {mark} {field}: {message}"),
        None => println!("  {mark} {field}"),
    }
}

/// Print the canonical form of `url`.
pub fn normalize(url: &str, json: bool) -> Result<()> {
    let normalized = normalize_url(url);
    if json {
        println!(
            "{}",
            serde_json::json!({
                "input": url,
                "normalized": normalized,
                "changed": normalized != url,
            })
        );
    } else {
        println!("{normalized}");
    }
    Ok(())
}
