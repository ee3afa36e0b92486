//! `ttrig trigger` -- run one trigger step from the command line.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use console::style;

use tokentrigger_core::context::{ExecutionContext, RunIdentity};
use tokentrigger_core::validation::{Validation, check_delay};
use tokentrigger_types::trigger::{ParameterEntry, TriggerStep, TriggerStepForm};

use crate::cli::log_sink::ConsoleLogSink;
use crate::state::AppState;

#[derive(Args)]
pub struct TriggerArgs {
    /// Job path on the target server (e.g. folder/deploy).
    pub job: String,

    /// Id of the build-token credential to authenticate with.
    #[arg(long, short = 'c', value_name = "ID")]
    pub credential: String,

    /// Target server URL. Defaults to the configured root URL.
    #[arg(long)]
    pub url: Option<String>,

    /// Build parameter (repeatable).
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Quiet period in seconds before the triggered build starts.
    #[arg(long, value_name = "SECONDS")]
    pub delay: Option<String>,

    /// Name of the run this trigger is performed for, as shown in logs.
    #[arg(long, default_value = "ttrig", value_name = "NAME")]
    pub run: String,

    /// Number of the run within its name, as shown in logs.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub run_number: u64,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, _)) if key.is_empty() => Err(format!("parameter '{raw}' has an empty name")),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn build_step(args: TriggerArgs) -> TriggerStep {
    TriggerStep::from(TriggerStepForm {
        target_url: args.url.unwrap_or_default(),
        job: args.job,
        credentials_id: args.credential,
        parameters: args
            .params
            .into_iter()
            .map(|(key, value)| ParameterEntry { key, value })
            .collect(),
        delay: args.delay.unwrap_or_default(),
    })
}

/// Trigger the job and report the status the target answered with.
///
/// Any status other than 404 is a completed trigger; the caller decides
/// whether e.g. 403 is acceptable.
pub async fn trigger(state: &AppState, args: TriggerArgs, json: bool) -> Result<()> {
    if let Some(delay) = args.delay.as_deref() {
        if let Validation::Error(message) = check_delay(delay) {
            tracing::warn!("ignoring delay '{delay}': {message}");
        }
    }

    let run = RunIdentity::new(args.run.clone(), args.run_number);
    let step = build_step(args);

    // Log lines go to stderr when stdout is reserved for JSON.
    let sink = if json {
        ConsoleLogSink::stderr()
    } else {
        ConsoleLogSink::stdout()
    };
    let ctx = ExecutionContext::new(run, Arc::new(sink));

    let outcome = state.executor().execute(&step, &ctx).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let status = if (200..300).contains(&outcome.status) {
        style(outcome.status).green().bold()
    } else {
        style(outcome.status).yellow().bold()
    };
    println!(
        "  {} Triggered {} (HTTP {status})",
        style("✓").green().bold(),
        style(&step.job).cyan(),
    );

    Ok(())
}
