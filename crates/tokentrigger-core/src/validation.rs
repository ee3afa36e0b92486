//! Form-field validation for trigger steps and credentials.
//!
//! Each check returns a [`Validation`] verdict suitable for showing next to
//! the field it validates. Checks never fail with an error type: a bad value
//! is a `Validation::Error`, not an `Err`.

use std::fmt;

use tokentrigger_types::server_url::ServerUrl;

use crate::trigger::transport::ServerProbe;

/// Verdict of a single field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Acceptable, optionally with an informational message.
    Ok(Option<String>),
    /// Acceptable but probably not what the user wants.
    Warning(String),
    Error(String),
}

impl Validation {
    pub fn ok() -> Self {
        Validation::Ok(None)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Validation::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Validation::Ok(message) => message.as_deref(),
            Validation::Warning(message) | Validation::Error(message) => Some(message),
        }
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Ok(None) => write!(f, "ok"),
            Validation::Ok(Some(message)) => write!(f, "ok: {message}"),
            Validation::Warning(message) => write!(f, "warning: {message}"),
            Validation::Error(message) => write!(f, "error: {message}"),
        }
    }
}

pub fn check_job(value: &str) -> Validation {
    if value.trim().is_empty() {
        return Validation::Error("Must specify job to trigger".to_string());
    }
    Validation::ok()
}

/// Quiet period: blank is fine, otherwise a non-negative integer.
pub fn check_delay(value: &str) -> Validation {
    if value.trim().is_empty() {
        return Validation::ok();
    }
    match value.trim().parse::<i64>() {
        Ok(delay) if delay < 0 => {
            Validation::Error("Quiet period cannot be a negative number".to_string())
        }
        Ok(_) => Validation::ok(),
        Err(e) => Validation::Error(format!("For input string \"{value}\": {e}")),
    }
}

/// URL a credential is bound to. Warns when the stored form will differ.
pub fn check_credential_url(value: &str) -> Validation {
    let normalized = ServerUrl::new(value);
    if let Err(e) = normalized.to_url() {
        return Validation::Error(e.to_string());
    }
    if ServerUrl::requires_normalization(value) {
        Validation::Warning(format!("Will be normalized to {normalized}"))
    } else {
        Validation::ok()
    }
}

/// Target server URL of a step.
///
/// Only callers allowed to configure the step get a real answer; for anyone
/// else the check passes without touching the network. A non-blank value is
/// probed with a GET and must answer with `server_header` set.
pub async fn check_target_url<P: ServerProbe>(
    value: &str,
    root_url: Option<&ServerUrl>,
    probe: &P,
    server_header: &str,
    can_configure: bool,
) -> Validation {
    if !can_configure {
        return Validation::ok();
    }

    if value.trim().is_empty() {
        return match root_url.filter(|url| !url.is_blank()) {
            Some(root) => Validation::Warning(format!("Will assume {root} as the target URL")),
            None => Validation::Error(
                "No target URL specified and no root URL is configured, so there is no default to use"
                    .to_string(),
            ),
        };
    }

    let url = ServerUrl::new(value);
    if let Err(e) = url.to_url() {
        return Validation::Error(e.to_string());
    }

    match probe.probe(&url).await {
        Ok(response) => match response.server_header.filter(|v| !v.trim().is_empty()) {
            Some(version) => Validation::Ok(Some(format!("Server version: {version}"))),
            None => Validation::Warning(format!(
                "Does not look like a compatible build server, expecting {server_header} header"
            )),
        },
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "target URL probe failed");
            Validation::Error(e.to_string())
        }
    }
}
