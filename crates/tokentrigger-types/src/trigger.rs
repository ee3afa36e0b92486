//! Trigger step configuration and the outbound request it produces.
//!
//! A [`TriggerStep`] is the immutable configuration of one "trigger a remote
//! job" step. At execution time it is combined with a resolved server URL and
//! a credential into a [`TriggerRequest`], which knows how to render the
//! trigger endpoint and the `application/x-www-form-urlencoded` body.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::credential::CredentialId;
use crate::server_url::ServerUrl;

// ---------------------------------------------------------------------------
// TriggerStep
// ---------------------------------------------------------------------------

/// Configuration of a single trigger step.
///
/// Parameters live in a `BTreeMap` so iteration is always sorted by key,
/// which keeps request bodies reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerStep {
    /// Explicit target server; `None` means "use the host's root URL".
    pub target_url: Option<ServerUrl>,
    /// Slash-separated job path on the target server (e.g. `folder/job`).
    pub job: String,
    pub credentials_id: CredentialId,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Quiet period in seconds; `None` leaves the target's default in place.
    #[serde(default)]
    pub delay: Option<u32>,
}

impl TriggerStep {
    pub fn new(job: impl Into<String>, credentials_id: impl Into<String>) -> Self {
        Self {
            target_url: None,
            job: job.into(),
            credentials_id: CredentialId::new(credentials_id),
            parameters: BTreeMap::new(),
            delay: None,
        }
    }

    /// Set the target URL override. Blank input clears it.
    pub fn with_target_url(mut self, raw: &str) -> Self {
        self.target_url = ServerUrl::from_optional(Some(raw));
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_parameters<K, V>(mut self, parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters
            .extend(parameters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_delay(mut self, delay: Option<u32>) -> Self {
        self.delay = delay;
        self
    }

    /// Parameters as an ordered list of entries, sorted by key.
    pub fn parameters_list(&self) -> Vec<ParameterEntry> {
        self.parameters
            .iter()
            .map(|(key, value)| ParameterEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

/// One `key = value` pair as entered in a configuration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Raw, unvalidated step configuration as submitted by a form or file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerStepForm {
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub credentials_id: String,
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
    #[serde(default)]
    pub delay: String,
}

impl From<TriggerStepForm> for TriggerStep {
    /// Entries with an empty key are dropped (later duplicates win) and the
    /// delay is parsed permissively via [`parse_delay`].
    fn from(form: TriggerStepForm) -> Self {
        let parameters = form
            .parameters
            .into_iter()
            .filter(|entry| !entry.key.is_empty())
            .map(|entry| (entry.key, entry.value));

        TriggerStep::new(form.job, form.credentials_id)
            .with_target_url(&form.target_url)
            .with_parameters(parameters)
            .with_delay(parse_delay(&form.delay))
    }
}

/// Parse a quiet-period value. Blank, non-numeric and negative values are
/// treated as absent rather than rejected.
pub fn parse_delay(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<i64>()
        .ok()
        .filter(|delay| *delay >= 0)
        .and_then(|delay| u32::try_from(delay).ok())
}

// ---------------------------------------------------------------------------
// TriggerRequest
// ---------------------------------------------------------------------------

/// A fully resolved trigger request, built fresh for every execution.
#[derive(Debug)]
pub struct TriggerRequest {
    pub job: String,
    pub server_url: ServerUrl,
    pub parameters: BTreeMap<String, String>,
    pub delay: Option<u32>,
    token: SecretString,
}

impl TriggerRequest {
    pub fn new(step: &TriggerStep, server_url: ServerUrl, token: &SecretString) -> Self {
        Self {
            job: step.job.clone(),
            server_url,
            parameters: step.parameters.clone(),
            delay: step.delay,
            token: SecretString::from(token.expose_secret().to_owned()),
        }
    }

    /// The token-authenticated trigger endpoint.
    ///
    /// `buildWithParameters` when any parameter is set, `build` otherwise.
    pub fn endpoint(&self) -> String {
        let action = if self.parameters.is_empty() {
            "build"
        } else {
            "buildWithParameters"
        };
        format!("{}/buildByToken/{action}", self.server_url)
    }

    /// Browser URL of the job, for display only.
    ///
    /// `folder/sub/job` on `https://ci` renders as
    /// `https://ci/job/folder/job/sub/job/job`.
    pub fn job_url(&self) -> String {
        let base = self.server_url.as_str();
        let base = base.strip_suffix('/').unwrap_or(base);
        let path = self.job.strip_suffix('/').unwrap_or(&self.job);
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{base}/job/{}", path.replace('/', "/job/"))
    }

    /// Form-encoded body: `job`, `token`, optional `delay`, then every
    /// parameter in ascending key order.
    pub fn encode_body(&self) -> String {
        let mut body = String::new();
        body.push_str("job=");
        body.push_str(&form_encode(&self.job));
        body.push_str("&token=");
        body.push_str(&form_encode(self.token.expose_secret()));
        if let Some(delay) = self.delay {
            body.push_str(&format!("&delay={delay}"));
        }
        for (key, value) in &self.parameters {
            body.push('&');
            body.push_str(&form_encode(key));
            body.push('=');
            body.push_str(&form_encode(value));
        }
        body
    }
}

fn form_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

// ---------------------------------------------------------------------------
// TriggerOutcome
// ---------------------------------------------------------------------------

/// Result of a completed trigger attempt.
///
/// Any status other than 404 counts as a completed attempt; deciding whether
/// e.g. a 403 is acceptable is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerOutcome {
    pub status: u16,
    pub endpoint: String,
    pub job_url: String,
}
