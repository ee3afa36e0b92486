//! Trigger executor.
//!
//! `TriggerExecutor` runs one trigger step as a single pass:
//!
//! 1. Resolve URL -- the step's own target, else the host root URL
//! 2. Resolve credential -- lookup by id for the execution's run
//! 3. Verify binding -- the credential must be bound to the resolved URL
//! 4. Build request -- endpoint + form body
//! 5. Send -- exactly one POST through the injected transport
//! 6. Interpret response -- 404 is a typed error, any other status is the result
//!
//! Every failure ends the execution with a [`TriggerError`]. Configuration
//! failures are raised before the transport is touched. Nothing is retried.

use chrono::Local;

use tokentrigger_types::credential::{Credential, CredentialId, TriggerCredentials};
use tokentrigger_types::error::TriggerError;
use tokentrigger_types::server_url::ServerUrl;
use tokentrigger_types::trigger::{TriggerOutcome, TriggerRequest, TriggerStep};

use crate::context::ExecutionContext;
use crate::repository::credential::CredentialStore;
use crate::service::credential::{CredentialMatcher, CredentialService, UrlRequirement};
use crate::trigger::transport::{FormPost, TriggerTransport};

/// HTTP status the target uses when the trigger endpoint or job does not exist.
const STATUS_NOT_FOUND: u16 = 404;

/// Executes trigger steps against remote build servers.
///
/// Holds no per-execution state; concurrent executions share only the
/// read-only credential store.
pub struct TriggerExecutor<S, T> {
    credentials: CredentialService<S>,
    transport: T,
    root_url: Option<ServerUrl>,
}

impl<S: CredentialStore, T: TriggerTransport> TriggerExecutor<S, T> {
    pub fn new(credentials: CredentialService<S>, transport: T) -> Self {
        Self {
            credentials,
            transport,
            root_url: None,
        }
    }

    /// The host's own root URL, used when a step names no target.
    pub fn with_root_url(mut self, root_url: Option<ServerUrl>) -> Self {
        self.root_url = root_url.filter(|url| !url.is_blank());
        self
    }

    /// Trigger the step's job and return the status the target answered with.
    pub async fn execute(
        &self,
        step: &TriggerStep,
        ctx: &ExecutionContext,
    ) -> Result<TriggerOutcome, TriggerError> {
        check_step(step)?;

        let target_url = self.resolve_url(step)?;
        let credential = self.resolve_credential(step, ctx, &target_url).await?;
        let binding = verify_binding(&step.credentials_id, &credential, &target_url)?;

        let request = TriggerRequest::new(step, target_url, binding.token());
        let post = FormPost::from(&request);
        let job_url = request.job_url();

        let link = ctx.log().hyperlink(&job_url, &request.job);
        ctx.log().line(&format!("[{}] Triggering {link}", timestamp()));
        tracing::info!(
            run = %ctx.run(),
            endpoint = post.endpoint.as_str(),
            job = request.job.as_str(),
            credentials_id = %step.credentials_id,
            "triggering remote job"
        );

        let status = self.transport.post_form(&post).await?;

        ctx.log().line(&format!("[{}] Trigger returned HTTP/{status}", timestamp()));
        tracing::info!(endpoint = post.endpoint.as_str(), status, "trigger returned");

        interpret_response(status, post.endpoint, request.job, job_url)
    }

    fn resolve_url(&self, step: &TriggerStep) -> Result<ServerUrl, TriggerError> {
        let configured = step.target_url.as_ref().filter(|url| !url.is_blank());
        let url = match configured {
            Some(url) => url,
            None => {
                tracing::debug!("step has no target URL, falling back to root URL");
                self.root_url.as_ref().ok_or(TriggerError::NoTargetUrl)?
            }
        };
        Ok(ServerUrl::new(url.as_str()))
    }

    async fn resolve_credential(
        &self,
        step: &TriggerStep,
        ctx: &ExecutionContext,
        target_url: &ServerUrl,
    ) -> Result<Credential, TriggerError> {
        let lookup = ctx.lookup_context();
        let id = &step.credentials_id;

        let bound = CredentialMatcher::trigger_for(UrlRequirement::Exact(target_url.clone()));
        if let Some(credential) = self.credentials.find(id, &lookup, &bound).await? {
            return Ok(credential);
        }

        // Not bound to this URL. If the id exists at all, hand it on so the
        // binding check reports where it actually points.
        let any = CredentialMatcher::trigger_for(UrlRequirement::Any);
        self.credentials
            .find(id, &lookup, &any)
            .await?
            .ok_or_else(|| TriggerError::CredentialsNotFound(id.clone()))
    }
}

fn check_step(step: &TriggerStep) -> Result<(), TriggerError> {
    if step.job.trim().is_empty() {
        return Err(TriggerError::MissingJob);
    }
    if step.credentials_id.is_blank() {
        return Err(TriggerError::MissingCredentialsId);
    }
    Ok(())
}

fn verify_binding<'a>(
    id: &CredentialId,
    credential: &'a Credential,
    target_url: &ServerUrl,
) -> Result<&'a dyn TriggerCredentials, TriggerError> {
    let binding = credential
        .trigger_credentials()
        .ok_or_else(|| TriggerError::CredentialsNotFound(id.clone()))?;
    if binding.target_url() != target_url {
        return Err(TriggerError::BindingMismatch {
            id: id.clone(),
            bound_url: binding.target_url().clone(),
            target_url: target_url.clone(),
        });
    }
    Ok(binding)
}

fn interpret_response(
    status: u16,
    endpoint: String,
    job: String,
    job_url: String,
) -> Result<TriggerOutcome, TriggerError> {
    if status == STATUS_NOT_FOUND {
        return Err(TriggerError::JobNotFound { endpoint, job });
    }
    Ok(TriggerOutcome {
        status,
        endpoint,
        job_url,
    })
}

fn timestamp() -> String {
    Local::now().format("%a %b %d %H:%M:%S %Z %Y").to_string()
}
