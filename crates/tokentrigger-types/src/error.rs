use thiserror::Error;

use crate::credential::CredentialId;
use crate::server_url::ServerUrl;

/// Broad classification of a [`TriggerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing job, missing or unresolvable credential, no target URL.
    /// Always raised before any network I/O.
    Configuration,
    /// The credential is bound to a different server than the one targeted.
    BindingMismatch,
    /// The target answered 404 on the trigger endpoint.
    NotFound,
    /// The request could not be completed.
    Transport,
    /// The credential store itself failed.
    Store,
}

/// Errors that end a trigger execution. None of them are retried.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("must specify job to trigger")]
    MissingJob,

    #[error("must specify credentials to use")]
    MissingCredentialsId,

    #[error("could not determine target URL: none configured and no root URL available")]
    NoTargetUrl,

    #[error("could not find credentials entry with ID '{0}'")]
    CredentialsNotFound(CredentialId),

    #[error("credentials with ID '{id}' are for {bound_url} not {target_url}")]
    BindingMismatch {
        id: CredentialId,
        bound_url: ServerUrl,
        target_url: ServerUrl,
    },

    #[error("target job not found: {endpoint} for job {job}")]
    JobNotFound { endpoint: String, job: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("credential store error: {0}")]
    Store(#[from] RepositoryError),
}

impl TriggerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TriggerError::MissingJob
            | TriggerError::MissingCredentialsId
            | TriggerError::NoTargetUrl
            | TriggerError::CredentialsNotFound(_) => ErrorKind::Configuration,
            TriggerError::BindingMismatch { .. } => ErrorKind::BindingMismatch,
            TriggerError::JobNotFound { .. } => ErrorKind::NotFound,
            TriggerError::Transport(_) => ErrorKind::Transport,
            TriggerError::Store(_) => ErrorKind::Store,
        }
    }
}

/// Failures of the outbound HTTP layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid proxy configuration: {0}")]
    Proxy(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

/// Errors from credential store operations (used by trait definitions in tokentrigger-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_mismatch_display() {
        let err = TriggerError::BindingMismatch {
            id: CredentialId::new("ci"),
            bound_url: ServerUrl::new("http://a.example"),
            target_url: ServerUrl::new("http://b.example"),
        };
        assert_eq!(
            err.to_string(),
            "credentials with ID 'ci' are for http://a.example not http://b.example"
        );
        assert_eq!(err.kind(), ErrorKind::BindingMismatch);
    }

    #[test]
    fn test_job_not_found_carries_context() {
        let err = TriggerError::JobNotFound {
            endpoint: "http://a.example/buildByToken/build".to_string(),
            job: "deploy".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("http://a.example/buildByToken/build"));
        assert!(message.contains("deploy"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_configuration_kinds() {
        assert_eq!(TriggerError::MissingJob.kind(), ErrorKind::Configuration);
        assert_eq!(TriggerError::NoTargetUrl.kind(), ErrorKind::Configuration);
        assert_eq!(
            TriggerError::CredentialsNotFound(CredentialId::new("x")).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_transport_error_is_transparent() {
        let err = TriggerError::from(TransportError::Request {
            url: "http://a.example".to_string(),
            reason: "connection refused".to_string(),
        });
        assert_eq!(err.to_string(), "request to http://a.example failed: connection refused");
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
