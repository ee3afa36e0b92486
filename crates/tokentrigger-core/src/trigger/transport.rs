//! Outbound HTTP ports.
//!
//! The core never opens connections itself; the infra layer provides a
//! concrete transport. Keeping this behind a trait lets tests count exactly
//! how many requests an execution attempted.

use std::fmt;

use tokentrigger_types::error::TransportError;
use tokentrigger_types::server_url::ServerUrl;
use tokentrigger_types::trigger::TriggerRequest;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A form-encoded POST to a trigger endpoint.
///
/// The body carries the build token, so `Debug` only shows its length.
#[derive(Clone, PartialEq, Eq)]
pub struct FormPost {
    pub endpoint: String,
    pub body: String,
}

impl FormPost {
    /// Exact byte length of the encoded body, sent as `Content-Length`.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}

impl From<&TriggerRequest> for FormPost {
    fn from(request: &TriggerRequest) -> Self {
        Self {
            endpoint: request.endpoint(),
            body: request.encode_body(),
        }
    }
}

impl fmt::Debug for FormPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormPost")
            .field("endpoint", &self.endpoint)
            .field("content_length", &self.content_length())
            .finish()
    }
}

/// Sends trigger requests.
///
/// One call, one request: implementations must not retry, and must release
/// the connection on every exit path.
pub trait TriggerTransport: Send + Sync {
    /// POST `request` as `application/x-www-form-urlencoded` with caching
    /// disabled and return the HTTP status code.
    fn post_form(
        &self,
        request: &FormPost,
    ) -> impl std::future::Future<Output = Result<u16, TransportError>> + Send;
}

/// What a GET against a candidate server URL returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    /// Value of the distinguishing server header, if present.
    pub server_header: Option<String>,
}

/// Checks whether a URL looks like a compatible build server.
pub trait ServerProbe: Send + Sync {
    fn probe(
        &self,
        url: &ServerUrl,
    ) -> impl std::future::Future<Output = Result<ProbeResponse, TransportError>> + Send;
}
