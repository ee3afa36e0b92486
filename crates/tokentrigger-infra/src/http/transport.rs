//! HttpTriggerTransport -- reqwest implementation of [`TriggerTransport`]
//! and [`ServerProbe`].
//!
//! Requests go through the configured proxy, or direct when none is set.
//! Environment proxy variables are ignored so the outbound path is exactly
//! what `config.toml` says. Trigger POSTs never follow redirects: a 3xx on
//! the trigger endpoint is returned to the caller like any other status.
//! Server checks follow up to [`CHECK_MAX_REDIRECTS`] hops.

use std::error::Error as _;

use reqwest::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, PRAGMA};
use reqwest::redirect::Policy;

use tokentrigger_core::trigger::transport::{
    FORM_CONTENT_TYPE, FormPost, ProbeResponse, ServerProbe, TriggerTransport,
};
use tokentrigger_types::config::HttpConfig;
use tokentrigger_types::error::TransportError;
use tokentrigger_types::server_url::ServerUrl;

/// Redirect hops allowed when checking a server URL.
const CHECK_MAX_REDIRECTS: usize = 10;

/// Trigger transport and server probe backed by shared reqwest clients.
#[derive(Debug, Clone)]
pub struct HttpTriggerTransport {
    client: reqwest::Client,
    check_client: reqwest::Client,
    server_header: String,
}

impl HttpTriggerTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(config, Policy::none())?,
            check_client: build_client(config, Policy::limited(CHECK_MAX_REDIRECTS))?,
            server_header: config.server_header.clone(),
        })
    }

    /// Name of the response header that identifies a compatible server.
    pub fn server_header(&self) -> &str {
        &self.server_header
    }
}

impl TriggerTransport for HttpTriggerTransport {
    async fn post_form(&self, request: &FormPost) -> Result<u16, TransportError> {
        let url = parse_url(&request.endpoint)?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(CONTENT_LENGTH, request.content_length())
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: request.endpoint.clone(),
                reason: describe(&e),
            })?;

        let status = response.status().as_u16();
        tracing::debug!(endpoint = request.endpoint.as_str(), status, "trigger request completed");
        Ok(status)
    }
}

impl ServerProbe for HttpTriggerTransport {
    async fn probe(&self, url: &ServerUrl) -> Result<ProbeResponse, TransportError> {
        let target = parse_url(url.as_str())?;

        let response = self
            .check_client
            .get(target)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                reason: describe(&e),
            })?;

        let server_header = response
            .headers()
            .get(self.server_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(ProbeResponse {
            status: response.status().as_u16(),
            server_header,
        })
    }
}

fn build_client(config: &HttpConfig, redirects: Policy) -> Result<reqwest::Client, TransportError> {
    let builder = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(redirects);

    let builder = match config.proxy.as_deref().map(str::trim) {
        Some(proxy) if !proxy.is_empty() => {
            tracing::debug!(proxy, "routing outbound requests through proxy");
            let proxy =
                reqwest::Proxy::all(proxy).map_err(|e| TransportError::Proxy(describe(&e)))?;
            builder.proxy(proxy)
        }
        _ => builder.no_proxy(),
    };

    builder
        .build()
        .map_err(|e| TransportError::Client(describe(&e)))
}

fn parse_url(raw: &str) -> Result<reqwest::Url, TransportError> {
    reqwest::Url::parse(raw).map_err(|e| TransportError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// reqwest's top-level message rarely names the root cause; append the chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};

    // --- Local test server ---

    #[derive(Debug, Clone, Default)]
    struct Captured {
        content_type: Option<String>,
        content_length: Option<String>,
        cache_control: Option<String>,
        body: String,
    }

    type Requests = Arc<Mutex<Vec<Captured>>>;

    fn header(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn trigger(State(requests): State<Requests>, headers: HeaderMap, body: String) -> StatusCode {
        requests.lock().unwrap().push(Captured {
            content_type: header(&headers, "content-type"),
            content_length: header(&headers, "content-length"),
            cache_control: header(&headers, "cache-control"),
            body,
        });
        StatusCode::CREATED
    }

    async fn forbidden() -> StatusCode {
        StatusCode::FORBIDDEN
    }

    async fn moved() -> impl IntoResponse {
        (StatusCode::FOUND, [("location", "/login")])
    }

    async fn relocated_root() -> impl IntoResponse {
        (StatusCode::FOUND, [("location", "/ci")])
    }

    async fn server_root() -> impl IntoResponse {
        ([("X-Jenkins", "2.440.1")], "welcome")
    }

    async fn plain_root() -> &'static str {
        "just a web server"
    }

    async fn spawn_server() -> (SocketAddr, Requests) {
        let requests: Requests = Arc::default();
        let app = Router::new()
            .route("/ci/buildByToken/build", post(trigger))
            .route("/ci/buildByToken/buildWithParameters", post(trigger))
            .route("/locked/buildByToken/build", post(forbidden))
            .route("/redirect/buildByToken/build", post(moved))
            .route("/ci", get(server_root))
            .route("/moved", get(relocated_root))
            .route("/www", get(plain_root))
            .with_state(Arc::clone(&requests));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, requests)
    }

    type Forwarded = Arc<Mutex<Vec<(String, String)>>>;

    /// Answers every request itself and records the request target it was sent.
    async fn forward(State(seen): State<Forwarded>, uri: Uri, body: String) -> StatusCode {
        seen.lock().unwrap().push((uri.to_string(), body));
        StatusCode::CREATED
    }

    async fn spawn_proxy() -> (SocketAddr, Forwarded) {
        let seen: Forwarded = Arc::default();
        let app = Router::new().fallback(forward).with_state(Arc::clone(&seen));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, seen)
    }

    fn transport() -> HttpTriggerTransport {
        HttpTriggerTransport::new(&HttpConfig::default()).unwrap()
    }

    fn form(endpoint: String, body: &str) -> FormPost {
        FormPost {
            endpoint,
            body: body.to_string(),
        }
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_post_form_sends_encoded_body() {
        let (addr, requests) = spawn_server().await;
        let body = "job=deploy&token=abc&a=1&b=hello+world";

        let status = transport()
            .post_form(&form(format!("http://{addr}/ci/buildByToken/buildWithParameters"), body))
            .await
            .unwrap();

        assert_eq!(status, 201);
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let captured = &requests[0];
        assert_eq!(captured.body, body);
        assert_eq!(captured.content_type.as_deref(), Some(FORM_CONTENT_TYPE));
        assert_eq!(captured.content_length, Some(body.len().to_string()));
        assert_eq!(captured.cache_control.as_deref(), Some("no-cache"));
    }

    #[tokio::test]
    async fn test_status_codes_are_returned_verbatim() {
        let (addr, _) = spawn_server().await;
        let transport = transport();

        let missing = transport
            .post_form(&form(format!("http://{addr}/nope/buildByToken/build"), "job=x&token=y"))
            .await
            .unwrap();
        assert_eq!(missing, 404);

        let locked = transport
            .post_form(&form(format!("http://{addr}/locked/buildByToken/build"), "job=x&token=y"))
            .await
            .unwrap();
        assert_eq!(locked, 403);

        let redirect = transport
            .post_form(&form(format!("http://{addr}/redirect/buildByToken/build"), "job=x&token=y"))
            .await
            .unwrap();
        assert_eq!(redirect, 302);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport()
            .post_form(&form(format!("http://{addr}/buildByToken/build"), "job=x&token=y"))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Request { ref url, .. } if url.contains(&addr.to_string())));
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_rejected_before_sending() {
        let err = transport()
            .post_form(&form("not a url/buildByToken/build".to_string(), ""))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_probe_reads_server_header() {
        let (addr, _) = spawn_server().await;
        let transport = transport();

        let found = transport
            .probe(&ServerUrl::new(&format!("http://{addr}/ci/")))
            .await
            .unwrap();
        assert_eq!(found.status, 200);
        assert_eq!(found.server_header.as_deref(), Some("2.440.1"));

        let plain = transport
            .probe(&ServerUrl::new(&format!("http://{addr}/www")))
            .await
            .unwrap();
        assert!(plain.server_header.is_none());
    }

    #[tokio::test]
    async fn test_custom_server_header() {
        let (addr, _) = spawn_server().await;
        let config = HttpConfig {
            server_header: "X-Other".to_string(),
            ..HttpConfig::default()
        };
        let transport = HttpTriggerTransport::new(&config).unwrap();
        assert_eq!(transport.server_header(), "X-Other");

        let response = transport
            .probe(&ServerUrl::new(&format!("http://{addr}/ci")))
            .await
            .unwrap();
        assert!(response.server_header.is_none());
    }

    #[tokio::test]
    async fn test_server_check_follows_redirects() {
        let (addr, _) = spawn_server().await;

        let response = transport()
            .probe(&ServerUrl::new(&format!("http://{addr}/moved")))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.server_header.as_deref(), Some("2.440.1"));
    }

    #[tokio::test]
    async fn test_configured_proxy_receives_trigger() {
        let (proxy_addr, seen) = spawn_proxy().await;
        let config = HttpConfig {
            proxy: Some(format!("http://{proxy_addr}")),
            ..HttpConfig::default()
        };
        let transport = HttpTriggerTransport::new(&config).unwrap();
        let body = "job=deploy&token=abc";

        // `.invalid` never resolves, so only the proxy can answer.
        let status = transport
            .post_form(&form("http://ci.invalid/buildByToken/build".to_string(), body))
            .await
            .unwrap();

        assert_eq!(status, 201);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (target, received) = &seen[0];
        assert_eq!(target, "http://ci.invalid/buildByToken/build");
        assert_eq!(received, body);
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let config = HttpConfig {
            proxy: Some("http://bad host:3128".to_string()),
            ..HttpConfig::default()
        };
        assert!(matches!(
            HttpTriggerTransport::new(&config),
            Err(TransportError::Proxy(_))
        ));
    }
}
