//! Canonical target-server URLs.
//!
//! [`normalize_url`] turns arbitrary user input into a comparable form so that
//! credential bindings, configured step URLs and the dispatch target all agree
//! regardless of superficial differences: scheme or host case, an explicit
//! default port, or a single trailing slash.
//!
//! Normalization is total. Input that does not parse as an absolute
//! `http`/`https` URL passes through untouched apart from the trailing-slash
//! rule.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Normalize a raw server URL into its canonical string form.
///
/// - `http`/`https` URLs are re-serialized: host lower-cased (IDNA hosts
///   become punycode), default ports (80/443) dropped, non-ASCII path, query
///   and fragment characters percent-encoded.
/// - Any other scheme, or anything that fails to parse, is kept as-is.
/// - Finally exactly one trailing `/` is removed, unless the value ends in
///   `//` or would become empty.
///
/// These steps repeat until the value stops changing, so the result is
/// always a fixed point of `normalize_url`.
///
/// An absent value is normalized as the empty string.
pub fn normalize_url(raw: &str) -> String {
    // Stripping the slash can turn an unparseable value into a parseable
    // one (`"http://A.ex /"`), so repeat until the result is stable.
    let mut current = normalize_once(raw);
    for _ in 0..MAX_PASSES {
        let next = normalize_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

const MAX_PASSES: usize = 8;

fn normalize_once(raw: &str) -> String {
    let canonical = match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
        _ => raw.to_string(),
    };
    strip_trailing_slash(canonical)
}

fn strip_trailing_slash(mut value: String) -> String {
    if value.len() > 1 && value.ends_with('/') && !value.ends_with("//") {
        value.pop();
    }
    value
}

/// A normalized server URL.
///
/// Construction always goes through [`normalize_url`], so two `ServerUrl`s
/// are equal iff their normalized string forms are equal.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ServerUrl(String);

impl ServerUrl {
    pub fn new(raw: &str) -> Self {
        Self(normalize_url(raw))
    }

    /// Normalize an optional value, treating blank input as absent.
    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        raw.filter(|value| !value.trim().is_empty()).map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Parse the normalized form as an absolute URL.
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.0)
    }

    /// Whether normalizing `raw` would rewrite it.
    pub fn requires_normalization(raw: &str) -> bool {
        normalize_url(raw) != raw
    }
}

impl fmt::Debug for ServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerUrl(\"{}\")", self.0)
    }
}

impl fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServerUrl {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl<'de> Deserialize<'de> for ServerUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superficial_differences_normalize_identically() {
        let expected = normalize_url("http://example.com/jobs");
        assert_eq!(normalize_url("HTTP://Example.com:80/jobs/"), expected);
        assert_eq!(normalize_url("http://EXAMPLE.COM/jobs"), expected);
        assert_eq!(normalize_url("http://example.com:80/jobs"), expected);
        assert_eq!(normalize_url("http://example.com/jobs/"), expected);
        assert_eq!(expected, "http://example.com/jobs");
    }

    #[test]
    fn test_https_default_port_dropped() {
        assert_eq!(
            normalize_url("https://CI.Example.org:443/"),
            "https://ci.example.org"
        );
    }

    #[test]
    fn test_non_default_port_kept() {
        assert_eq!(
            normalize_url("http://ci.example.org:443/"),
            "http://ci.example.org:443"
        );
        assert_eq!(
            normalize_url("https://ci.example.org:8443/jenkins/"),
            "https://ci.example.org:8443/jenkins"
        );
    }

    #[test]
    fn test_bare_host_loses_root_slash() {
        assert_eq!(normalize_url("http://a.example"), "http://a.example");
        assert_eq!(normalize_url("http://a.example/"), "http://a.example");
    }

    #[test]
    fn test_user_info_query_and_fragment_preserved() {
        assert_eq!(
            normalize_url("http://bob@Build.Example:80/ci/?view=all#top"),
            "http://bob@build.example/ci/?view=all#top"
        );
    }

    #[test]
    fn test_non_ascii_is_percent_encoded() {
        assert_eq!(
            normalize_url("http://example.com/jöb/"),
            "http://example.com/j%C3%B6b"
        );
        assert_eq!(
            normalize_url("http://Bücher.example/"),
            "http://xn--bcher-kva.example"
        );
    }

    #[test]
    fn test_unrecognized_scheme_passes_through() {
        assert_eq!(normalize_url("ftp://Example.COM:21/"), "ftp://Example.COM:21");
        assert_eq!(normalize_url("ci.example.com/"), "ci.example.com");
    }

    #[test]
    fn test_only_a_single_trailing_slash_is_removed() {
        assert_eq!(normalize_url("ci.example.com//"), "ci.example.com//");
        assert_eq!(normalize_url("/"), "/");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "",
            "/",
            "//",
            "HTTP://Example.com:80/jobs/",
            "https://ci.example.org:443//",
            "http://a.example/x//",
            "http://bob:pw@Build.Example/ci/?q=1/",
            "ftp://Example.COM/",
            "not a url/",
            "http://[::1]:80/",
            "http://Bücher.example/jöb/",
            "mailto:Ops@Example.com",
            "http://A.ex /",
            "HTTPS://A.ex /",
            "http://[::1] /",
            " http://A.ex/ /",
        ];
        for input in inputs {
            let once = normalize_url(input);
            assert_eq!(normalize_url(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_value_parseable_after_slash_strip_is_canonicalized() {
        assert_eq!(normalize_url("http://A.ex /"), "http://a.ex");
        assert_eq!(normalize_url("HTTPS://A.ex /"), "https://a.ex");
        assert_eq!(normalize_url("http://[::1] /"), "http://[::1]");
    }

    #[test]
    fn test_server_url_equality_is_normalized() {
        assert_eq!(
            ServerUrl::new("https://CI.example.org/"),
            ServerUrl::new("https://ci.example.org:443")
        );
        assert_ne!(
            ServerUrl::new("http://a.example/"),
            ServerUrl::new("http://b.example/")
        );
    }

    #[test]
    fn test_from_optional_treats_blank_as_absent() {
        assert!(ServerUrl::from_optional(None).is_none());
        assert!(ServerUrl::from_optional(Some("   ")).is_none());
        assert_eq!(
            ServerUrl::from_optional(Some("http://a.example/")).unwrap().as_str(),
            "http://a.example"
        );
    }

    #[test]
    fn test_requires_normalization() {
        assert!(ServerUrl::requires_normalization("http://A.example/"));
        assert!(!ServerUrl::requires_normalization("http://a.example"));
    }

    #[test]
    fn test_deserialize_normalizes() {
        let url: ServerUrl = serde_json::from_str("\"HTTPS://Ci.Example:443/\"").unwrap();
        assert_eq!(url.as_str(), "https://ci.example");
    }
}
