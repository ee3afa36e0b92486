use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::server_url::ServerUrl;

/// A credential identifier, unique within a [`CredentialScope`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(pub String);

impl CredentialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialId(\"{}\")", self.0)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visibility of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScope {
    /// Usable by job executions and by the host itself.
    #[default]
    Global,
    /// Usable only by the host itself (validation, administration), never by executions.
    System,
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialScope::Global => write!(f, "global"),
            CredentialScope::System => write!(f, "system"),
        }
    }
}

impl FromStr for CredentialScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(CredentialScope::Global),
            "system" => Ok(CredentialScope::System),
            other => Err(format!("unknown credential scope '{other}'")),
        }
    }
}

/// Capability of a stored secret that can authenticate a trigger request.
///
/// Anything exposing the target server it is bound to plus the token
/// satisfies the binding; the credential store filters on this capability.
pub trait TriggerCredentials: Send + Sync {
    /// The normalized URL of the only server this token is valid for.
    fn target_url(&self) -> &ServerUrl;

    /// The build token. Never log or display this in clear text.
    fn token(&self) -> &SecretString;
}

/// A build-authorization token bound to a single target server.
#[derive(Debug)]
pub struct BuildToken {
    target_url: ServerUrl,
    token: SecretString,
}

impl BuildToken {
    /// Bind `token` to `target_url`. The URL is normalized on the way in.
    pub fn new(target_url: &str, token: impl Into<String>) -> Self {
        Self {
            target_url: ServerUrl::new(target_url),
            token: SecretString::from(token.into()),
        }
    }
}

impl Clone for BuildToken {
    fn clone(&self) -> Self {
        Self {
            target_url: self.target_url.clone(),
            token: SecretString::from(self.token.expose_secret().to_owned()),
        }
    }
}

impl TriggerCredentials for BuildToken {
    fn target_url(&self) -> &ServerUrl {
        &self.target_url
    }

    fn token(&self) -> &SecretString {
        &self.token
    }
}

/// What a stored credential holds.
#[derive(Debug)]
pub enum CredentialKind {
    /// Token bound to a target server; satisfies [`TriggerCredentials`].
    BuildToken(BuildToken),
    /// A bare secret with no server binding.
    SecretText { secret: SecretString },
}

impl Clone for CredentialKind {
    fn clone(&self) -> Self {
        match self {
            CredentialKind::BuildToken(token) => CredentialKind::BuildToken(token.clone()),
            CredentialKind::SecretText { secret } => CredentialKind::SecretText {
                secret: SecretString::from(secret.expose_secret().to_owned()),
            },
        }
    }
}

impl CredentialKind {
    pub fn name(&self) -> &'static str {
        match self {
            CredentialKind::BuildToken(_) => "build_token",
            CredentialKind::SecretText { .. } => "secret_text",
        }
    }

    /// The secret value regardless of kind.
    pub fn secret(&self) -> &SecretString {
        match self {
            CredentialKind::BuildToken(token) => token.token(),
            CredentialKind::SecretText { secret } => secret,
        }
    }
}

/// A credential as held by a credential store.
///
/// Immutable once constructed; changing one means replacing it in the store.
#[derive(Debug, Clone)]
pub struct Credential {
    pub scope: CredentialScope,
    pub id: CredentialId,
    pub description: String,
    pub kind: CredentialKind,
}

impl Credential {
    /// Create a build-token credential bound to `target_url`.
    pub fn build_token(
        scope: CredentialScope,
        id: impl Into<String>,
        description: impl Into<String>,
        target_url: &str,
        token: impl Into<String>,
    ) -> Self {
        Self {
            scope,
            id: CredentialId::new(id),
            description: description.into(),
            kind: CredentialKind::BuildToken(BuildToken::new(target_url, token)),
        }
    }

    /// Create a secret-text credential with no server binding.
    pub fn secret_text(
        scope: CredentialScope,
        id: impl Into<String>,
        description: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            scope,
            id: CredentialId::new(id),
            description: description.into(),
            kind: CredentialKind::SecretText {
                secret: SecretString::from(secret.into()),
            },
        }
    }

    /// The trigger capability, if this credential has one.
    pub fn trigger_credentials(&self) -> Option<&dyn TriggerCredentials> {
        match &self.kind {
            CredentialKind::BuildToken(token) => Some(token),
            CredentialKind::SecretText { .. } => None,
        }
    }

    /// The bound server URL, for credentials that have one.
    pub fn target_url(&self) -> Option<&ServerUrl> {
        self.trigger_credentials().map(|c| c.target_url())
    }
}

/// Show a masked representation of a secret: last 4 chars visible.
///
/// - "sk-abcdefghijklmnop" -> "****mnop"
/// - "abc" -> "****"
pub fn mask_secret(secret: &SecretString) -> String {
    let value = secret.expose_secret();
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        "****".to_string()
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{tail}")
    }
}
