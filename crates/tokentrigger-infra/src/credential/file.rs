//! TOML-file credential store.
//!
//! Credentials live in `{data_dir}/credentials.toml`:
//!
//! ```toml
//! [[credentials]]
//! id = "remote-ci"
//! scope = "global"
//! description = "Remote CI"
//! kind = "build_token"
//! target_url = "https://ci.example.org"
//! token = "..."
//! ```
//!
//! The file is read once on open and rewritten in full after every change.
//! Tokens are stored in clear text, so the file is created owner-only on
//! Unix.

use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use tokentrigger_core::repository::credential::CredentialStore;
use tokentrigger_types::credential::{
    Credential, CredentialId, CredentialKind, CredentialScope, TriggerCredentials,
};
use tokentrigger_types::error::RepositoryError;

// ---------------------------------------------------------------------------
// On-disk format
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    credentials: Vec<CredentialRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RecordKind {
    BuildToken,
    SecretText,
}

#[derive(Serialize, Deserialize)]
struct CredentialRecord {
    id: String,
    #[serde(default)]
    scope: CredentialScope,
    #[serde(default)]
    description: String,
    kind: RecordKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_url: Option<String>,
    token: String,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("kind", &self.kind)
            .field("target_url", &self.target_url)
            .finish_non_exhaustive()
    }
}

impl From<&Credential> for CredentialRecord {
    fn from(credential: &Credential) -> Self {
        let (kind, target_url) = match &credential.kind {
            CredentialKind::BuildToken(token) => (
                RecordKind::BuildToken,
                Some(token.target_url().as_str().to_string()),
            ),
            CredentialKind::SecretText { .. } => (RecordKind::SecretText, None),
        };
        Self {
            id: credential.id.as_str().to_string(),
            scope: credential.scope,
            description: credential.description.clone(),
            kind,
            target_url,
            token: credential.kind.secret().expose_secret().to_string(),
        }
    }
}

impl TryFrom<CredentialRecord> for Credential {
    type Error = RepositoryError;

    fn try_from(record: CredentialRecord) -> Result<Self, Self::Error> {
        if record.id.trim().is_empty() {
            return Err(RepositoryError::Parse("credential with blank id".to_string()));
        }
        match record.kind {
            RecordKind::BuildToken => {
                let target_url = record.target_url.ok_or_else(|| {
                    RepositoryError::Parse(format!(
                        "build token '{}' has no target_url",
                        record.id
                    ))
                })?;
                Ok(Credential::build_token(
                    record.scope,
                    record.id,
                    record.description,
                    &target_url,
                    record.token,
                ))
            }
            RecordKind::SecretText => Ok(Credential::secret_text(
                record.scope,
                record.id,
                record.description,
                record.token,
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// FileCredentialStore
// ---------------------------------------------------------------------------

/// Credential store persisted as a TOML file.
pub struct FileCredentialStore {
    path: PathBuf,
    entries: RwLock<Vec<Credential>>,
}

impl FileCredentialStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let entries = read_credentials(&path).await?;
        tracing::debug!(path = %path.display(), count = entries.len(), "opened credential store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_credentials(path: &Path) -> Result<Vec<Credential>, RepositoryError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(RepositoryError::Io(format!(
                "failed to read {}: {err}",
                path.display()
            )));
        }
    };

    let file: CredentialFile = toml::from_str(&content)
        .map_err(|e| RepositoryError::Parse(format!("{}: {e}", path.display())))?;

    let mut credentials: Vec<Credential> = Vec::with_capacity(file.credentials.len());
    for record in file.credentials {
        let credential = Credential::try_from(record)?;
        if credentials
            .iter()
            .any(|c| c.scope == credential.scope && c.id == credential.id)
        {
            return Err(RepositoryError::Conflict(format!(
                "duplicate credential '{}' in {} scope",
                credential.id, credential.scope
            )));
        }
        credentials.push(credential);
    }
    Ok(credentials)
}

async fn write_credentials(path: &Path, credentials: &[Credential]) -> Result<(), RepositoryError> {
    let file = CredentialFile {
        credentials: credentials.iter().map(CredentialRecord::from).collect(),
    };
    let content =
        toml::to_string_pretty(&file).map_err(|e| RepositoryError::Parse(e.to_string()))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RepositoryError::Io(format!("failed to create {}: {e}", parent.display())))?;
    }

    let tmp = path.with_extension("toml.tmp");
    let replaced = match write_private(&tmp, content.as_bytes()).await {
        Ok(()) => tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| RepositoryError::Io(format!("failed to replace {}: {e}", path.display()))),
        Err(e) => Err(RepositoryError::Io(format!("failed to write {}: {e}", tmp.display()))),
    };
    if replaced.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    replaced
}

/// Write `bytes` to a fresh file at `path`, owner-only from creation on Unix.
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    // A leftover file would keep its old mode; `mode` only applies on create.
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

impl CredentialStore for FileCredentialStore {
    async fn list(&self, scopes: &[CredentialScope]) -> Result<Vec<Credential>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|credential| scopes.contains(&credential.scope))
            .cloned()
            .collect())
    }

    async fn get(
        &self,
        scope: CredentialScope,
        id: &CredentialId,
    ) -> Result<Option<Credential>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .find(|credential| credential.scope == scope && &credential.id == id)
            .cloned())
    }

    async fn put(&self, credential: Credential) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        let mut updated = entries.clone();
        match updated
            .iter_mut()
            .find(|c| c.scope == credential.scope && c.id == credential.id)
        {
            Some(existing) => *existing = credential,
            None => updated.push(credential),
        }
        write_credentials(&self.path, &updated).await?;
        *entries = updated;
        Ok(())
    }

    async fn delete(&self, scope: CredentialScope, id: &CredentialId) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        let position = entries
            .iter()
            .position(|c| c.scope == scope && &c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        let mut updated = entries.clone();
        updated.remove(position);
        write_credentials(&self.path, &updated).await?;
        *entries = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let tmp = TempDir::new().unwrap();
        let store = FileCredentialStore::open(tmp.path().join("credentials.toml"))
            .await
            .unwrap();
        assert!(store.list(&[CredentialScope::Global]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_persists_and_reopens() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("credentials.toml");

        let store = FileCredentialStore::open(&path).await.unwrap();
        store
            .put(Credential::build_token(
                CredentialScope::Global,
                "remote-ci",
                "Remote CI",
                "HTTPS://CI.Example.org:443/",
                "s3cret",
            ))
            .await
            .unwrap();
        store
            .put(Credential::secret_text(CredentialScope::System, "plain", "", "value"))
            .await
            .unwrap();

        let reopened = FileCredentialStore::open(&path).await.unwrap();
        let credential = reopened
            .get(CredentialScope::Global, &CredentialId::new("remote-ci"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credential.description, "Remote CI");
        assert_eq!(credential.target_url().unwrap().as_str(), "https://ci.example.org");
        assert_eq!(credential.kind.secret().expose_secret(), "s3cret");

        let system = reopened.list(&[CredentialScope::System]).await.unwrap();
        assert_eq!(system.len(), 1);
        assert_eq!(system[0].kind.name(), "secret_text");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("credentials.toml");
        let store = FileCredentialStore::open(&path).await.unwrap();
        store
            .put(Credential::secret_text(CredentialScope::Global, "x", "", "y"))
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stale_temp_file_does_not_leak_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("credentials.toml");
        let stale = tmp.path().join("credentials.toml.tmp");
        std::fs::write(&stale, "leftover").unwrap();
        std::fs::set_permissions(&stale, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileCredentialStore::open(&path).await.unwrap();
        store
            .put(Credential::secret_text(CredentialScope::Global, "x", "", "y"))
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_failed_replace_removes_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("credentials.toml");
        let store = FileCredentialStore::open(&path).await.unwrap();

        // A non-empty directory in the way makes the final rename fail.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "").unwrap();

        let result = store
            .put(Credential::secret_text(CredentialScope::Global, "x", "", "y"))
            .await;

        assert!(matches!(result, Err(RepositoryError::Io(_))));
        assert!(!tmp.path().join("credentials.toml.tmp").exists());
        assert!(store.list(&[CredentialScope::Global]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_rewrites_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("credentials.toml");
        let store = FileCredentialStore::open(&path).await.unwrap();
        store
            .put(Credential::secret_text(CredentialScope::Global, "gone", "", "y"))
            .await
            .unwrap();

        store
            .delete(CredentialScope::Global, &CredentialId::new("gone"))
            .await
            .unwrap();
        assert!(matches!(
            store
                .delete(CredentialScope::Global, &CredentialId::new("gone"))
                .await,
            Err(RepositoryError::NotFound)
        ));

        let reopened = FileCredentialStore::open(&path).await.unwrap();
        assert!(reopened.list(&[CredentialScope::Global]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_hand_written_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("credentials.toml");
        tokio::fs::write(
            &path,
            r#"
[[credentials]]
id = "remote-ci"
kind = "build_token"
target_url = "http://CI.example:80/"
token = "abc"
"#,
        )
        .await
        .unwrap();

        let store = FileCredentialStore::open(&path).await.unwrap();
        let credential = store
            .get(CredentialScope::Global, &CredentialId::new("remote-ci"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credential.target_url().unwrap().as_str(), "http://ci.example");
    }

    #[tokio::test]
    async fn test_build_token_without_url_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("credentials.toml");
        tokio::fs::write(
            &path,
            "[[credentials]]\nid = \"ci\"\nkind = \"build_token\"\ntoken = \"abc\"\n",
        )
        .await
        .unwrap();

        assert!(matches!(
            FileCredentialStore::open(&path).await,
            Err(RepositoryError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_entries_conflict() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("credentials.toml");
        tokio::fs::write(
            &path,
            r#"
[[credentials]]
id = "ci"
kind = "secret_text"
token = "a"

[[credentials]]
id = "ci"
kind = "secret_text"
token = "b"
"#,
        )
        .await
        .unwrap();

        assert!(matches!(
            FileCredentialStore::open(&path).await,
            Err(RepositoryError::Conflict(_))
        ));
    }
}
