//! Credential stores.
//!
//! A store maps feed urls to previously saved credentials. The parser falls
//! back to it whenever a source line carries no usable auth clause.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::auth::{AuthType, Credentials};

/// Lookup of saved credentials by feed url.
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, url: &str) -> Option<Credentials>;
}

fn store_key(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// A store with no entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentialStore;

impl CredentialStore for NoCredentialStore {
    fn lookup(&self, _url: &str) -> Option<Credentials> {
        None
    }
}

/// Credentials held in memory, keyed by url without a trailing slash.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    entries: HashMap<String, Credentials>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, credentials: Credentials) {
        self.entries.insert(store_key(url), credentials);
    }

    pub fn with(mut self, url: &str, credentials: Credentials) -> Self {
        self.insert(url, credentials);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn lookup(&self, url: &str) -> Option<Credentials> {
        self.entries.get(&store_key(url)).cloned()
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    source: Vec<CredentialEntry>,
}

#[derive(Debug, Deserialize)]
struct CredentialEntry {
    url: String,
    username: String,
    password: String,
    #[serde(default)]
    authtype: Option<String>,
}

/// Credentials loaded from a TOML file of `[[source]]` tables.
///
/// ```toml
/// [[source]]
/// url = "https://pkgs.example.com/nuget"
/// username = "ci"
/// password = "token"
/// authtype = "basic"
/// ```
#[derive(Debug, Clone, Default)]
pub struct TomlCredentialStore {
    inner: InMemoryCredentialStore,
}

impl TomlCredentialStore {
    /// Load a credentials file. A missing file yields an empty store.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("no credentials file at {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse credentials file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let file: CredentialsFile = toml::from_str(content)?;

        let mut inner = InMemoryCredentialStore::new();
        for entry in file.source {
            let auth_type = match entry.authtype.as_deref() {
                Some(token) => token
                    .parse::<AuthType>()
                    .with_context(|| format!("Invalid authtype for {}", entry.url))?,
                None => AuthType::Basic,
            };
            inner.insert(
                &entry.url,
                Credentials::new(entry.username, entry.password, auth_type),
            );
        }

        Ok(Self { inner })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl CredentialStore for TomlCredentialStore {
    fn lookup(&self, url: &str) -> Option<Credentials> {
        self.inner.lookup(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn in_memory_lookup_ignores_trailing_slash() {
        let store = InMemoryCredentialStore::new().with(
            "https://feed.example.com/",
            Credentials::new("u", "p", AuthType::Basic),
        );

        assert!(store.lookup("https://feed.example.com").is_some());
        assert!(store.lookup("https://feed.example.com/").is_some());
        assert!(store.lookup("https://other.example.com").is_none());
    }

    #[test]
    fn no_store_finds_nothing() {
        assert!(NoCredentialStore.lookup("https://feed.example.com").is_none());
    }

    #[test]
    fn toml_store_parses_entries() {
        let store = TomlCredentialStore::from_toml_str(
            r#"
[[source]]
url = "https://feed.example.com/nuget"
username = "ci"
password = "token"

[[source]]
url = "https://tfs.example.com/feed/"
username = "DOMAIN\\user"
password = "pw"
authtype = "NTLM"
"#,
        )
        .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.lookup("https://feed.example.com/nuget"),
            Some(Credentials::new("ci", "token", AuthType::Basic))
        );
        assert_eq!(
            store.lookup("https://tfs.example.com/feed"),
            Some(Credentials::new("DOMAIN\\user", "pw", AuthType::Ntlm))
        );
    }

    #[test]
    fn toml_store_rejects_unknown_authtype() {
        let result = TomlCredentialStore::from_toml_str(
            r#"
[[source]]
url = "https://feed.example.com"
username = "u"
password = "p"
authtype = "digest"
"#,
        );
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("digest"));
    }

    #[test]
    fn missing_file_is_empty_store() {
        let temp = TempDir::new().unwrap();
        let store = TomlCredentialStore::load(&temp.path().join("credentials.toml")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn load_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.toml");
        std::fs::write(
            &path,
            "[[source]]\nurl = \"https://feed.example.com\"\nusername = \"u\"\npassword = \"p\"\n",
        )
        .unwrap();

        let store = TomlCredentialStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
    }
}
