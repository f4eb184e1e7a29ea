//! Tool configuration (`nufeed.toml`).
//!
//! ```toml
//! credentials_file = "/home/me/.config/nufeed/credentials.toml"
//!
//! [probe]
//! timeout_secs = 5
//! user_agent = "my-build/1.0"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::credentials::TomlCredentialStore;
use crate::probe::{DEFAULT_PROBE_TIMEOUT, ReqwestProbe, USER_AGENT};

const CONFIG_FILE: &str = "nufeed.toml";
const CREDENTIALS_FILE: &str = "credentials.toml";

/// Settings for feed probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_PROBE_TIMEOUT.as_secs(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the HTTP probe these settings describe.
    pub fn build_probe(&self) -> anyhow::Result<ReqwestProbe> {
        ReqwestProbe::with_user_agent(self.timeout(), &self.user_agent)
    }
}

/// Root of `nufeed.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NufeedConfig {
    /// Path of the credential store; relative to the config directory when
    /// not absolute
    pub credentials_file: Option<PathBuf>,
    pub probe: ProbeSettings,
}

impl NufeedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.probe.timeout_secs == 0 {
            anyhow::bail!("probe.timeout_secs must be greater than zero");
        }
        Ok(config)
    }
}

/// Loads `nufeed.toml` and the files it points to.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_dir: PathBuf,
}

impl ConfigStore {
    /// Store rooted at the platform config directory (`~/.config/nufeed`).
    pub fn from_default_dir() -> anyhow::Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("nufeed");
        Ok(Self::from_dir(config_dir))
    }

    pub fn from_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Load the config, or defaults if the file does not exist.
    pub fn load(&self) -> anyhow::Result<NufeedConfig> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(NufeedConfig::new());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        NufeedConfig::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Where the credential store for `config` lives.
    pub fn credentials_path(&self, config: &NufeedConfig) -> PathBuf {
        match &config.credentials_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.config_dir.join(path),
            None => self.config_dir.join(CREDENTIALS_FILE),
        }
    }

    pub fn load_credentials(&self, config: &NufeedConfig) -> anyhow::Result<TomlCredentialStore> {
        TomlCredentialStore::load(&self.credentials_path(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::from_dir(temp.path().to_path_buf());

        let config = store.load().unwrap();

        assert_eq!(config, NufeedConfig::default());
        assert_eq!(config.probe.timeout(), DEFAULT_PROBE_TIMEOUT);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = NufeedConfig::from_toml_str("[probe]\ntimeout_secs = 3\n").unwrap();
        assert_eq!(config.probe.timeout(), Duration::from_secs(3));
        assert_eq!(config.probe.user_agent, USER_AGENT);
        assert_eq!(config.credentials_file, None);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(NufeedConfig::from_toml_str("[probe]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn credentials_path_resolution() {
        let store = ConfigStore::from_dir(PathBuf::from("/etc/nufeed"));

        let default = NufeedConfig::default();
        assert_eq!(
            store.credentials_path(&default),
            PathBuf::from("/etc/nufeed/credentials.toml")
        );

        let relative = NufeedConfig {
            credentials_file: Some(PathBuf::from("secrets/creds.toml")),
            ..Default::default()
        };
        assert_eq!(
            store.credentials_path(&relative),
            PathBuf::from("/etc/nufeed/secrets/creds.toml")
        );

        let absolute = NufeedConfig {
            credentials_file: Some(PathBuf::from("/run/creds.toml")),
            ..Default::default()
        };
        assert_eq!(
            store.credentials_path(&absolute),
            PathBuf::from("/run/creds.toml")
        );
    }

    #[test]
    fn load_reads_config_and_credentials() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("nufeed.toml"),
            "credentials_file = \"creds.toml\"\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("creds.toml"),
            "[[source]]\nurl = \"https://feed.example.com\"\nusername = \"u\"\npassword = \"p\"\n",
        )
        .unwrap();

        let store = ConfigStore::from_dir(temp.path().to_path_buf());
        let config = store.load().unwrap();
        let credentials = store.load_credentials(&config).unwrap();

        assert_eq!(credentials.len(), 1);
    }

    #[test]
    fn invalid_config_names_the_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("nufeed.toml"), "probe = 3\n").unwrap();

        let err = ConfigStore::from_dir(temp.path().to_path_buf())
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("nufeed.toml"));
    }
}
