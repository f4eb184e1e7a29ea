//! Connectivity checks for configured feeds.
//!
//! Probing is advisory: an unreachable feed produces a warning and never
//! an error, so a broken mirror cannot abort a restore that might still
//! succeed from another source.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinSet;

use crate::auth::{AuthType, Credentials};
use crate::source::PackageSource;

/// Default time allowed for a single probe request.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent with probe requests.
pub const USER_AGENT: &str = concat!("nufeed/", env!("CARGO_PKG_VERSION"));

/// HTTP access used to check that a feed answers.
pub trait HttpProbe: Send + Sync + 'static {
    fn probe(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// [`HttpProbe`] backed by a reqwest client with a bounded timeout.
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::with_user_agent(timeout, USER_AGENT)
    }

    pub fn with_user_agent(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl HttpProbe for ReqwestProbe {
    async fn probe(&self, url: &str, credentials: Option<&Credentials>) -> anyhow::Result<()> {
        let mut request = self.client.get(url);

        match credentials {
            Some(creds) if creds.auth_type == AuthType::Basic => {
                request = request.basic_auth(&creds.username, Some(&creds.password));
            }
            Some(creds) => {
                tracing::debug!(
                    "{} auth is not supported by the probe client, probing {} anonymously",
                    creds.auth_type,
                    url
                );
            }
            None => {}
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP {} from {}", response.status(), url);
        }

        Ok(())
    }
}

/// Filesystem directory of a local feed, unwrapping quotes and `file:` urls.
fn local_feed_dir(path: &str) -> PathBuf {
    let path = path.trim_matches('"');
    match url::Url::parse(path) {
        Ok(parsed) if parsed.scheme() == "file" => parsed
            .to_file_path()
            .unwrap_or_else(|()| PathBuf::from(path)),
        _ => PathBuf::from(path),
    }
}

/// Result of probing one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable { url: String },
    Unreachable { url: String, reason: String },
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Reachable { url } | Self::Unreachable { url, .. } => url,
        }
    }
}

/// Checks sources and reports unreachable ones as warnings.
#[derive(Debug)]
pub struct Prober<H> {
    http: Arc<H>,
}

impl<H> Clone for Prober<H> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
        }
    }
}

impl<H: HttpProbe> Prober<H> {
    pub fn new(http: H) -> Self {
        Self {
            http: Arc::new(http),
        }
    }

    /// Check whether a source can be reached.
    ///
    /// Remote feeds are requested with the source's credentials. Local feeds
    /// must be an existing directory.
    pub async fn check(&self, source: &PackageSource) -> ProbeOutcome {
        let url = source.url().to_string();
        match source {
            PackageSource::NuGetV2(_) | PackageSource::NuGetV3(_) => {
                let credentials = source.credentials();
                match self.http.probe(&url, credentials.as_ref()).await {
                    Ok(()) => ProbeOutcome::Reachable { url },
                    Err(e) => ProbeOutcome::Unreachable {
                        reason: format!("{e:#}"),
                        url,
                    },
                }
            }
            PackageSource::LocalFeed { path, .. } => {
                let dir = local_feed_dir(path);
                if dir.is_dir() {
                    ProbeOutcome::Reachable { url }
                } else {
                    ProbeOutcome::Unreachable {
                        reason: format!("local feed directory {} does not exist", dir.display()),
                        url,
                    }
                }
            }
        }
    }

    /// Log a warning if a source cannot be reached.
    pub async fn warn_if_unreachable(&self, source: &PackageSource) {
        if let ProbeOutcome::Unreachable { url, reason } = self.check(source).await {
            tracing::warn!("Unable to reach package source {}: {}", url, reason);
        }
    }

    /// Probe every source concurrently, warning for each unreachable one.
    ///
    /// Outcomes are returned in completion order.
    pub async fn warn_all_unreachable(&self, sources: &[PackageSource]) -> Vec<ProbeOutcome> {
        let mut tasks = JoinSet::new();
        for source in sources {
            let prober = self.clone();
            let source = source.clone();
            tasks.spawn(async move { prober.check(&source).await });
        }

        let mut outcomes = Vec::with_capacity(sources.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    if let ProbeOutcome::Unreachable { url, reason } = &outcome {
                        tracing::warn!("Unable to reach package source {}: {}", url, reason);
                    }
                    outcomes.push(outcome);
                }
                Err(e) => tracing::warn!("Feed probe task failed: {}", e),
            }
        }
        outcomes
    }
}
