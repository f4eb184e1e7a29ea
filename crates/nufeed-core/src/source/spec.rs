//! Package source types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auth::{Authentication, Credentials};

/// A remote NuGet feed and the credentials used to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NuGetSource {
    /// Feed url without a trailing slash
    pub url: String,
    pub authentication: Option<Authentication>,
}

impl NuGetSource {
    pub fn new(url: impl Into<String>, authentication: Option<Authentication>) -> Self {
        Self {
            url: url.into(),
            authentication,
        }
    }
}

/// How much of a feed a cache keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheKind {
    AllVersions,
    CurrentVersion,
}

/// A local directory mirroring packages pulled from feeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cache {
    pub location: String,
    pub kind: Option<CacheKind>,
}

impl Cache {
    pub fn new(location: impl Into<String>, kind: Option<CacheKind>) -> Self {
        Self {
            location: location.into(),
            kind,
        }
    }

    /// The cache directory as a local feed that packages can be restored from.
    pub fn as_source(&self) -> PackageSource {
        PackageSource::from_cache(self.clone())
    }
}

/// A parsed package source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PackageSource {
    /// NuGet v2 (OData) feed
    NuGetV2(NuGetSource),
    /// NuGet v3 feed, addressed by its `v3/index.json` service index
    NuGetV3(NuGetSource),
    /// Directory (or network share) containing `.nupkg` files
    LocalFeed { path: String, cache: Option<Cache> },
}

impl PackageSource {
    pub fn nuget_v2(url: impl Into<String>) -> Self {
        Self::NuGetV2(NuGetSource::new(url, None))
    }

    pub fn nuget_v3(url: impl Into<String>) -> Self {
        Self::NuGetV3(NuGetSource::new(url, None))
    }

    pub fn local(path: impl Into<String>) -> Self {
        Self::LocalFeed {
            path: path.into(),
            cache: None,
        }
    }

    /// Local feed backed by a cache directory.
    pub fn from_cache(cache: Cache) -> Self {
        Self::LocalFeed {
            path: cache.location.clone(),
            cache: Some(cache),
        }
    }

    /// The cache descriptor of a cache-backed local feed.
    pub fn cache(&self) -> Option<&Cache> {
        match self {
            Self::LocalFeed { cache, .. } => cache.as_ref(),
            _ => None,
        }
    }

    /// The feed url, or the directory path for local feeds.
    pub fn url(&self) -> &str {
        match self {
            Self::NuGetV2(source) | Self::NuGetV3(source) => &source.url,
            Self::LocalFeed { path, .. } => path,
        }
    }

    /// Authentication attached to a remote feed.
    pub fn auth(&self) -> Option<&Authentication> {
        match self {
            Self::NuGetV2(source) | Self::NuGetV3(source) => source.authentication.as_ref(),
            Self::LocalFeed { .. } => None,
        }
    }

    /// Materialized credentials for this source, if any.
    pub fn credentials(&self) -> Option<Credentials> {
        self.auth().map(Authentication::to_credentials)
    }

    /// Check if this is a local feed.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::LocalFeed { .. })
    }

    /// Get the remote feed if this is a NuGet source.
    pub fn as_nuget(&self) -> Option<&NuGetSource> {
        match self {
            Self::NuGetV2(source) | Self::NuGetV3(source) => Some(source),
            Self::LocalFeed { .. } => None,
        }
    }

    pub fn feed_kind(&self) -> KnownFeedKind {
        classify(self)
    }
}

impl fmt::Display for PackageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url())
    }
}

/// Well known feed hosts, detected from the url.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum KnownFeedKind {
    OfficialGallery,
    TfsOrVsts,
    MyGet,
    Unknown,
}

impl fmt::Display for KnownFeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OfficialGallery => "nuget.org",
            Self::TfsOrVsts => "tfs/vsts",
            Self::MyGet => "myget",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

// Checked in order, first hit wins.
const FEED_MARKERS: &[(&str, KnownFeedKind)] = &[
    ("nuget.org", KnownFeedKind::OfficialGallery),
    ("visualstudio.com", KnownFeedKind::TfsOrVsts),
    ("pkgs.dev.azure.com", KnownFeedKind::TfsOrVsts),
    ("myget.org", KnownFeedKind::MyGet),
];

/// Classify a source by its url.
pub fn classify(source: &PackageSource) -> KnownFeedKind {
    classify_url(source.url())
}

/// Classify a raw url.
pub fn classify_url(url: &str) -> KnownFeedKind {
    let url = url.to_lowercase();
    FEED_MARKERS
        .iter()
        .find(|(marker, _)| url.contains(marker))
        .map_or(KnownFeedKind::Unknown, |(_, kind)| *kind)
}

/// Credentials attached to a source, materialized.
pub fn credentials_of(source: &PackageSource) -> Option<Credentials> {
    source.credentials()
}
