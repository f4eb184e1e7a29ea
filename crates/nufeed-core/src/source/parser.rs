//! Source line parser.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::auth::{AuthType, Authentication, EnvironmentVariable};
use crate::credentials::{CredentialStore, NoCredentialStore};
use crate::error::{Result, SourceError};
use crate::platform::Platform;

use super::normalize::{FeedUrlNormalizer, NuGetGalleryNormalizer};
use super::spec::{Cache, CacheKind, NuGetSource, PackageSource};

/// Url schemes that denote a filesystem location rather than a feed server.
const LOCAL_SCHEMES: &[&str] = &["file", "smb"];

/// Case-insensitive `<name>: "<value>"` clause.
fn clause_regex(name: &str) -> Regex {
    Regex::new(&format!(r#"(?i){name}:\s*"([^"]*)""#)).expect("static regex pattern is valid")
}

fn source_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)^\s*source\s*"([^"]*)""#).expect("static regex pattern is valid")
    })
}

fn cache_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)^\s*cache\s*"([^"]*)""#).expect("static regex pattern is valid")
    })
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| clause_regex("username"))
}

fn password_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| clause_regex("password"))
}

fn authtype_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| clause_regex("authtype"))
}

fn versions_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)versions:\s*"?(\w+)"?"#).expect("static regex pattern is valid")
    })
}

fn drive_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("static regex pattern is valid"))
}

fn capture<'a>(regex: &Regex, text: &'a str) -> Option<&'a str> {
    regex
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Split a `<keyword> <location> <clauses...>` line into the raw location and
/// the text following it.
///
/// A quoted location directly after the keyword wins; otherwise the second
/// whitespace-delimited token is the location.
fn split_location<'a>(line: &'a str, quoted: &Regex) -> Option<(&'a str, &'a str)> {
    if let Some(captures) = quoted.captures(line) {
        let whole = captures.get(0)?;
        let value = captures.get(1)?;
        return Some((value.as_str(), &line[whole.end()..]));
    }

    let trimmed = line.trim_start();
    let after_keyword = trimmed[trimmed.find(char::is_whitespace)?..].trim_start();
    if after_keyword.is_empty() {
        return None;
    }
    let end = after_keyword
        .find(char::is_whitespace)
        .unwrap_or(after_keyword.len());
    Some((&after_keyword[..end], &after_keyword[end..]))
}

/// Pull the location out of a `<keyword> "<value>"` line, falling back to the
/// second whitespace-delimited token with quotes removed.
fn extract_location(line: &str, quoted: &Regex) -> Option<String> {
    let (raw, _) = split_location(line, quoted)?;
    let raw = raw.replace('"', "");
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Rewrite a Windows UNC path (`\\server\share`) as an `smb:` url.
///
/// Only applies on non-Windows platforms, where such paths cannot be opened
/// directly.
pub fn try_rewrite_network_path(path: &str, platform: Platform) -> Option<String> {
    if platform.is_windows() {
        return None;
    }
    let trimmed = path.trim_start();
    if trimmed.starts_with(r"\\") {
        Some(format!("smb:{}", trimmed.replace('\\', "/")))
    } else {
        None
    }
}

type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Sources and caches declared in a dependencies file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcesFile {
    pub sources: Vec<PackageSource>,
    pub caches: Vec<Cache>,
}

impl SourcesFile {
    /// Declared sources followed by a local feed for each cache.
    pub fn all_sources(&self) -> Vec<PackageSource> {
        self.sources
            .iter()
            .cloned()
            .chain(self.caches.iter().map(Cache::as_source))
            .collect()
    }
}

/// Turns source lines and urls into [`PackageSource`] values.
#[derive(Clone)]
pub struct SourceParser {
    platform: Platform,
    normalizer: Arc<dyn FeedUrlNormalizer>,
    credentials: Arc<dyn CredentialStore>,
    env: Arc<EnvLookup>,
}

impl fmt::Debug for SourceParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceParser")
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser {
    /// Parser for the current platform, canonicalizing nuget.org aliases,
    /// with no saved credentials.
    pub fn new() -> Self {
        Self {
            platform: Platform::current(),
            normalizer: Arc::new(NuGetGalleryNormalizer),
            credentials: Arc::new(NoCredentialStore),
            env: Arc::new(|name: &str| std::env::var(name).ok()),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_normalizer(mut self, normalizer: impl FeedUrlNormalizer + 'static) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    pub fn with_credential_store(mut self, store: impl CredentialStore + 'static) -> Self {
        self.credentials = Arc::new(store);
        self
    }

    /// Replace the process environment used to resolve `%VAR%` tokens.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn try_rewrite_network_path(&self, path: &str) -> Option<String> {
        try_rewrite_network_path(path, self.platform)
    }

    /// Parse a full source line such as
    /// `source "https://feed/" username: "u" password: "p"`.
    pub fn parse_line(&self, line: &str) -> Result<PackageSource> {
        let url = extract_location(line, source_regex()).ok_or_else(|| {
            SourceError::MissingUrl {
                line: line.to_string(),
            }
        })?;
        let normalized = self.normalizer.normalize(&url);
        let auth = self.parse_auth(line, &normalized)?;
        self.parse_url(&normalized, auth)
    }

    /// Resolve a url (or path) into a source, attaching `auth` to remote feeds.
    pub fn parse_url(&self, url: &str, auth: Option<Authentication>) -> Result<PackageSource> {
        if let Some(path) = self.try_rewrite_network_path(url) {
            tracing::debug!("rewrote network path {} to {}", url, path);
            return self.parse_url(&path, None);
        }

        if drive_path_regex().is_match(url) {
            return Ok(PackageSource::local(url));
        }

        match url::Url::parse(url) {
            Ok(parsed) if LOCAL_SCHEMES.contains(&parsed.scheme()) => {
                Ok(PackageSource::local(url))
            }
            Ok(_) => {
                let source = NuGetSource::new(url, auth);
                if url.to_lowercase().ends_with("v3/index.json") {
                    Ok(PackageSource::NuGetV3(source))
                } else {
                    Ok(PackageSource::NuGetV2(source))
                }
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(PackageSource::local(url)),
            Err(e) => {
                tracing::debug!("{} is not a valid url: {}", url, e);
                Err(SourceError::InvalidSource {
                    source_str: url.to_string(),
                })
            }
        }
    }

    /// Extract the auth clause of a source line.
    ///
    /// Without `username:`/`password:` clauses, or when the clauses resolve to
    /// empty credentials, the credential store is consulted instead.
    ///
    /// Only the text after the url is searched for clauses, so a url that
    /// itself contains `password:` is not mistaken for one.
    pub fn parse_auth(&self, line: &str, normalized_url: &str) -> Result<Option<Authentication>> {
        let clauses = split_location(line, source_regex()).map_or(line, |(_, rest)| rest);
        let lower = clauses.to_lowercase();
        if !lower.contains("username:") && !lower.contains("password:") {
            return Ok(self.stored_auth(normalized_url));
        }

        let (Some(username), Some(password)) = (
            capture(username_regex(), clauses),
            capture(password_regex(), clauses),
        ) else {
            return Err(SourceError::IncompleteAuth {
                line: line.to_string(),
            });
        };

        let auth_type = match capture(authtype_regex(), clauses) {
            Some(token) => token.parse::<AuthType>()?,
            None => AuthType::Basic,
        };

        let auth = match (
            EnvironmentVariable::create_with(username, |name| (self.env)(name)),
            EnvironmentVariable::create_with(password, |name| (self.env)(name)),
        ) {
            (Some(username), Some(password)) => Authentication::EnvVar {
                username,
                password,
                auth_type,
            },
            _ => Authentication::plain_text(username, password, auth_type),
        };

        // Empty on both sides usually means the env vars were unset.
        if auth.to_credentials().is_empty() {
            tracing::debug!(
                "empty credentials for {}, using the credential store",
                normalized_url
            );
            return Ok(self.stored_auth(normalized_url));
        }

        Ok(Some(auth))
    }

    fn stored_auth(&self, url: &str) -> Option<Authentication> {
        self.credentials.lookup(url).map(Authentication::from_config)
    }

    /// Parse a `cache "<path>" [versions: all|current]` line.
    pub fn parse_cache_line(&self, line: &str) -> Result<Cache> {
        let invalid = || SourceError::InvalidCache {
            line: line.to_string(),
        };

        let location = extract_location(line, cache_regex()).ok_or_else(invalid)?;
        let kind = match capture(versions_regex(), line) {
            Some(token) => match token.to_lowercase().as_str() {
                "all" => Some(CacheKind::AllVersions),
                "current" => Some(CacheKind::CurrentVersion),
                _ => return Err(invalid()),
            },
            None => None,
        };

        Ok(Cache::new(location, kind))
    }

    /// Parse every `source` and `cache` line of a dependencies file.
    ///
    /// Blank lines and `//` or `#` comments are skipped, as are lines with
    /// any other keyword.
    pub fn parse_sources(&self, content: &str) -> Result<SourcesFile> {
        let mut file = SourcesFile::default();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
                continue;
            }

            let keyword = line
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_lowercase();
            match keyword.as_str() {
                "source" => {
                    let source = self.parse_line(line).map_err(|e| e.at_line(index + 1))?;
                    file.sources.push(source);
                }
                "cache" => {
                    let cache = self
                        .parse_cache_line(line)
                        .map_err(|e| e.at_line(index + 1))?;
                    file.caches.push(cache);
                }
                _ => {}
            }
        }

        Ok(file)
    }
}
