//! Package source declarations.
//!
//! This module turns source lines from a dependencies file into typed
//! [`PackageSource`] values. It handles:
//! - Remote NuGet feeds (v2, and v3 via `v3/index.json`)
//! - Local directories, `file:` urls and legacy `\\server\share` paths
//! - Auth clauses with plain text or `%VAR%` credentials, falling back to a
//!   credential store

mod normalize;
mod parser;
mod spec;

pub use normalize::{
    DEFAULT_NUGET_V2_FEED, DEFAULT_NUGET_V3_FEED, FeedUrlNormalizer, IdentityNormalizer,
    NuGetGalleryNormalizer,
};
pub use parser::{SourceParser, SourcesFile, try_rewrite_network_path};
pub use spec::{
    Cache, CacheKind, KnownFeedKind, NuGetSource, PackageSource, classify, classify_url,
    credentials_of,
};
