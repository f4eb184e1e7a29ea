//! nufeed Core Library
//!
//! Parses and classifies package source declarations for NuGet-style
//! dependency files, resolves the credentials each feed needs, and checks
//! that configured feeds can be reached.

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod platform;
pub mod probe;
pub mod source;

/// Re-exports of commonly used types
pub mod prelude {
    // Authentication
    pub use crate::auth::{AuthType, Authentication, Credentials, EnvironmentVariable};

    // Sources
    pub use crate::source::{
        Cache, CacheKind, FeedUrlNormalizer, KnownFeedKind, NuGetGalleryNormalizer, NuGetSource,
        PackageSource, SourceParser, SourcesFile, classify, credentials_of,
    };

    // Credential stores
    pub use crate::credentials::{
        CredentialStore, InMemoryCredentialStore, NoCredentialStore, TomlCredentialStore,
    };

    // Probing
    pub use crate::probe::{HttpProbe, ProbeOutcome, Prober, ReqwestProbe};

    // Configuration
    pub use crate::config::{ConfigStore, NufeedConfig};

    pub use crate::error::SourceError;
    pub use crate::platform::Platform;
}
