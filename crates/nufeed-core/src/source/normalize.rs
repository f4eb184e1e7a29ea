//! Feed url canonicalization.

/// Default nuget.org v2 feed.
pub const DEFAULT_NUGET_V2_FEED: &str = "https://www.nuget.org/api/v2";
/// Default nuget.org v3 service index.
pub const DEFAULT_NUGET_V3_FEED: &str = "https://api.nuget.org/v3/index.json";

/// Maps equivalent spellings of a feed url onto one canonical url.
pub trait FeedUrlNormalizer: Send + Sync {
    fn normalize(&self, url: &str) -> String;
}

/// Collapses the known aliases of the nuget.org gallery.
#[derive(Debug, Clone, Copy, Default)]
pub struct NuGetGalleryNormalizer;

impl FeedUrlNormalizer for NuGetGalleryNormalizer {
    fn normalize(&self, url: &str) -> String {
        let trimmed = url.trim_end_matches('/');
        match trimmed {
            "https://api.nuget.org/v3/index.json" => DEFAULT_NUGET_V3_FEED.to_string(),
            "http://api.nuget.org/v3/index.json" => {
                DEFAULT_NUGET_V3_FEED.replacen("https", "http", 1)
            }
            "https://nuget.org/api/v2" | "https://www.nuget.org/api/v2" => {
                DEFAULT_NUGET_V2_FEED.to_string()
            }
            "http://nuget.org/api/v2" | "http://www.nuget.org/api/v2" => {
                DEFAULT_NUGET_V2_FEED.replacen("https", "http", 1)
            }
            _ => url.to_string(),
        }
    }
}

/// Returns every url unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl FeedUrlNormalizer for IdentityNormalizer {
    fn normalize(&self, url: &str) -> String {
        url.to_string()
    }
}
