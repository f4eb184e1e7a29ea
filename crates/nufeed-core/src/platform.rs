//! Host platform flag.

use serde::{Deserialize, Serialize};

/// The platform whose path conventions the parser should follow.
///
/// Passed into [`crate::source::SourceParser`] at runtime so behavior that
/// depends on the host can be exercised on any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    /// The platform this process is running on.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    pub fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}
