//! Error types for source line parsing.
//!
//! Every variant quotes the offending input so a bad configuration line can
//! be found without a debugger.

use thiserror::Error;

/// A fatal problem with a single source declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Could not find a source url in \"{line}\"")]
    MissingUrl { line: String },

    #[error("Could not parse auth in \"{line}\": username and password must both be given")]
    IncompleteAuth { line: String },

    #[error("Unknown auth type \"{token}\" (expected \"basic\" or \"ntlm\")")]
    UnknownAuthType { token: String },

    #[error("Unable to parse package source: {source_str}")]
    InvalidSource { source_str: String },

    #[error("Could not parse cache in \"{line}\"")]
    InvalidCache { line: String },

    #[error("line {line_number}: {error}")]
    Line {
        line_number: usize,
        error: Box<SourceError>,
    },
}

impl SourceError {
    /// Attach a 1-based line number to this error.
    pub fn at_line(self, line_number: usize) -> Self {
        Self::Line {
            line_number,
            error: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
