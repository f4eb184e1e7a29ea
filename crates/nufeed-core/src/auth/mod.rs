//! Authentication for package feeds.
//!
//! Credentials reach a feed in one of three ways:
//! - typed inline in the source line (plain text)
//! - named through `%VAR%` tokens and read from the process environment
//! - looked up in a credential store keyed by the feed url

mod env;
mod types;

pub use env::EnvironmentVariable;
pub use types::{AuthType, Authentication, Credentials};
