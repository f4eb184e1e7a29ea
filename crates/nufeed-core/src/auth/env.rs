//! `%NAME%` environment variable indirection.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN_REGEX.get_or_init(|| Regex::new(r"^%(\w*)%$").expect("static regex pattern is valid"))
}

/// A credential given as an environment variable reference.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnvironmentVariable {
    /// The token as written, e.g. `%USER%`
    pub variable: String,
    /// The resolved value, empty if the variable was not set
    #[serde(skip_serializing)]
    pub value: String,
}

impl EnvironmentVariable {
    /// Resolve `token` against the process environment.
    ///
    /// Returns `None` if the token is not of the form `%NAME%`. An unset
    /// variable resolves to an empty value and logs a warning.
    pub fn create(token: &str) -> Option<Self> {
        Self::create_with(token, |name| std::env::var(name).ok())
    }

    /// Like [`EnvironmentVariable::create`] with a custom variable lookup.
    pub fn create_with<F>(token: &str, lookup: F) -> Option<Self>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let captures = token_regex().captures(token)?;
        let name = captures.get(1).map_or("", |m| m.as_str());

        let value = match lookup(name) {
            Some(value) => value,
            None => {
                tracing::warn!("environment variable '{}' not found", name);
                String::new()
            }
        };

        Some(Self {
            variable: token.to_string(),
            value,
        })
    }

    /// The variable name without the surrounding `%`.
    pub fn name(&self) -> &str {
        self.variable.trim_matches('%')
    }
}

// The value may be a password, so it never shows up in debug output.
impl fmt::Debug for EnvironmentVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentVariable")
            .field("variable", &self.variable)
            .field("value", &"***")
            .finish()
    }
}
