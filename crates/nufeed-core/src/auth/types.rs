//! Authentication variants and materialized credentials.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

use super::EnvironmentVariable;

const MASK: &str = "***";

/// How credentials are presented to a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[default]
    Basic,
    Ntlm,
}

impl FromStr for AuthType {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "ntlm" => Ok(Self::Ntlm),
            _ => Err(SourceError::UnknownAuthType {
                token: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.write_str("basic"),
            Self::Ntlm => f.write_str("ntlm"),
        }
    }
}

/// A username/password pair ready to be sent to a feed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Credentials {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub auth_type: AuthType,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        auth_type: AuthType,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            auth_type,
        }
    }

    /// True when both username and password are empty.
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "username: {}, password: {}, type: {}",
            self.username, MASK, self.auth_type
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &MASK)
            .field("auth_type", &self.auth_type)
            .finish()
    }
}

/// The ways credentials can be supplied for a feed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Authentication {
    /// Username and password typed directly into the configuration
    PlainText {
        username: String,
        #[serde(skip_serializing)]
        password: String,
        auth_type: AuthType,
    },
    /// Username and password given as `%VAR%` references
    EnvVar {
        username: EnvironmentVariable,
        password: EnvironmentVariable,
        auth_type: AuthType,
    },
    /// Credentials found in the credential store for the feed url
    FromConfig {
        username: String,
        #[serde(skip_serializing)]
        password: String,
        auth_type: AuthType,
    },
}

impl Authentication {
    pub fn plain_text(
        username: impl Into<String>,
        password: impl Into<String>,
        auth_type: AuthType,
    ) -> Self {
        Self::PlainText {
            username: username.into(),
            password: password.into(),
            auth_type,
        }
    }

    pub fn from_config(credentials: Credentials) -> Self {
        Self::FromConfig {
            username: credentials.username,
            password: credentials.password,
            auth_type: credentials.auth_type,
        }
    }

    pub fn auth_type(&self) -> AuthType {
        match self {
            Self::PlainText { auth_type, .. }
            | Self::EnvVar { auth_type, .. }
            | Self::FromConfig { auth_type, .. } => *auth_type,
        }
    }

    /// Materialize the credentials to send.
    ///
    /// Environment references yield their resolved values, not the tokens.
    pub fn to_credentials(&self) -> Credentials {
        match self {
            Self::PlainText {
                username,
                password,
                auth_type,
            }
            | Self::FromConfig {
                username,
                password,
                auth_type,
            } => Credentials::new(username.clone(), password.clone(), *auth_type),
            Self::EnvVar {
                username,
                password,
                auth_type,
            } => Credentials::new(username.value.clone(), password.value.clone(), *auth_type),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::PlainText { .. } => "PlainText",
            Self::EnvVar { .. } => "EnvVar",
            Self::FromConfig { .. } => "FromConfig",
        }
    }

    /// The username as it should be shown to a user.
    fn display_username(&self) -> &str {
        match self {
            Self::PlainText { username, .. } | Self::FromConfig { username, .. } => username,
            Self::EnvVar { username, .. } => &username.variable,
        }
    }
}

impl fmt::Display for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "username: {}, password: {}, type: {}",
            self.display_username(),
            MASK,
            self.auth_type()
        )
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.kind())
            .field("username", &self.display_username())
            .field("password", &MASK)
            .field("auth_type", &self.auth_type())
            .finish()
    }
}
