use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Which service endpoint a credential authenticates against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// OAuth token for the production service.
    #[default]
    Oauth,
    /// OAuth token for the sandbox service.
    Sandbox,
    /// Developer token pasted in by the user.
    DevToken,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oauth => "oauth",
            Self::Sandbox => "sandbox",
            Self::DevToken => "dev_token",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oauth" => Ok(Self::Oauth),
            "sandbox" => Ok(Self::Sandbox),
            "dev_token" | "devtoken" | "dev-token" => Ok(Self::DevToken),
            other => Err(TypeError::UnknownCredentialKind(other.to_string())),
        }
    }
}

/// A named secret for one account on the note service.
///
/// Credentials are compared by full equality: two records are the same
/// credential only if name, secret and kind all match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Credential {
    /// Display name chosen by the user.
    pub name: String,
    /// The token itself.
    pub secret: String,
    pub kind: CredentialKind,
}

impl Credential {
    /// Build a credential, rejecting empty names and secrets.
    pub fn new(
        name: impl Into<String>,
        secret: impl Into<String>,
        kind: CredentialKind,
    ) -> Result<Self, TypeError> {
        let name = name.into();
        let secret = secret.into();
        if name.trim().is_empty() {
            return Err(TypeError::InvalidCredential("name is empty".into()));
        }
        if secret.is_empty() {
            return Err(TypeError::InvalidCredential("secret is empty".into()));
        }
        Ok(Self { name, secret, kind })
    }

    /// Secret with everything but the last four characters masked.
    pub fn masked_secret(&self) -> String {
        let count = self.secret.chars().count();
        let visible = count.min(4);
        let tail: String = self.secret.chars().skip(count - visible).collect();
        format!("{}{}", "*".repeat(count - visible), tail)
    }
}
