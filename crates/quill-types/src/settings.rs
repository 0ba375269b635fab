use serde::{Deserialize, Serialize};

/// User preferences persisted between invocations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// OAuth token written by builds that predate the credential store.
    ///
    /// Only read by the schema migration that moves it into the credential
    /// list. Empty once migrated.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    /// Notebook new notes go to when none is named.
    pub default_notebook: Option<String>,
    /// Editor command used to edit note bodies.
    pub editor: Option<String>,
    /// Index into the credential list of the account in use.
    pub active_credential: Option<usize>,
}

impl Settings {
    /// Returns `true` if a pre-credential-store OAuth token is still present.
    pub fn has_legacy_token(&self) -> bool {
        !self.api_key.is_empty()
    }
}
