use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A notebook as listed by the note service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notebook {
    pub guid: String,
    pub name: String,
    /// Stack the notebook is grouped under, if any.
    pub stack: Option<String>,
}

/// A note, either from a search result or as an unsaved draft.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    /// Service-assigned id. Empty for notes never uploaded.
    pub guid: String,
    pub title: String,
    /// Note body in the client's markdown rendering.
    pub body: String,
    pub notebook: Option<Notebook>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Note {
    /// Returns `true` for the zero value, i.e. nothing was saved.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Notebook listing cached to avoid a round-trip on every command.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookCacheList {
    pub notebooks: Vec<Notebook>,
    /// When the listing was fetched. `None` means never.
    pub timestamp: Option<DateTime<Utc>>,
}

impl NotebookCacheList {
    /// Build a listing stamped with `fetched_at`.
    pub fn new(notebooks: Vec<Notebook>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            notebooks,
            timestamp: Some(fetched_at),
        }
    }

    /// Returns `true` if the listing was fetched no more than `max_age` before `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.timestamp {
            Some(ts) => ts <= now && now - ts <= max_age,
            None => false,
        }
    }

    /// Look up a cached notebook by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&Notebook> {
        self.notebooks
            .iter()
            .find(|nb| nb.name.eq_ignore_ascii_case(name))
    }
}
