use quill_types::{Credential, Note, NotebookCacheList, Settings};

use crate::error::StoreResult;

/// Persistent user settings.
///
/// A store that has never saved settings returns `Settings::default()`.
pub trait SettingsStore {
    fn settings(&self) -> StoreResult<Settings>;

    fn store_settings(&self, settings: &Settings) -> StoreResult<()>;
}

/// Ordered list of credentials, stored as a single record.
///
/// Every mutation reads, modifies and rewrites the whole list.
pub trait CredentialStore {
    /// Append a credential. Duplicates are not rejected.
    fn add(&self, credential: &Credential) -> StoreResult<()>;

    /// Remove the first credential equal to `credential`.
    ///
    /// Returns `NoMatchingCredential` and leaves the list unchanged if none
    /// matches.
    fn remove(&self, credential: &Credential) -> StoreResult<()>;

    /// All credentials in insertion order.
    fn all(&self) -> StoreResult<Vec<Credential>>;

    /// The credential at `index`, or `IndexOutOfRange`.
    fn by_index(&self, index: usize) -> StoreResult<Credential>;
}

/// Short-lived caches kept between invocations.
///
/// Reads of a cache that was never written return the empty value.
pub trait CacheStore {
    fn notebook_cache(&self) -> StoreResult<NotebookCacheList>;

    fn store_notebook_cache(&self, list: &NotebookCacheList) -> StoreResult<()>;

    /// Replace the saved result of the last search.
    fn save_search(&self, notes: &[Note]) -> StoreResult<()>;

    fn search(&self) -> StoreResult<Vec<Note>>;

    /// Keep a copy of a note that failed to upload so it can be recovered.
    fn save_recovery_note(&self, note: &Note) -> StoreResult<()>;

    fn recovery_note(&self) -> StoreResult<Note>;
}
