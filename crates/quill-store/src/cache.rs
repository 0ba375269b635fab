use quill_types::{Note, NotebookCacheList};

use crate::database::Database;
use crate::error::StoreResult;
use crate::schema::Key;
use crate::traits::CacheStore;

impl CacheStore for Database {
    fn notebook_cache(&self) -> StoreResult<NotebookCacheList> {
        self.load(Key::NotebookCache)
    }

    fn store_notebook_cache(&self, list: &NotebookCacheList) -> StoreResult<()> {
        self.save(Key::NotebookCache, list)
    }

    fn save_search(&self, notes: &[Note]) -> StoreResult<()> {
        self.save(Key::SearchCache, notes)
    }

    fn search(&self) -> StoreResult<Vec<Note>> {
        self.load(Key::SearchCache)
    }

    fn save_recovery_note(&self, note: &Note) -> StoreResult<()> {
        self.save(Key::RecoveryNote, note)
    }

    fn recovery_note(&self) -> StoreResult<Note> {
        self.load(Key::RecoveryNote)
    }
}
