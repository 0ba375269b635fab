use quill_types::Settings;

use crate::database::Database;
use crate::error::StoreResult;
use crate::schema::Key;
use crate::traits::SettingsStore;

impl SettingsStore for Database {
    fn settings(&self) -> StoreResult<Settings> {
        self.load(Key::Settings)
    }

    fn store_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.save(Key::Settings, settings)
    }
}
