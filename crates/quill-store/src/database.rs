use std::path::{Path, PathBuf};

use redb::{ReadableDatabase, ReadableTable, TableError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::handle::HandleManager;
use crate::migration::{LegacyTokenMigration, Migration};
use crate::schema::Key;
use crate::version::{decode_version, encode_version, SCHEMA_VERSION};

/// The client's local store.
///
/// All access goes through one [`HandleManager`], so the file is opened on
/// demand and closed again after the configured idle timeout. Every read
/// and write round-trips through the file; nothing is cached in memory.
#[derive(Debug)]
pub struct Database {
    handles: HandleManager,
}

impl Database {
    /// Open the store in `dir` with default settings and the built-in
    /// migrations.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(dir, StoreConfig::default(), &LegacyTokenMigration)
    }

    /// Open the store in `dir`, bringing its schema up to [`SCHEMA_VERSION`].
    ///
    /// If the stored version is older, `migration` runs once with the stored
    /// version and the new version is written afterwards. Any failure aborts
    /// the open.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn open_with(
        dir: impl AsRef<Path>,
        config: StoreConfig,
        migration: &dyn Migration,
    ) -> StoreResult<Self> {
        config.validate()?;
        let path = Self::file_path_for(dir.as_ref(), &config);
        let db = Self {
            handles: HandleManager::new(path, config.idle_timeout()),
        };

        let current = db.schema_version()?;
        if current < SCHEMA_VERSION {
            info!(from = current, to = SCHEMA_VERSION, "migrating store schema");
            migration.migrate(&db, current)?;
            db.save_schema_version(SCHEMA_VERSION)?;
        }
        Ok(db)
    }

    /// Schema version recorded in the file. A store without a marker, or
    /// with a marker that does not decode, is version 0.
    pub fn schema_version(&self) -> StoreResult<u64> {
        let Some(data) = self.get_raw(Key::SchemaVersion)? else {
            return Ok(0);
        };
        match decode_version(&data) {
            Some(version) => Ok(version),
            None => {
                warn!(marker = ?data, "undecodable schema version marker; treating as version 0");
                Ok(0)
            }
        }
    }

    fn save_schema_version(&self, version: u64) -> StoreResult<()> {
        let data = encode_version(version)?;
        self.put_raw(Key::SchemaVersion, &data)
    }

    /// Read the raw bytes stored under `key`.
    ///
    /// A missing bucket reads as `None`, and the bucket is created so later
    /// writes find it.
    pub fn get_raw(&self, key: Key) -> StoreResult<Option<Vec<u8>>> {
        let bucket = key.bucket();
        let db = self.handles.acquire()?;

        let txn = db.begin_read()?;
        let table = match txn.open_table(bucket.table()) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => {
                debug!(%bucket, "creating missing bucket");
                let txn = db.begin_write()?;
                txn.open_table(bucket.table())?;
                txn.commit()?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let value = table.get(key.name())?.map(|v| v.value().to_vec());
        Ok(value)
    }

    /// Store `data` under `key`, creating the bucket if needed.
    pub fn put_raw(&self, key: Key, data: &[u8]) -> StoreResult<()> {
        let db = self.handles.acquire()?;
        let txn = db.begin_write()?;
        {
            let mut table = txn.open_table(key.bucket().table())?;
            table.insert(key.name(), data)?;
        }
        txn.commit()?;
        debug!(%key, len = data.len(), "stored");
        Ok(())
    }

    /// Read-modify-write of `key` inside one write transaction.
    ///
    /// `f` gets the current bytes and returns the bytes to store plus a value
    /// to hand back. If `f` fails nothing is written.
    pub fn update_raw<T, F>(&self, key: Key, f: F) -> StoreResult<T>
    where
        F: FnOnce(Option<Vec<u8>>) -> StoreResult<(Vec<u8>, T)>,
    {
        let db = self.handles.acquire()?;
        let txn = db.begin_write()?;
        let out = {
            let mut table = txn.open_table(key.bucket().table())?;
            let current = table.get(key.name())?.map(|v| v.value().to_vec());
            let (data, out) = f(current)?;
            table.insert(key.name(), data.as_slice())?;
            out
        };
        txn.commit()?;
        debug!(%key, "updated");
        Ok(out)
    }

    /// Decode the JSON value under `key`, or `T::default()` if nothing is stored.
    pub(crate) fn load<T>(&self, key: Key) -> StoreResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.get_raw(key)? {
            Some(data) if !data.is_empty() => Ok(serde_json::from_slice(&data)?),
            _ => Ok(T::default()),
        }
    }

    pub(crate) fn save<T>(&self, key: Key, value: &T) -> StoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_vec(value)?;
        self.put_raw(key, &data)
    }

    /// Close the file now instead of waiting for the idle timeout.
    ///
    /// The next operation reopens it. Calling this on a closed store does
    /// nothing.
    pub fn close(&self) {
        self.handles.close();
    }

    /// Returns `true` while the file is held open.
    pub fn is_open(&self) -> bool {
        self.handles.is_open()
    }

    /// Full path of the database file.
    pub fn path(&self) -> &Path {
        self.handles.path()
    }

    /// The handle manager that owns the file's open/closed lifecycle.
    pub fn handles(&self) -> &HandleManager {
        &self.handles
    }

    pub(crate) fn file_path_for(dir: &Path, config: &StoreConfig) -> PathBuf {
        dir.join(&config.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::migration::NoMigration;
    use crate::schema::Bucket;
    use std::cell::{Cell, RefCell};

    fn quick_config() -> StoreConfig {
        StoreConfig {
            idle_timeout_ms: 200,
            ..StoreConfig::default()
        }
    }

    fn open_plain(dir: &Path) -> Database {
        Database::open_with(dir, quick_config(), &NoMigration).unwrap()
    }

    /// Counts invocations and records the versions it was called with.
    struct Recorder {
        calls: RefCell<Vec<u64>>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Migration for Recorder {
        fn migrate(&self, _db: &Database, from: u64) -> StoreResult<()> {
            self.calls.borrow_mut().push(from);
            Ok(())
        }
    }

    #[test]
    fn fresh_store_migrates_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let rec = Recorder::new();
        let db = Database::open_with(dir.path(), quick_config(), &rec).unwrap();
        assert_eq!(*rec.calls.borrow(), vec![0]);
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn current_store_is_not_migrated() {
        let dir = tempfile::tempdir().unwrap();
        open_plain(dir.path()).close();

        let rec = Recorder::new();
        let db = Database::open_with(dir.path(), quick_config(), &rec).unwrap();
        assert!(rec.calls.borrow().is_empty());
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn failed_migration_aborts_open_and_keeps_version() {
        let dir = tempfile::tempdir().unwrap();
        let failing = |_: &Database, from: u64| -> StoreResult<()> {
            Err(StoreError::Migration {
                from,
                reason: "boom".into(),
            })
        };
        let err = Database::open_with(dir.path(), quick_config(), &failing).unwrap_err();
        assert!(matches!(err, StoreError::Migration { from: 0, .. }));

        // The marker was never written, so the next open retries.
        let rec = Recorder::new();
        Database::open_with(dir.path(), quick_config(), &rec).unwrap();
        assert_eq!(*rec.calls.borrow(), vec![0]);
    }

    #[test]
    fn padded_legacy_marker_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        db.put_raw(Key::SchemaVersion, &[1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(db.schema_version().unwrap(), 1);
    }

    #[test]
    fn undecodable_marker_reopens_and_migrates_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        db.put_raw(Key::SchemaVersion, &[0x80]).unwrap();
        assert_eq!(db.schema_version().unwrap(), 0);
        db.close();
        drop(db);

        let rec = Recorder::new();
        let db = Database::open_with(dir.path(), quick_config(), &rec).unwrap();
        assert_eq!(*rec.calls.borrow(), vec![0]);
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn overflowing_marker_reopens_with_no_migration() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        db.put_raw(Key::SchemaVersion, &[0xFF; 11]).unwrap();
        db.close();
        drop(db);

        let db = Database::open_with(dir.path(), quick_config(), &NoMigration).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn open_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // Make the database path a directory.
        let config = quick_config();
        std::fs::create_dir_all(Database::file_path_for(dir.path(), &config)).unwrap();
        let err = Database::open_with(dir.path(), config, &NoMigration).unwrap_err();
        assert!(matches!(err, StoreError::Open { .. }));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            file_name: String::new(),
            ..StoreConfig::default()
        };
        let err = Database::open_with(dir.path(), config, &NoMigration).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn missing_key_reads_none_and_creates_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        assert_eq!(db.get_raw(Key::SearchCache).unwrap(), None);

        let guard = db.handles().acquire().unwrap();
        let txn = guard.begin_read().unwrap();
        assert!(txn.open_table(Bucket::Cache.table()).is_ok());
    }

    #[test]
    fn put_then_get_returns_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        db.put_raw(Key::NotebookCache, b"payload").unwrap();
        assert_eq!(db.get_raw(Key::NotebookCache).unwrap(), Some(b"payload".to_vec()));
        // Keys in the same bucket are independent.
        assert_eq!(db.get_raw(Key::SearchCache).unwrap(), None);
    }

    #[test]
    fn data_survives_close_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = open_plain(dir.path());
            db.put_raw(Key::Settings, b"{}").unwrap();
            db.close();
        }
        let db = open_plain(dir.path());
        assert_eq!(db.get_raw(Key::Settings).unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn reads_reopen_after_idle_close() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        db.put_raw(Key::RecoveryNote, b"draft").unwrap();

        let start = std::time::Instant::now();
        while db.is_open() && start.elapsed() < std::time::Duration::from_secs(3) {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(!db.is_open());
        assert_eq!(db.get_raw(Key::RecoveryNote).unwrap(), Some(b"draft".to_vec()));
        assert!(db.is_open());
    }

    #[test]
    fn update_raw_is_atomic_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        db.put_raw(Key::Credentials, b"before").unwrap();

        let seen = Cell::new(None);
        let res: StoreResult<()> = db.update_raw(Key::Credentials, |current| {
            seen.set(current.map(|c| c.len()));
            Err(StoreError::NoMatchingCredential)
        });
        assert!(matches!(res, Err(StoreError::NoMatchingCredential)));
        assert_eq!(seen.get(), Some(6));
        assert_eq!(db.get_raw(Key::Credentials).unwrap(), Some(b"before".to_vec()));
    }

    #[test]
    fn update_raw_writes_new_value() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        let len = db
            .update_raw(Key::Credentials, |current| {
                assert!(current.is_none());
                Ok((b"after".to_vec(), 5usize))
            })
            .unwrap();
        assert_eq!(len, 5);
        assert_eq!(db.get_raw(Key::Credentials).unwrap(), Some(b"after".to_vec()));
    }

    #[test]
    fn load_of_missing_value_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        let v: Vec<String> = db.load(Key::SearchCache).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn load_of_garbage_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        db.put_raw(Key::SearchCache, b"not json").unwrap();
        let err = db.load::<Vec<String>>(Key::SearchCache).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn close_twice_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_plain(dir.path());
        db.close();
        db.close();
        assert!(!db.is_open());
    }
}
