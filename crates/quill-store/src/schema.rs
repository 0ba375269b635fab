//! Fixed bucket and key namespace of the store file.
//!
//! Each bucket is a redb table keyed by short ASCII names; every value is an
//! opaque byte blob. The set of buckets and keys is closed: the store does
//! not support arbitrary keys.

use std::fmt;

use redb::TableDefinition;

/// Table type shared by every bucket.
pub type BucketTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// A named partition of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Store metadata such as the schema version.
    Meta,
    /// User settings and the credential list.
    Settings,
    /// Short-lived caches: notebooks, last search, recovery draft.
    Cache,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Meta, Bucket::Settings, Bucket::Cache];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Meta => "db_data",
            Self::Settings => "settings",
            Self::Cache => "cache",
        }
    }

    pub const fn table(self) -> BucketTable {
        TableDefinition::new(self.name())
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A key within its bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    SchemaVersion,
    Settings,
    Credentials,
    NotebookCache,
    SearchCache,
    RecoveryNote,
}

impl Key {
    pub const ALL: [Key; 6] = [
        Key::SchemaVersion,
        Key::Settings,
        Key::Credentials,
        Key::NotebookCache,
        Key::SearchCache,
        Key::RecoveryNote,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::SchemaVersion => "dbVersion",
            Self::Settings => "user_settings",
            Self::Credentials => "user_credentials",
            Self::NotebookCache => "notebook_cache",
            Self::SearchCache => "note_search_cache",
            Self::RecoveryNote => "note_recover_cache",
        }
    }

    /// The bucket this key lives in.
    pub const fn bucket(self) -> Bucket {
        match self {
            Self::SchemaVersion => Bucket::Meta,
            Self::Settings | Self::Credentials => Bucket::Settings,
            Self::NotebookCache | Self::SearchCache | Self::RecoveryNote => Bucket::Cache,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket(), self.name())
    }
}
