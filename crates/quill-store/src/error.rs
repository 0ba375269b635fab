use std::path::PathBuf;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database file could not be opened. Covers a parent directory that
    /// cannot be created, a lock held by another process, a corrupt file, and
    /// a failure to restrict the file's permissions.
    #[error("failed to open store at {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: redb::DatabaseError,
    },

    /// A credential index outside the current list.
    #[error("index {index} out of range for {len} credentials")]
    IndexOutOfRange { index: usize, len: usize },

    /// No stored credential equals the one to remove.
    #[error("no matching credential found")]
    NoMatchingCredential,

    /// The schema version could not be encoded for storage.
    #[error("failed to encode schema version {0}")]
    EncodeVersion(u64),

    /// A domain object could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// A schema migration step failed.
    #[error("migration from version {from} failed: {reason}")]
    Migration { from: u64, reason: String },

    /// The store configuration is invalid or unreadable.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
