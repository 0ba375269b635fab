//! Local persistence for the Quill note client.
//!
//! Settings, credentials and a few short-lived caches live in one embedded
//! redb file inside the client's config directory. The file is opened on
//! demand and closed again after a period of inactivity, so the exclusive
//! file lock is only held during bursts of activity.
//!
//! # Layers
//!
//! - [`HandleManager`] -- owns the open/closed lifecycle of the file and
//!   hands out exclusive access through [`HandleGuard`]
//! - [`Database`] -- opens the store, runs schema migrations, and provides
//!   the raw `get_raw` / `put_raw` / `update_raw` helpers
//! - [`SettingsStore`], [`CredentialStore`], [`CacheStore`] -- typed
//!   accessors that serialize domain objects as JSON
//!
//! # Design Rules
//!
//! 1. Only the handle manager opens or closes the file.
//! 2. Every operation takes the handle, runs one transaction, and releases it.
//! 3. A missing bucket or key reads as empty, never as an error.
//! 4. Nothing is cached in memory; every call round-trips through the file.
//! 5. All errors are returned to the caller; nothing is retried.

pub mod cache;
pub mod config;
pub mod credentials;
pub mod database;
pub mod error;
pub mod handle;
pub mod migration;
pub mod schema;
pub mod settings;
pub mod traits;
pub mod version;

pub use config::StoreConfig;
pub use database::Database;
pub use error::{StoreError, StoreResult};
pub use handle::{HandleGuard, HandleManager};
pub use migration::{LegacyTokenMigration, Migration, NoMigration};
pub use schema::{Bucket, Key};
pub use traits::{CacheStore, CredentialStore, SettingsStore};
pub use version::SCHEMA_VERSION;
