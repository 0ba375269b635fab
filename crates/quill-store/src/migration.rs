//! Schema migration hook run by [`Database::open_with`].
//!
//! A migration receives the schema version found on disk and must bring the
//! store forward to [`SCHEMA_VERSION`](crate::version::SCHEMA_VERSION) in one
//! call, applying every intermediate step itself. The new version marker is
//! written only after the migration returns, in a separate transaction, so a
//! crash in between re-runs the migration with the same `from` on the next
//! open. Migrations must therefore be idempotent.

use quill_types::{Credential, CredentialKind};
use tracing::info;

use crate::database::Database;
use crate::error::StoreResult;
use crate::traits::{CredentialStore, SettingsStore};

/// Brings a store forward from an older schema version.
pub trait Migration {
    fn migrate(&self, db: &Database, from: u64) -> StoreResult<()>;
}

impl<F> Migration for F
where
    F: Fn(&Database, u64) -> StoreResult<()>,
{
    fn migrate(&self, db: &Database, from: u64) -> StoreResult<()> {
        self(db, from)
    }
}

/// Migration that changes nothing; only the version marker is bumped.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMigration;

impl Migration for NoMigration {
    fn migrate(&self, _db: &Database, _from: u64) -> StoreResult<()> {
        Ok(())
    }
}

/// Name given to the credential created from a pre-version-1 OAuth token.
pub const LEGACY_CREDENTIAL_NAME: &str = "default";

/// Built-in migrations for this build.
///
/// 0 → 1: the OAuth token kept in [`Settings::api_key`](quill_types::Settings)
/// moves into the credential list and is cleared from the settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct LegacyTokenMigration;

impl Migration for LegacyTokenMigration {
    fn migrate(&self, db: &Database, from: u64) -> StoreResult<()> {
        if from < 1 {
            move_legacy_token(db)?;
        }
        Ok(())
    }
}

fn move_legacy_token(db: &Database) -> StoreResult<()> {
    let mut settings = db.settings()?;
    if !settings.has_legacy_token() {
        return Ok(());
    }

    // A previous run may have added the credential and crashed before the
    // settings were rewritten.
    let already_moved = db.all()?.iter().any(|c| c.secret == settings.api_key);
    if !already_moved {
        db.add(&Credential {
            name: LEGACY_CREDENTIAL_NAME.into(),
            secret: settings.api_key.clone(),
            kind: CredentialKind::Oauth,
        })?;
    }

    settings.api_key.clear();
    db.store_settings(&settings)?;
    info!(already_moved, "moved legacy OAuth token into credential store");
    Ok(())
}
