//! Lazily opened, idle-closed handle to the store file.
//!
//! redb holds an exclusive lock on its file for as long as the
//! [`redb::Database`] is alive. [`HandleManager`] opens the file on the first
//! [`acquire`](HandleManager::acquire), keeps it open across a burst of
//! operations, and closes it once no operation has touched it for the idle
//! timeout, so a second invocation of the client is not locked out between
//! user interactions.
//!
//! # Protocol
//!
//! `acquire` returns a [`HandleGuard`] holding the manager's mutex. Dropping
//! the guard releases it. Both the acquire of an already open handle and the
//! release send a reset signal to that handle's idle watcher.
//!
//! # Idle watcher
//!
//! Every closed-to-open transition spawns one watcher thread tagged with the
//! epoch of the open. Resets travel over a bounded channel of capacity 1 and
//! are sent with `try_send`: a full buffer already carries a pending reset,
//! so the send never blocks and never loses activity. When the wait window
//! elapses the watcher takes the mutex and, before closing, checks that the
//! handle is still the one it was started for and that no reset arrived
//! while it was waiting for the lock.

use std::fmt;
use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use redb::Database;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// The live engine handle plus the channel to its idle watcher.
struct OpenHandle {
    db: Database,
    epoch: u64,
    reset: SyncSender<()>,
}

impl OpenHandle {
    fn signal_reset(&self) {
        match self.reset.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                warn!(epoch = self.epoch, "idle watcher is gone; handle stays open until closed");
            }
        }
    }
}

#[derive(Default)]
struct HandleState {
    handle: Option<OpenHandle>,
    /// Number of times the file has been opened.
    epoch: u64,
}

// The state is a plain optional handle, so it is still consistent after a
// panicking holder.
fn lock(state: &Mutex<HandleState>) -> MutexGuard<'_, HandleState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of the open/closed lifecycle of the store file.
pub struct HandleManager {
    path: PathBuf,
    idle_timeout: Duration,
    state: Arc<Mutex<HandleState>>,
}

impl HandleManager {
    /// Create a manager for the file at `path`. The file is not touched until
    /// the first [`acquire`](Self::acquire).
    pub fn new(path: impl Into<PathBuf>, idle_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            idle_timeout,
            state: Arc::new(Mutex::new(HandleState::default())),
        }
    }

    /// Take exclusive ownership of the handle, opening the file if needed.
    ///
    /// Blocks while another caller holds the handle. If opening fails the
    /// mutex is released before the error is returned.
    pub fn acquire(&self) -> StoreResult<HandleGuard<'_>> {
        let mut state = lock(&self.state);
        match &state.handle {
            Some(handle) => handle.signal_reset(),
            None => self.open_locked(&mut state)?,
        }
        Ok(HandleGuard { state })
    }

    /// Close the file if it is open. Closing a closed manager is a no-op.
    pub fn close(&self) {
        let mut state = lock(&self.state);
        if let Some(handle) = state.handle.take() {
            let epoch = handle.epoch;
            // Dropping the sender disconnects the watcher.
            drop(handle);
            info!(path = %self.path.display(), epoch, "store closed");
        }
    }

    /// Returns `true` while the file is open.
    pub fn is_open(&self) -> bool {
        lock(&self.state).handle.is_some()
    }

    /// How many times the file has been opened by this manager.
    pub fn opens(&self) -> u64 {
        lock(&self.state).epoch
    }

    /// Path of the managed file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inactivity after which the file is closed.
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    fn open_locked(&self, state: &mut HandleState) -> StoreResult<()> {
        let db = open_engine(&self.path)?;
        let epoch = state.epoch + 1;
        let (reset, resets) = mpsc::sync_channel(1);

        let watched = Arc::downgrade(&self.state);
        let idle = self.idle_timeout;
        thread::Builder::new()
            .name(format!("quill-idle-{epoch}"))
            .spawn(move || watch_idle(watched, resets, epoch, idle))?;

        state.epoch = epoch;
        state.handle = Some(OpenHandle { db, epoch, reset });
        info!(path = %self.path.display(), epoch, "store opened");
        Ok(())
    }
}

impl fmt::Debug for HandleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleManager")
            .field("path", &self.path)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

/// Exclusive access to the open store file.
///
/// Dereferences to [`redb::Database`]. Dropping the guard releases the
/// handle and restarts the idle window.
pub struct HandleGuard<'a> {
    state: MutexGuard<'a, HandleState>,
}

impl HandleGuard<'_> {
    /// Release the handle. Equivalent to dropping the guard.
    pub fn release(self) {}
}

impl Deref for HandleGuard<'_> {
    type Target = Database;

    fn deref(&self) -> &Database {
        match &self.state.handle {
            Some(handle) => &handle.db,
            None => unreachable!("handle guard exists only while the store is open"),
        }
    }
}

impl Drop for HandleGuard<'_> {
    fn drop(&mut self) {
        if let Some(handle) = &self.state.handle {
            handle.signal_reset();
        }
    }
}

// Every failure to get a usable file, including directory creation and
// permission changes, is an open failure.
fn open_engine(path: &Path) -> StoreResult<Database> {
    let open_error = |source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    };
    let io_error =
        |e: io::Error| open_error(redb::DatabaseError::Storage(redb::StorageError::Io(e)));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
    }
    let db = Database::create(path).map_err(open_error)?;
    restrict_permissions(path).map_err(io_error)?;
    Ok(db)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    if perms.mode() & 0o777 != 0o600 {
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn watch_idle(state: Weak<Mutex<HandleState>>, resets: Receiver<()>, epoch: u64, idle: Duration) {
    debug!(epoch, ?idle, "idle watcher started");
    loop {
        match resets.recv_timeout(idle) {
            Ok(()) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!(epoch, "idle watcher disconnected");
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        let Some(state) = state.upgrade() else {
            return;
        };
        let mut guard = lock(&state);
        if guard.handle.as_ref().map(|h| h.epoch) != Some(epoch) {
            return;
        }
        // Activity that happened while we waited for the lock.
        if resets.try_recv().is_ok() {
            continue;
        }
        guard.handle = None;
        info!(epoch, ?idle, "store idle; closed");
        return;
    }
}
