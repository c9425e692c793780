//! Exclusive, time-limited page edit locks.
//!
//! Each page is either unlocked or held by exactly one [`LockToken`] until its
//! deadline. The whole table sits behind a single mutex; every operation is a
//! short in-memory mutation under it.
//!
//! # Expiry
//!
//! A locked page owns exactly one watcher task on the tokio runtime, tagged
//! with the entry's generation. Extending a lock only moves `expires_at`; the
//! watcher wakes at its old deadline, re-reads the live deadline under the
//! mutex and either removes the entry or sleeps again. Release aborts the
//! watcher, and a watcher that finds a different generation exits untouched.
//!
//! ```text
//! acquire(A) ─► Locked(A, t+ttl) ──acquire(A)──► Locked(A, t'+ttl)
//!                   │                                 │
//!                   └─ release(A) / deadline ─────────┴─► Unlocked
//! ```


use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, sleep_until};

use crate::debug;
use crate::page::PageName;

/// Default lock lifetime without renewal.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Longest accepted lock lifetime.
pub const MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Opaque, caller-chosen lock holder identity. Only equality matters.
#[derive(Clone, PartialEq, Eq)]
pub struct LockToken(Arc<[u8]>);

impl LockToken {
    /// Wrap raw bytes. Empty tokens are not valid holders.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Option<Self> {
        let bytes = bytes.into();
        (!bytes.is_empty()).then(|| Self(Arc::from(bytes)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Tokens are shared secrets between editors, keep them out of logs.
impl fmt::Debug for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LockToken({} bytes)", self.0.len())
    }
}

/// Lock operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("`{page}` is locked by someone else")]
    Conflict { page: PageName },
    #[error("lock deadline for `{page}` is out of range")]
    Deadline { page: PageName },
}

/// Outcome of a successful [`LockManager::acquire_or_extend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    Created,
    Extended,
}

struct LockEntry {
    token: LockToken,
    expires_at: Instant,
    generation: u64,
    watcher: AbortHandle,
}

impl LockEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

type LockTable = FxHashMap<PageName, LockEntry>;

/// Process-wide lock table with automatic expiry.
pub struct LockManager {
    table: Arc<Mutex<LockTable>>,
    ttl: Duration,
    runtime: Handle,
    generation: AtomicU64,
}

impl LockManager {
    /// Create an empty table whose expiry watchers run on `runtime`.
    ///
    /// `ttl` is capped at [`MAX_TTL`].
    pub fn new(runtime: Handle, ttl: Duration) -> Self {
        Self {
            table: Arc::new(Mutex::new(FxHashMap::default())),
            ttl: ttl.min(MAX_TTL),
            runtime,
            generation: AtomicU64::new(0),
        }
    }

    /// Lock `page` for `token`, or push its deadline forward if `token`
    /// already holds it.
    pub fn acquire_or_extend(
        &self,
        page: &PageName,
        token: &LockToken,
    ) -> Result<Acquired, LockError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or_else(|| LockError::Deadline { page: page.clone() })?;

        let mut table = self.table.lock();
        match table.get_mut(page) {
            Some(entry) if entry.is_live(now) => {
                if entry.token != *token {
                    return Err(LockError::Conflict { page: page.clone() });
                }
                entry.expires_at = expires_at;
                return Ok(Acquired::Extended);
            }
            // Past its deadline but the watcher has not run yet
            Some(stale) => stale.watcher.abort(),
            None => {}
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let watcher = self.spawn_watcher(page.clone(), generation, expires_at);
        table.insert(
            page.clone(),
            LockEntry {
                token: token.clone(),
                expires_at,
                generation,
                watcher,
            },
        );
        Ok(Acquired::Created)
    }

    /// Release `page` if `token` holds it. Releasing an unlocked page is a
    /// no-op.
    pub fn release(&self, page: &PageName, token: &LockToken) -> Result<(), LockError> {
        let now = Instant::now();

        let mut table = self.table.lock();
        let Some(entry) = table.get(page) else {
            return Ok(());
        };
        if entry.is_live(now) && entry.token != *token {
            return Err(LockError::Conflict { page: page.clone() });
        }
        if let Some(entry) = table.remove(page) {
            entry.watcher.abort();
        }
        Ok(())
    }

    /// Current holder of `page`, if locked.
    #[cfg(test)]
    pub fn holder(&self, page: &PageName) -> Option<LockToken> {
        let now = Instant::now();
        self.table
            .lock()
            .get(page)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.token.clone())
    }

    #[cfg(test)]
    pub fn is_locked(&self, page: &PageName) -> bool {
        self.holder(page).is_some()
    }

    /// Number of currently locked pages.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.table
            .lock()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn spawn_watcher(&self, page: PageName, generation: u64, deadline: Instant) -> AbortHandle {
        let table = Arc::downgrade(&self.table);
        self.runtime
            .spawn(expire_when_due(table, page, generation, deadline))
            .abort_handle()
    }

    /// Entries physically present, expired or not.
    #[cfg(test)]
    fn raw_len(&self) -> usize {
        self.table.lock().len()
    }
}

impl Drop for LockManager {
    fn drop(&mut self) {
        for entry in self.table.lock().values() {
            entry.watcher.abort();
        }
    }
}

/// Watcher for one lock generation.
async fn expire_when_due(
    table: Weak<Mutex<LockTable>>,
    page: PageName,
    generation: u64,
    mut deadline: Instant,
) {
    loop {
        sleep_until(deadline).await;

        let Some(shared) = table.upgrade() else {
            return;
        };
        let mut guard = shared.lock();
        let Some(entry) = guard.get(&page).filter(|e| e.generation == generation) else {
            return;
        };

        if entry.is_live(Instant::now()) {
            deadline = entry.expires_at;
            continue;
        }

        guard.remove(&page);
        debug!("lock"; "expired: /{}", page);
        return;
    }
}
