use crate::domain::account::AccountId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes balance mutations per account.
///
/// Every account gets one async mutex, created lazily and kept for the
/// lifetime of the manager (accounts are never deleted). A transfer takes
/// both of its accounts' mutexes through [`acquire_pair`], which always
/// locks in ascending `AccountId` order regardless of argument order, so
/// two transfers over the same pair in opposite directions cannot
/// deadlock.
///
/// [`acquire_pair`]: AccountLockManager::acquire_pair
#[derive(Default)]
pub struct AccountLockManager {
    locks: Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>,
}

/// Holds both account locks of an in-flight transfer; dropping it releases
/// them, including on every early-return path.
pub struct PairGuard {
    _first: OwnedMutexGuard<()>,
    _second: OwnedMutexGuard<()>,
}

impl AccountLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: AccountId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(id).or_default())
    }

    /// Acquires the locks for both accounts, blocking until free.
    ///
    /// Self-pairs are rejected by the transfer engine before it gets here;
    /// handing in `a == b` would deadlock against itself.
    pub async fn acquire_pair(&self, a: AccountId, b: AccountId) -> PairGuard {
        debug_assert!(a != b, "pair lock requires two distinct accounts");
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let first = self.handle(lo).lock_owned().await;
        let second = self.handle(hi).lock_owned().await;
        PairGuard {
            _first: first,
            _second: second,
        }
    }
}
