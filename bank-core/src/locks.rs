//! Per-account exclusive locks
//!
//! One async mutex per account, handed out by a shared registry. A
//! unit of work acquires the mutex for every account it reads
//! exclusively and holds it until commit or abort, so no two
//! operations are ever mid-flight on the same account. Acquisition is
//! bounded: callers that cannot get the lock in time see
//! `Error::LockTimeout` instead of waiting forever.
//!
//! Operations that lock two accounts must acquire in ascending
//! `AccountId` order; the registry itself is order-agnostic.

use crate::error::{Error, Result};
use crate::types::AccountId;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-account exclusive locks.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl LockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the exclusive lock for an account, waiting at most
    /// `timeout`.
    pub async fn acquire(&self, id: AccountId, timeout: Duration) -> Result<AccountGuard> {
        // Clone the Arc out before awaiting; holding the map entry
        // across the await would block other accounts in the shard.
        let lock = {
            let entry = self
                .locks
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };

        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(AccountGuard {
                account_id: id,
                _guard: guard,
            }),
            Err(_) => Err(Error::LockTimeout(id)),
        }
    }

    /// Number of accounts with a materialized lock.
    pub fn tracked_accounts(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive hold on one account, released on drop.
#[derive(Debug)]
pub struct AccountGuard {
    account_id: AccountId,
    _guard: OwnedMutexGuard<()>,
}

impl AccountGuard {
    /// Account this guard holds.
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }
}
