//! Store contract consumed by the ledger engine
//!
//! The engine never talks to a database directly; it drives a
//! [`LedgerStore`] and mutates balances only inside a [`UnitOfWork`]:
//!
//! 1. `begin` opens a unit of work
//! 2. `read_balance_exclusive` locks an account and returns its latest
//!    committed balance
//! 3. `write_balance` / `append_record` buffer the mutation
//! 4. `commit` applies every buffered write atomically, then releases
//!    the locks; `abort` (or drop) discards them
//!
//! Any backend offering this isolation satisfies the contract; the
//! crate ships an in-memory one and a RocksDB one.

use crate::error::Result;
use crate::locks::AccountGuard;
use crate::types::{
    Account, AccountId, AccountKind, OwnerId, RecordDraft, RecordId, TransactionRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ledger storage backend.
///
/// The read methods take no locks; they serve display and selection.
/// Anything that feeds a funds check must go through a unit of work.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open a unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;

    /// Create an account with a zero balance.
    fn create_account(&self, owner_id: OwnerId, kind: AccountKind) -> Result<Account>;

    /// Fetch an account snapshot without locking.
    fn get_account(&self, id: AccountId) -> Result<Account>;

    /// All accounts held by an owner, in creation order.
    fn accounts_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Account>>;

    /// All records filed against an account, oldest first.
    fn transactions(&self, id: AccountId) -> Result<Vec<TransactionRecord>>;
}

/// One atomic read-modify-write-log scope against the store.
///
/// Writes are buffered until `commit`; locked accounts stay locked
/// until commit or abort. Callers write only to accounts they have
/// read exclusively within the same unit of work.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Lock an account and return its latest committed balance.
    ///
    /// Waits at most the store's configured bound for the lock, then
    /// fails with `Error::LockTimeout`. Re-reading an account already
    /// held by this unit of work returns the buffered balance if one
    /// was written.
    async fn read_balance_exclusive(&mut self, id: AccountId) -> Result<Decimal>;

    /// Buffer a balance write for a locked account.
    fn write_balance(&mut self, id: AccountId, balance: Decimal);

    /// Buffer a transaction record; the store assigns its id and
    /// timestamp at commit.
    fn append_record(&mut self, draft: RecordDraft);

    /// Apply all buffered writes atomically, then release locks.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard all buffered writes and release locks.
    ///
    /// Dropping the unit of work has the same effect; this method lets
    /// call sites make the abort explicit.
    fn abort(self: Box<Self>) {}
}

/// Buffered writes and held locks for one in-flight unit of work.
/// Shared bookkeeping between the store backends.
#[derive(Debug, Default)]
pub(crate) struct TxnState {
    /// Locks held, in acquisition order.
    pub(crate) guards: Vec<AccountGuard>,
    /// Balances written under lock.
    pub(crate) balances: BTreeMap<AccountId, Decimal>,
    /// Records staged for commit.
    pub(crate) drafts: Vec<RecordDraft>,
}

impl TxnState {
    pub(crate) fn holds(&self, id: AccountId) -> bool {
        self.guards.iter().any(|guard| guard.account_id() == id)
    }

    /// Lock `id` if this unit of work does not hold it yet.
    ///
    /// Returns the buffered balance when one exists, `None` when the
    /// caller must read the committed balance from the backend.
    pub(crate) async fn acquire_for_read(
        &mut self,
        locks: &crate::locks::LockRegistry,
        timeout: std::time::Duration,
        id: AccountId,
    ) -> Result<Option<Decimal>> {
        if self.holds(id) {
            if let Some(balance) = self.balances.get(&id) {
                return Ok(Some(*balance));
            }
        } else {
            let guard = locks.acquire(id, timeout).await?;
            self.guards.push(guard);
        }
        Ok(None)
    }
}

/// Monotonic record id and timestamp source, persisted by the durable
/// backend and rebuilt on open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RecordSequence {
    next_id: u64,
    last_at: Option<DateTime<Utc>>,
}

impl Default for RecordSequence {
    fn default() -> Self {
        Self {
            next_id: 1,
            last_at: None,
        }
    }
}

impl RecordSequence {
    /// Turn a draft into a committed record: next id, and a timestamp
    /// clamped so the sequence never runs backwards.
    pub(crate) fn assign(&mut self, draft: RecordDraft) -> TransactionRecord {
        let id = RecordId::from(self.next_id);
        self.next_id += 1;

        let now = Utc::now();
        let timestamp = match self.last_at {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        self.last_at = Some(timestamp);

        TransactionRecord {
            id,
            account_id: draft.account_id,
            kind: draft.kind,
            amount: draft.amount,
            related_account_id: draft.related_account_id,
            timestamp,
        }
    }
}
