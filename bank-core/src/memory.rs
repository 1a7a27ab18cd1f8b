//! In-memory store backend
//!
//! Reference implementation of the store contract, used by tests and
//! as the semantic baseline for the durable backend. The whole world
//! lives under one `RwLock`, so a commit becomes visible atomically
//! with respect to the non-locking read surface; per-account isolation
//! still comes from the shared lock registry, exactly as on disk.

use crate::error::{Error, Result};
use crate::locks::LockRegistry;
use crate::store::{LedgerStore, RecordSequence, TxnState, UnitOfWork};
use crate::types::{Account, AccountId, AccountKind, OwnerId, RecordDraft, TransactionRecord};
use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct World {
    accounts: HashMap<AccountId, Account>,
    records: HashMap<AccountId, Vec<TransactionRecord>>,
    sequence: RecordSequence,
}

/// In-memory ledger store.
#[derive(Debug)]
pub struct MemoryStore {
    world: Arc<RwLock<World>>,
    locks: Arc<LockRegistry>,
    acquire_timeout: Duration,
}

impl MemoryStore {
    /// Empty store with the default 5s lock-acquisition bound.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    /// Empty store with a custom lock-acquisition bound.
    pub fn with_timeout(acquire_timeout: Duration) -> Self {
        Self {
            world: Arc::new(RwLock::new(World::default())),
            locks: Arc::new(LockRegistry::new()),
            acquire_timeout,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(Box::new(MemoryUow {
            world: self.world.clone(),
            locks: self.locks.clone(),
            acquire_timeout: self.acquire_timeout,
            txn: TxnState::default(),
        }))
    }

    fn create_account(&self, owner_id: OwnerId, kind: AccountKind) -> Result<Account> {
        let account = Account::open(owner_id, kind);
        self.world
            .write()
            .accounts
            .insert(account.id, account.clone());

        tracing::debug!(account = %account.id, owner = %owner_id, "Account created");
        Ok(account)
    }

    fn get_account(&self, id: AccountId) -> Result<Account> {
        self.world
            .read()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(Error::AccountNotFound(id))
    }

    fn accounts_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Account>> {
        let world = self.world.read();
        let mut accounts: Vec<Account> = world
            .accounts
            .values()
            .filter(|account| account.owner_id == owner_id)
            .cloned()
            .collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    fn transactions(&self, id: AccountId) -> Result<Vec<TransactionRecord>> {
        let world = self.world.read();
        if !world.accounts.contains_key(&id) {
            return Err(Error::AccountNotFound(id));
        }
        Ok(world.records.get(&id).cloned().unwrap_or_default())
    }
}

struct MemoryUow {
    world: Arc<RwLock<World>>,
    locks: Arc<LockRegistry>,
    acquire_timeout: Duration,
    txn: TxnState,
}

#[async_trait]
impl UnitOfWork for MemoryUow {
    async fn read_balance_exclusive(&mut self, id: AccountId) -> Result<Decimal> {
        if let Some(balance) = self
            .txn
            .acquire_for_read(&self.locks, self.acquire_timeout, id)
            .await?
        {
            return Ok(balance);
        }

        self.world
            .read()
            .accounts
            .get(&id)
            .map(|account| account.balance)
            .ok_or(Error::AccountNotFound(id))
    }

    fn write_balance(&mut self, id: AccountId, balance: Decimal) {
        self.txn.balances.insert(id, balance);
    }

    fn append_record(&mut self, draft: RecordDraft) {
        self.txn.drafts.push(draft);
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryUow {
            world,
            locks: _,
            acquire_timeout: _,
            txn,
        } = *self;
        let TxnState {
            guards,
            balances,
            drafts,
        } = txn;

        {
            let mut state = world.write();
            for (id, balance) in balances {
                if let Some(account) = state.accounts.get_mut(&id) {
                    account.balance = balance;
                }
            }
            for draft in drafts {
                let record = state.sequence.assign(draft);
                state
                    .records
                    .entry(record.account_id)
                    .or_default()
                    .push(record);
            }
        }

        // Locks release only once the writes are visible.
        drop(guards);
        Ok(())
    }
}
