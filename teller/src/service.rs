//! Teller service
//!
//! Owner-facing facade over the ledger: registration and login through
//! the identity seam, account opening, and owner-scoped delegation to
//! the engine. The scoping rule lives here, not in the engine: the
//! acting owner must hold any account the operation debits or deposits
//! into; a transfer destination may be anyone's account.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::identity::{IdentityVerifier, InMemoryIdentity};
use bank_core::{
    Account, AccountDirectory, AccountId, AccountKind, LedgerEngine, LedgerStore, OwnerId,
    RocksStore, TransactionLog, TransactionRecord,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Teller service
pub struct Teller {
    /// Ledger mutation engine
    engine: LedgerEngine,

    /// Read-only account lookup
    directory: AccountDirectory,

    /// Read-only history
    history: TransactionLog,

    /// Store shared with the engine
    store: Arc<dyn LedgerStore>,

    /// Credential collaborator
    identity: Arc<dyn IdentityVerifier>,
}

impl Teller {
    /// Open a teller over a durable ledger store.
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn LedgerStore> =
            Arc::new(RocksStore::open(&config.ledger_config()).map_err(Error::Ledger)?);
        Ok(Self::over_store(store, Arc::new(InMemoryIdentity::new())))
    }

    /// Build a teller over any store and identity implementation.
    pub fn over_store(store: Arc<dyn LedgerStore>, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            engine: LedgerEngine::new(store.clone()),
            directory: AccountDirectory::new(store.clone()),
            history: TransactionLog::new(store.clone()),
            store,
            identity,
        }
    }

    /// Register a new user and return their owner id.
    pub async fn register(&self, username: &str, password: &str) -> Result<OwnerId> {
        self.identity.register(username, password).await
    }

    /// Verify credentials and return the owner they belong to.
    pub async fn login(&self, username: &str, password: &str) -> Result<OwnerId> {
        self.identity.verify(username, password).await
    }

    /// Open an account for an owner, starting at a zero balance.
    pub fn open_account(&self, owner: OwnerId, kind: AccountKind) -> Result<Account> {
        let account = self.store.create_account(owner, kind)?;
        tracing::info!(owner = %owner, account = %account.id, number = %account.number, kind = %kind, "Account opened");
        Ok(account)
    }

    /// All of an owner's accounts, in creation order.
    pub fn accounts(&self, owner: OwnerId) -> Result<Vec<Account>> {
        Ok(self.directory.accounts_by_owner(owner)?)
    }

    /// History of one of the owner's accounts, newest first.
    pub fn history(&self, owner: OwnerId, account_id: AccountId) -> Result<Vec<TransactionRecord>> {
        self.check_owner(owner, account_id)?;
        Ok(self.history.transactions(account_id)?)
    }

    /// Deposit into one of the owner's accounts.
    pub async fn deposit(
        &self,
        owner: OwnerId,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        self.check_owner(owner, account_id)?;
        Ok(self.engine.deposit(account_id, amount).await?)
    }

    /// Withdraw from one of the owner's accounts.
    pub async fn withdraw(
        &self,
        owner: OwnerId,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        self.check_owner(owner, account_id)?;
        Ok(self.engine.withdraw(account_id, amount).await?)
    }

    /// Transfer from one of the owner's accounts to any account.
    pub async fn transfer(
        &self,
        owner: OwnerId,
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        // Only the debited side must belong to the acting owner.
        self.check_owner(owner, from_id)?;
        Ok(self.engine.transfer(from_id, to_id, amount).await?)
    }

    fn check_owner(&self, owner: OwnerId, account_id: AccountId) -> Result<()> {
        let account = self.directory.get_account(account_id)?;
        if account.owner_id != owner {
            return Err(Error::NotAccountOwner {
                owner,
                account: account_id,
            });
        }
        Ok(())
    }
}
