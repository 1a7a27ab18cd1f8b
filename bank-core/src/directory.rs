//! Account directory
//!
//! Read-only lookup and listing for display and selection. Balances
//! seen here are snapshots; the engine never trusts them for a funds
//! check and always re-reads under an exclusive lock.

use crate::error::Result;
use crate::store::LedgerStore;
use crate::types::{Account, AccountId, OwnerId};
use std::sync::Arc;

/// Read-only account lookup over a store.
pub struct AccountDirectory {
    store: Arc<dyn LedgerStore>,
}

impl AccountDirectory {
    /// Create a directory over a store.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Fetch one account snapshot.
    pub fn get_account(&self, id: AccountId) -> Result<Account> {
        self.store.get_account(id)
    }

    /// All accounts held by an owner, in creation order.
    pub fn accounts_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Account>> {
        self.store.accounts_by_owner(owner_id)
    }
}
