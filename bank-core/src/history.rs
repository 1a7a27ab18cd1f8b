//! Transaction history reader
//!
//! Read-only view over the records the engine appended, newest first
//! for display. Record ids are store-monotonic, so id order is time
//! order.

use crate::error::Result;
use crate::store::LedgerStore;
use crate::types::{AccountId, TransactionRecord};
use std::sync::Arc;

/// Read-only transaction log over a store.
pub struct TransactionLog {
    store: Arc<dyn LedgerStore>,
}

impl TransactionLog {
    /// Create a log reader over a store.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// All records filed against an account, newest first.
    pub fn transactions(&self, account_id: AccountId) -> Result<Vec<TransactionRecord>> {
        let mut records = self.store.transactions(account_id)?;
        records.reverse();
        Ok(records)
    }
}
