//! Ledger mutation engine
//!
//! The only writer of account balances. Every operation runs inside
//! exactly one unit of work against the store:
//!
//! 1. Validate inputs before touching the store
//! 2. Read the authoritative balance(s) under exclusive locks
//! 3. Check the business rule against that same snapshot
//! 4. Buffer the new balance(s) and transaction record(s)
//! 5. Commit, or abort by dropping the unit of work
//!
//! Transfers lock both accounts in ascending `AccountId` order, so two
//! opposing transfers can never deadlock against each other.

use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::store::LedgerStore;
use crate::types::{AccountId, RecordDraft};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;

/// Ledger mutation engine
pub struct LedgerEngine {
    store: Arc<dyn LedgerStore>,
    metrics: Option<Metrics>,
}

impl LedgerEngine {
    /// Create an engine over a store.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Attach a metrics collector.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Store this engine mutates.
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Deposit `amount` into an account.
    ///
    /// Increments the balance and appends one Deposit record, together
    /// or not at all.
    pub async fn deposit(&self, account_id: AccountId, amount: Decimal) -> Result<()> {
        self.check_amount(amount)?;

        let started = Instant::now();
        let result = self.apply_deposit(account_id, amount).await;
        match &result {
            Ok(()) => {
                self.record_commit(started);
                if let Some(metrics) = &self.metrics {
                    metrics.record_deposit();
                }
                tracing::info!(account = %account_id, %amount, "Deposit committed");
            }
            Err(err) => {
                self.record_rejection();
                tracing::warn!(account = %account_id, %amount, error = %err, "Deposit failed");
            }
        }
        result
    }

    /// Withdraw `amount` from an account.
    ///
    /// The funds check and the decrement observe the same exclusively
    /// locked balance; the balance can never go negative here.
    pub async fn withdraw(&self, account_id: AccountId, amount: Decimal) -> Result<()> {
        self.check_amount(amount)?;

        let started = Instant::now();
        let result = self.apply_withdraw(account_id, amount).await;
        match &result {
            Ok(()) => {
                self.record_commit(started);
                if let Some(metrics) = &self.metrics {
                    metrics.record_withdrawal();
                }
                tracing::info!(account = %account_id, %amount, "Withdrawal committed");
            }
            Err(err) => {
                self.record_rejection();
                tracing::warn!(account = %account_id, %amount, error = %err, "Withdrawal failed");
            }
        }
        result
    }

    /// Move `amount` from one account to another.
    ///
    /// Debits, credits, and both Transfer records commit as one unit;
    /// the total over the two accounts is unchanged.
    pub async fn transfer(
        &self,
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        // Same-account first, then positivity; both before the store.
        if from_id == to_id {
            self.record_rejection();
            return Err(Error::SameAccount(from_id));
        }
        self.check_amount(amount)?;

        let started = Instant::now();
        let result = self.apply_transfer(from_id, to_id, amount).await;
        match &result {
            Ok(()) => {
                self.record_commit(started);
                if let Some(metrics) = &self.metrics {
                    metrics.record_transfer();
                }
                tracing::info!(from = %from_id, to = %to_id, %amount, "Transfer committed");
            }
            Err(err) => {
                self.record_rejection();
                tracing::warn!(from = %from_id, to = %to_id, %amount, error = %err, "Transfer failed");
            }
        }
        result
    }

    async fn apply_deposit(&self, account_id: AccountId, amount: Decimal) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let balance = uow.read_balance_exclusive(account_id).await?;
        uow.write_balance(account_id, balance + amount);
        uow.append_record(RecordDraft::deposit(account_id, amount));
        uow.commit().await
    }

    async fn apply_withdraw(&self, account_id: AccountId, amount: Decimal) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let balance = uow.read_balance_exclusive(account_id).await?;
        if balance < amount {
            // Drop of the unit of work aborts; nothing was written.
            return Err(Error::InsufficientFunds {
                account: account_id,
                balance,
                requested: amount,
            });
        }
        uow.write_balance(account_id, balance - amount);
        uow.append_record(RecordDraft::withdrawal(account_id, amount));
        uow.commit().await
    }

    async fn apply_transfer(
        &self,
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        let mut uow = self.store.begin().await?;

        // Canonical lock order: ascending account id, regardless of
        // which side is the source.
        let (first, second) = if from_id < to_id {
            (from_id, to_id)
        } else {
            (to_id, from_id)
        };
        let first_balance = uow.read_balance_exclusive(first).await?;
        let second_balance = uow.read_balance_exclusive(second).await?;

        let (from_balance, to_balance) = if first == from_id {
            (first_balance, second_balance)
        } else {
            (second_balance, first_balance)
        };

        if from_balance < amount {
            return Err(Error::InsufficientFunds {
                account: from_id,
                balance: from_balance,
                requested: amount,
            });
        }

        uow.write_balance(from_id, from_balance - amount);
        uow.write_balance(to_id, to_balance + amount);
        // One record per side, each naming the other as counterparty.
        uow.append_record(RecordDraft::transfer(from_id, amount, to_id));
        uow.append_record(RecordDraft::transfer(to_id, amount, from_id));
        uow.commit().await
    }

    fn check_amount(&self, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            self.record_rejection();
            return Err(Error::InvalidAmount(amount));
        }
        Ok(())
    }

    fn record_rejection(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_rejection();
        }
    }

    fn record_commit(&self, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics.record_commit_duration(started.elapsed().as_secs_f64());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::types::{AccountKind, OwnerId, TransactionKind};

    fn test_engine() -> LedgerEngine {
        LedgerEngine::new(Arc::new(MemoryStore::new())).with_metrics(Metrics::new().unwrap())
    }

    async fn account_with(engine: &LedgerEngine, balance: Decimal) -> AccountId {
        let account = engine
            .store()
            .create_account(OwnerId::new(), AccountKind::Current)
            .unwrap();
        if balance > Decimal::ZERO {
            engine.deposit(account.id, balance).await.unwrap();
        }
        account.id
    }

    #[tokio::test]
    async fn test_deposit_increments_and_logs() {
        let engine = test_engine();
        let account = account_with(&engine, Decimal::ZERO).await;

        engine.deposit(account, Decimal::from(50)).await.unwrap();

        let fetched = engine.store().get_account(account).unwrap();
        assert_eq!(fetched.balance, Decimal::from(50));

        let records = engine.store().transactions(account).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TransactionKind::Deposit);
        assert_eq!(records[0].amount, Decimal::from(50));
        assert_eq!(records[0].related_account_id, None);
    }

    #[tokio::test]
    async fn test_withdraw_requires_funds() {
        let engine = test_engine();
        let account = account_with(&engine, Decimal::from(30)).await;

        let result = engine.withdraw(account, Decimal::from(31)).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientFunds {
                account: a,
                balance,
                requested,
            }) if a == account && balance == Decimal::from(30) && requested == Decimal::from(31)
        ));

        // Failed withdrawal leaves balance and log untouched.
        assert_eq!(
            engine.store().get_account(account).unwrap().balance,
            Decimal::from(30)
        );
        assert_eq!(engine.store().transactions(account).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_withdraw_to_exactly_zero() {
        let engine = test_engine();
        let account = account_with(&engine, Decimal::from(30)).await;

        engine.withdraw(account, Decimal::from(30)).await.unwrap();
        assert_eq!(
            engine.store().get_account(account).unwrap().balance,
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected_before_store() {
        let engine = test_engine();
        let account = account_with(&engine, Decimal::from(10)).await;
        let other = account_with(&engine, Decimal::ZERO).await;

        for amount in [Decimal::ZERO, Decimal::from(-5)] {
            assert!(matches!(
                engine.deposit(account, amount).await,
                Err(Error::InvalidAmount(_))
            ));
            assert!(matches!(
                engine.withdraw(account, amount).await,
                Err(Error::InvalidAmount(_))
            ));
            assert!(matches!(
                engine.transfer(account, other, amount).await,
                Err(Error::InvalidAmount(_))
            ));
        }

        // A missing account with an invalid amount still reports the
        // amount: validation precedes any store access.
        let missing = AccountId::new();
        assert!(matches!(
            engine.deposit(missing, Decimal::ZERO).await,
            Err(Error::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_transfer_same_account_rejected() {
        let engine = test_engine();
        let account = account_with(&engine, Decimal::from(10)).await;

        // Same-account precedes the amount check.
        assert!(matches!(
            engine.transfer(account, account, Decimal::from(-1)).await,
            Err(Error::SameAccount(a)) if a == account
        ));
        assert!(matches!(
            engine.transfer(account, account, Decimal::from(5)).await,
            Err(Error::SameAccount(_))
        ));
    }

    #[tokio::test]
    async fn test_transfer_moves_funds_and_logs_both_sides() {
        let engine = test_engine();
        let from = account_with(&engine, Decimal::from(100)).await;
        let to = account_with(&engine, Decimal::ZERO).await;

        engine.transfer(from, to, Decimal::from(60)).await.unwrap();

        assert_eq!(
            engine.store().get_account(from).unwrap().balance,
            Decimal::from(40)
        );
        assert_eq!(
            engine.store().get_account(to).unwrap().balance,
            Decimal::from(60)
        );

        let from_records = engine.store().transactions(from).unwrap();
        let transfer_out = from_records.last().unwrap();
        assert_eq!(transfer_out.kind, TransactionKind::Transfer);
        assert_eq!(transfer_out.related_account_id, Some(to));

        let to_records = engine.store().transactions(to).unwrap();
        assert_eq!(to_records.len(), 1);
        assert_eq!(to_records[0].kind, TransactionKind::Transfer);
        assert_eq!(to_records[0].amount, Decimal::from(60));
        assert_eq!(to_records[0].related_account_id, Some(from));
    }

    #[tokio::test]
    async fn test_transfer_insufficient_funds_leaves_both_untouched() {
        let engine = test_engine();
        let from = account_with(&engine, Decimal::from(10)).await;
        let to = account_with(&engine, Decimal::from(7)).await;

        let result = engine.transfer(from, to, Decimal::from(11)).await;
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));

        assert_eq!(
            engine.store().get_account(from).unwrap().balance,
            Decimal::from(10)
        );
        assert_eq!(
            engine.store().get_account(to).unwrap().balance,
            Decimal::from(7)
        );
    }

    #[tokio::test]
    async fn test_transfer_to_unknown_account_aborts() {
        let engine = test_engine();
        let from = account_with(&engine, Decimal::from(50)).await;
        let missing = AccountId::new();

        assert!(matches!(
            engine.transfer(from, missing, Decimal::from(5)).await,
            Err(Error::AccountNotFound(id)) if id == missing
        ));
        assert_eq!(
            engine.store().get_account(from).unwrap().balance,
            Decimal::from(50)
        );
    }

    #[tokio::test]
    async fn test_metrics_track_outcomes() {
        let metrics = Metrics::new().unwrap();
        let engine =
            LedgerEngine::new(Arc::new(MemoryStore::new())).with_metrics(metrics.clone());
        let account = engine
            .store()
            .create_account(OwnerId::new(), AccountKind::Savings)
            .unwrap()
            .id;

        engine.deposit(account, Decimal::from(20)).await.unwrap();
        engine.withdraw(account, Decimal::from(5)).await.unwrap();
        let _ = engine.withdraw(account, Decimal::from(1000)).await;

        assert_eq!(metrics.deposits_total.get(), 1);
        assert_eq!(metrics.withdrawals_total.get(), 1);
        assert_eq!(metrics.rejections_total.get(), 1);
    }
}
