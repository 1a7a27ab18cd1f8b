//! Durable store backend using RocksDB
//!
//! # Column Families
//!
//! - `accounts` - Account rows (key: account_id)
//! - `records` - Append-only transaction records (key: record_id)
//! - `owner_index` - Secondary index (key: owner_id || account_id)
//! - `record_index` - Secondary index (key: account_id || record_id)
//! - `meta` - Record sequence state (counter + clock clamp)
//!
//! A unit of work buffers its writes and commits them as one
//! `WriteBatch`, so a crash never leaves a balance without its record
//! or half a transfer on disk. Per-account isolation comes from the
//! shared lock registry, same as the in-memory backend.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::locks::LockRegistry;
use crate::store::{LedgerStore, RecordSequence, TxnState, UnitOfWork};
use crate::types::{
    Account, AccountId, AccountKind, OwnerId, RecordDraft, RecordId, TransactionRecord,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";
const CF_RECORDS: &str = "records";
const CF_OWNER_INDEX: &str = "owner_index";
const CF_RECORD_INDEX: &str = "record_index";
const CF_META: &str = "meta";

/// Meta key holding the persisted record sequence
const META_SEQUENCE: &[u8] = b"record_sequence";

/// RocksDB-backed ledger store.
pub struct RocksStore {
    inner: Arc<Inner>,
}

struct Inner {
    db: DB,
    locks: LockRegistry,
    /// Held for the duration of every commit; serializes record id
    /// assignment with the batch write that persists it.
    sequence: Mutex<RecordSequence>,
    acquire_timeout: Duration,
}

impl RocksStore {
    /// Open or create the database.
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Self::cf_options_accounts()),
            ColumnFamilyDescriptor::new(CF_RECORDS, Self::cf_options_records()),
            ColumnFamilyDescriptor::new(CF_OWNER_INDEX, Self::cf_options_indices()),
            ColumnFamilyDescriptor::new(CF_RECORD_INDEX, Self::cf_options_indices()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        let inner = Inner {
            db,
            locks: LockRegistry::new(),
            sequence: Mutex::new(RecordSequence::default()),
            acquire_timeout: config.locking.acquire_timeout(),
        };

        // Rebuild the record sequence persisted by the last commit.
        let cf_meta = inner.cf_handle(CF_META)?;
        if let Some(bytes) = inner.db.get_cf(&cf_meta, META_SEQUENCE)? {
            *inner.sequence.lock() = bincode::deserialize(&bytes)?;
        }
        drop(cf_meta);

        tracing::info!(path = ?path, "Opened ledger RocksDB");

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    // Column family options

    fn cf_options_accounts() -> Options {
        let mut opts = Options::default();
        // Accounts are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_records() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Indices benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }
}

impl Inner {
    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    fn load_account(&self, id: AccountId) -> Result<Account> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = self
            .db
            .get_cf(&cf, id.as_bytes())?
            .ok_or(Error::AccountNotFound(id))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Apply one unit of work's buffered writes as a single batch.
    fn commit_txn(
        &self,
        balances: BTreeMap<AccountId, Decimal>,
        drafts: Vec<RecordDraft>,
    ) -> Result<()> {
        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        let cf_records = self.cf_handle(CF_RECORDS)?;
        let cf_record_index = self.cf_handle(CF_RECORD_INDEX)?;
        let cf_meta = self.cf_handle(CF_META)?;

        let mut sequence = self.sequence.lock();
        // Assign ids against a copy; the persisted copy and the batch
        // land together, so a failed write never burns ids.
        let mut staged = sequence.clone();

        let mut batch = WriteBatch::default();

        for (id, balance) in balances {
            let mut account = self.load_account(id)?;
            account.balance = balance;
            batch.put_cf(&cf_accounts, id.as_bytes(), bincode::serialize(&account)?);
        }

        for draft in drafts {
            let record = staged.assign(draft);
            batch.put_cf(
                &cf_records,
                record.id.as_u64().to_be_bytes(),
                bincode::serialize(&record)?,
            );
            batch.put_cf(
                &cf_record_index,
                record_index_key(record.account_id, record.id),
                [],
            );
        }

        batch.put_cf(&cf_meta, META_SEQUENCE, bincode::serialize(&staged)?);

        self.db.write(batch)?;
        *sequence = staged;

        Ok(())
    }
}

// Index key helpers

fn owner_index_key(owner_id: OwnerId, account_id: AccountId) -> Vec<u8> {
    let mut key = owner_id.as_bytes().to_vec();
    key.extend_from_slice(account_id.as_bytes());
    key
}

fn record_index_key(account_id: AccountId, record_id: RecordId) -> Vec<u8> {
    let mut key = account_id.as_bytes().to_vec();
    key.extend_from_slice(&record_id.as_u64().to_be_bytes());
    key
}

#[async_trait]
impl LedgerStore for RocksStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(Box::new(RocksUow {
            inner: self.inner.clone(),
            txn: TxnState::default(),
        }))
    }

    fn create_account(&self, owner_id: OwnerId, kind: AccountKind) -> Result<Account> {
        let account = Account::open(owner_id, kind);

        let cf_accounts = self.inner.cf_handle(CF_ACCOUNTS)?;
        let cf_owner_index = self.inner.cf_handle(CF_OWNER_INDEX)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_accounts,
            account.id.as_bytes(),
            bincode::serialize(&account)?,
        );
        batch.put_cf(&cf_owner_index, owner_index_key(owner_id, account.id), []);
        self.inner.db.write(batch)?;

        tracing::debug!(account = %account.id, owner = %owner_id, "Account created");
        Ok(account)
    }

    fn get_account(&self, id: AccountId) -> Result<Account> {
        self.inner.load_account(id)
    }

    fn accounts_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Account>> {
        let cf = self.inner.cf_handle(CF_OWNER_INDEX)?;
        let prefix = owner_id.as_bytes();

        let mut accounts = Vec::new();
        for item in self.inner.db.prefix_iterator_cf(&cf, prefix) {
            let (key, _) = item?;
            // The iterator can run past the prefix; stop there.
            if key.len() < 32 || &key[..16] != prefix {
                break;
            }
            let account_id_bytes: [u8; 16] = key[16..32].try_into().unwrap();
            let account_id = AccountId::from_uuid(uuid::Uuid::from_bytes(account_id_bytes));
            accounts.push(self.inner.load_account(account_id)?);
        }

        // UUIDv7 account ids: index order is creation order already,
        // keep the sort as the contract's statement of intent.
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    fn transactions(&self, id: AccountId) -> Result<Vec<TransactionRecord>> {
        // Distinguish "no history" from "no such account".
        self.inner.load_account(id)?;

        let cf_index = self.inner.cf_handle(CF_RECORD_INDEX)?;
        let cf_records = self.inner.cf_handle(CF_RECORDS)?;
        let prefix = id.as_bytes();

        let mut records = Vec::new();
        for item in self.inner.db.prefix_iterator_cf(&cf_index, prefix) {
            let (key, _) = item?;
            if key.len() < 24 || &key[..16] != prefix {
                break;
            }
            let record_key: [u8; 8] = key[16..24].try_into().unwrap();
            let value = self
                .inner
                .db
                .get_cf(&cf_records, record_key)?
                .ok_or_else(|| {
                    Error::Storage(format!(
                        "Record index points at missing record {}",
                        u64::from_be_bytes(record_key)
                    ))
                })?;
            records.push(bincode::deserialize(&value)?);
        }

        Ok(records)
    }
}

/// Unit of work against the RocksDB backend.
struct RocksUow {
    inner: Arc<Inner>,
    txn: TxnState,
}

#[async_trait]
impl UnitOfWork for RocksUow {
    async fn read_balance_exclusive(&mut self, id: AccountId) -> Result<Decimal> {
        if let Some(balance) = self
            .txn
            .acquire_for_read(&self.inner.locks, self.inner.acquire_timeout, id)
            .await?
        {
            return Ok(balance);
        }

        Ok(self.inner.load_account(id)?.balance)
    }

    fn write_balance(&mut self, id: AccountId, balance: Decimal) {
        self.txn.balances.insert(id, balance);
    }

    fn append_record(&mut self, draft: RecordDraft) {
        self.txn.drafts.push(draft);
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        let TxnState {
            guards,
            balances,
            drafts,
        } = std::mem::take(&mut self.txn);

        self.inner.commit_txn(balances, drafts)?;

        // Locks release only once the batch is durable.
        drop(guards);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use tempfile::TempDir;

    fn test_store() -> (RocksStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (RocksStore::open(&config).unwrap(), temp_dir)
    }

    #[tokio::test]
    async fn test_open_create_get() {
        let (store, _temp) = test_store();
        let account = store
            .create_account(OwnerId::new(), AccountKind::Savings)
            .unwrap();

        let fetched = store.get_account(account.id).unwrap();
        assert_eq!(fetched.id, account.id);
        assert_eq!(fetched.balance, Decimal::ZERO);
        assert_eq!(fetched.number, account.number);
    }

    #[tokio::test]
    async fn test_commit_is_atomic_and_visible() {
        let (store, _temp) = test_store();
        let account = store
            .create_account(OwnerId::new(), AccountKind::Current)
            .unwrap();

        let mut uow = store.begin().await.unwrap();
        let balance = uow.read_balance_exclusive(account.id).await.unwrap();
        uow.write_balance(account.id, balance + Decimal::from(25));
        uow.append_record(RecordDraft::deposit(account.id, Decimal::from(25)));

        assert_eq!(store.get_account(account.id).unwrap().balance, Decimal::ZERO);
        uow.commit().await.unwrap();

        assert_eq!(
            store.get_account(account.id).unwrap().balance,
            Decimal::from(25)
        );
        let records = store.transactions(account.id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TransactionKind::Deposit);
        assert_eq!(records[0].id.as_u64(), 1);
    }

    #[tokio::test]
    async fn test_abort_leaves_no_trace() {
        let (store, _temp) = test_store();
        let account = store
            .create_account(OwnerId::new(), AccountKind::Savings)
            .unwrap();

        let mut uow = store.begin().await.unwrap();
        uow.read_balance_exclusive(account.id).await.unwrap();
        uow.write_balance(account.id, Decimal::from(500));
        uow.append_record(RecordDraft::deposit(account.id, Decimal::from(500)));
        uow.abort();

        assert_eq!(store.get_account(account.id).unwrap().balance, Decimal::ZERO);
        assert!(store.transactions(account.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_owner_index_scoped_to_owner() {
        let (store, _temp) = test_store();
        let owner = OwnerId::new();
        let other = OwnerId::new();

        let a = store.create_account(owner, AccountKind::Savings).unwrap();
        let b = store.create_account(owner, AccountKind::Current).unwrap();
        store.create_account(other, AccountKind::Savings).unwrap();

        let mut expected = vec![a.id, b.id];
        expected.sort();

        let listed: Vec<AccountId> = store
            .accounts_by_owner(owner)
            .unwrap()
            .into_iter()
            .map(|account| account.id)
            .collect();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn test_record_ids_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let account_id = {
            let store = RocksStore::open(&config).unwrap();
            let account = store
                .create_account(OwnerId::new(), AccountKind::Savings)
                .unwrap();

            let mut uow = store.begin().await.unwrap();
            let balance = uow.read_balance_exclusive(account.id).await.unwrap();
            uow.write_balance(account.id, balance + Decimal::from(10));
            uow.append_record(RecordDraft::deposit(account.id, Decimal::from(10)));
            uow.commit().await.unwrap();
            account.id
        };

        // Reopen: the persisted sequence must continue, not restart.
        let store = RocksStore::open(&config).unwrap();
        let mut uow = store.begin().await.unwrap();
        let balance = uow.read_balance_exclusive(account_id).await.unwrap();
        assert_eq!(balance, Decimal::from(10));
        uow.write_balance(account_id, balance + Decimal::from(5));
        uow.append_record(RecordDraft::deposit(account_id, Decimal::from(5)));
        uow.commit().await.unwrap();

        let records = store.transactions(account_id).unwrap();
        let ids: Vec<u64> = records.iter().map(|r| r.id.as_u64()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_unknown_account_errors() {
        let (store, _temp) = test_store();
        let missing = AccountId::new();

        assert!(matches!(
            store.get_account(missing),
            Err(Error::AccountNotFound(id)) if id == missing
        ));
        assert!(matches!(
            store.transactions(missing),
            Err(Error::AccountNotFound(_))
        ));

        let mut uow = store.begin().await.unwrap();
        assert!(matches!(
            uow.read_balance_exclusive(missing).await,
            Err(Error::AccountNotFound(_))
        ));
    }
}
