//! Error types for the ledger

use crate::types::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Amount was zero or negative; rejected before any store access
    #[error("Invalid amount: {0} (must be positive)")]
    InvalidAmount(Decimal),

    /// Transfer names the same account on both sides
    #[error("Transfer source and destination are the same account: {0}")]
    SameAccount(AccountId),

    /// Referenced account does not exist
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Authoritative balance at lock time is below the requested amount
    #[error("Insufficient funds in {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account that failed the funds check
        account: AccountId,
        /// Committed balance observed under the lock
        balance: Decimal,
        /// Amount the operation asked for
        requested: Decimal,
    },

    /// Exclusive access could not be obtained within the bound
    #[error("Lock timeout on account: {0}")]
    LockTimeout(AccountId),

    /// Storage error (RocksDB or unit-of-work failure)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
