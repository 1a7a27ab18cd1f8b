//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)
//! - Immutability of committed history

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account identifier.
///
/// UUIDv7, so byte order equals creation order. The `Ord` impl defines
/// the canonical lock order for operations touching two accounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Mint a fresh account ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Raw bytes (storage keys).
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owner (user) identifier, supplied by the identity layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Mint a fresh owner ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Raw bytes (storage keys).
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display account number (12 hex characters), unique and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Generate a fresh 12-character number.
    pub fn generate() -> Self {
        let mut number = Uuid::new_v4().simple().to_string();
        number.truncate(12);
        Self(number)
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account kind. A label only; no ledger behavior varies by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AccountKind {
    /// Savings account
    Savings = 1,
    /// Current account
    Current = 2,
}

impl AccountKind {
    /// Label as string
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Savings => "savings",
            AccountKind::Current => "current",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "savings" => Some(AccountKind::Savings),
            "current" => Some(AccountKind::Current),
            _ => None,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ledger account.
///
/// `balance` is the only mutable field, and only the engine's atomic
/// operations mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier
    pub id: AccountId,

    /// Display number
    pub number: AccountNumber,

    /// Owning user
    pub owner_id: OwnerId,

    /// Kind label
    pub kind: AccountKind,

    /// Current balance (exact decimal, non-negative when committed)
    pub balance: Decimal,

    /// Creation timestamp
    pub opened_at: DateTime<Utc>,
}

impl Account {
    /// Open a fresh account with a zero balance.
    pub(crate) fn open(owner_id: OwnerId, kind: AccountKind) -> Self {
        Self {
            id: AccountId::new(),
            number: AccountNumber::generate(),
            owner_id,
            kind,
            balance: Decimal::ZERO,
            opened_at: Utc::now(),
        }
    }
}

/// Transaction record identifier, assigned monotonically by the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RecordId(u64);

impl RecordId {
    /// Numeric value (storage keys, ordering).
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionKind {
    /// Funds deposited into an account
    Deposit = 1,
    /// Funds withdrawn from an account
    Withdrawal = 2,
    /// Funds moved between two accounts
    Transfer = 3,
}

impl TransactionKind {
    /// Label as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable, committed transaction record.
///
/// Every Transfer produces exactly two of these, one per account, same
/// amount, each referencing the other account as counterparty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Monotonic record ID
    pub id: RecordId,

    /// Account this record is filed against
    pub account_id: AccountId,

    /// Kind of movement
    pub kind: TransactionKind,

    /// Amount moved (strictly positive)
    pub amount: Decimal,

    /// Counterparty account; present only for transfers
    pub related_account_id: Option<AccountId>,

    /// Commit timestamp, non-decreasing per account
    pub timestamp: DateTime<Utc>,
}

/// A record as the engine stages it; the store assigns `id` and
/// `timestamp` at commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDraft {
    /// Account this record is filed against
    pub account_id: AccountId,

    /// Kind of movement
    pub kind: TransactionKind,

    /// Amount moved (strictly positive)
    pub amount: Decimal,

    /// Counterparty account; present only for transfers
    pub related_account_id: Option<AccountId>,
}

impl RecordDraft {
    /// Deposit record for an account.
    pub fn deposit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            kind: TransactionKind::Deposit,
            amount,
            related_account_id: None,
        }
    }

    /// Withdrawal record for an account.
    pub fn withdrawal(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            kind: TransactionKind::Withdrawal,
            amount,
            related_account_id: None,
        }
    }

    /// Transfer record filed against `account_id`, naming the other
    /// side of the movement.
    pub fn transfer(account_id: AccountId, amount: Decimal, counterparty: AccountId) -> Self {
        Self {
            account_id,
            kind: TransactionKind::Transfer,
            amount,
            related_account_id: Some(counterparty),
        }
    }
}
