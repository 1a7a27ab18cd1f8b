//! Bank Ledger Core
//!
//! Atomic, auditable balance mutation over a concurrently shared store.
//!
//! # Architecture
//!
//! - **Unit of Work**: Every operation reads, writes, and logs inside
//!   one atomic scope that commits or aborts as a whole
//! - **Per-Account Locks**: Exclusive reads serialize conflicting
//!   operations; disjoint accounts proceed in parallel
//! - **Canonical Lock Order**: Two-account operations lock in ascending
//!   account id, so opposing transfers cannot deadlock
//! - **Append-Only Log**: Every balance change leaves an immutable
//!   transaction record in the same commit
//!
//! # Invariants
//!
//! - Committed balances are never negative
//! - A transfer conserves the total over its two accounts
//! - Every transfer leaves exactly two records, mutually referencing
//! - Records are never modified or deleted

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod history;
pub mod locks;
pub mod memory;
pub mod metrics;
pub mod storage;
pub mod store;
pub mod types;

// Re-exports
pub use config::Config;
pub use directory::AccountDirectory;
pub use engine::LedgerEngine;
pub use error::{Error, Result};
pub use history::TransactionLog;
pub use memory::MemoryStore;
pub use metrics::Metrics;
pub use storage::RocksStore;
pub use store::{LedgerStore, UnitOfWork};
pub use types::{
    Account, AccountId, AccountKind, AccountNumber, OwnerId, RecordDraft, RecordId,
    TransactionKind, TransactionRecord,
};
