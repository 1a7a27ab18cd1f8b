//! Error types for the teller service

use bank_core::{AccountId, OwnerId};
use thiserror::Error;

/// Result type for teller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Teller errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] bank_core::Error),

    /// Username or password did not verify
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Username is already registered
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Acting owner does not own the account
    #[error("Owner {owner} does not hold account {account}")]
    NotAccountOwner {
        /// Acting owner
        owner: OwnerId,
        /// Account the operation named
        account: AccountId,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
