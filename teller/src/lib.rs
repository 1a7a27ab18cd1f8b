//! Teller Service
//!
//! Owner-facing banking service over the ledger core:
//!
//! 1. **Identity**: register and verify users through an opaque
//!    credential seam
//! 2. **Accounts**: open accounts and list them per owner
//! 3. **Operations**: deposit, withdraw, and transfer, scoped to the
//!    accounts the acting owner holds
//! 4. **History**: per-account transaction history, newest first
//!
//! Presentation and transport stay outside; this crate ends at the
//! service seam.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod error;
pub mod identity;
pub mod service;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use identity::{IdentityVerifier, InMemoryIdentity};
pub use service::Teller;
