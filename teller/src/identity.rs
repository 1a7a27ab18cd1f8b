//! Identity verification
//!
//! Opaque collaborator of the ledger: it turns credentials into a
//! verified `OwnerId` or fails, and nothing downstream depends on how
//! it stores them. The in-memory implementation keeps a per-user
//! random salt and a SHA-256 digest, never the password itself.

use crate::error::{Error, Result};
use async_trait::async_trait;
use bank_core::OwnerId;
use dashmap::DashMap;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Credential registration and verification seam.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Register a new user; fails if the username is taken.
    async fn register(&self, username: &str, password: &str) -> Result<OwnerId>;

    /// Verify credentials, returning the owner they belong to.
    async fn verify(&self, username: &str, password: &str) -> Result<OwnerId>;
}

#[derive(Debug, Clone)]
struct UserRecord {
    owner_id: OwnerId,
    salt: [u8; 16],
    digest: [u8; 32],
}

/// In-memory identity store with salted credential digests.
#[derive(Debug, Default)]
pub struct InMemoryIdentity {
    users: DashMap<String, UserRecord>,
}

impl InMemoryIdentity {
    /// Empty identity store.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    fn digest(salt: &[u8; 16], password: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hasher.finalize().into()
    }
}

#[async_trait]
impl IdentityVerifier for InMemoryIdentity {
    async fn register(&self, username: &str, password: &str) -> Result<OwnerId> {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);

        let record = UserRecord {
            owner_id: OwnerId::new(),
            salt,
            digest: Self::digest(&salt, password),
        };
        let owner_id = record.owner_id;

        // Entry-level insert so two racing registrations of the same
        // username cannot both win.
        match self.users.entry(username.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(Error::UsernameTaken(username.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(record);
                tracing::info!(%username, owner = %owner_id, "User registered");
                Ok(owner_id)
            }
        }
    }

    async fn verify(&self, username: &str, password: &str) -> Result<OwnerId> {
        let record = self
            .users
            .get(username)
            .ok_or(Error::InvalidCredentials)?;

        if Self::digest(&record.salt, password) != record.digest {
            return Err(Error::InvalidCredentials);
        }

        Ok(record.owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_then_verify() {
        let identity = InMemoryIdentity::new();

        let owner = identity.register("alice", "hunter2").await.unwrap();
        let verified = identity.verify("alice", "hunter2").await.unwrap();
        assert_eq!(owner, verified);
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let identity = InMemoryIdentity::new();
        identity.register("alice", "hunter2").await.unwrap();

        assert!(matches!(
            identity.verify("alice", "hunter3").await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let identity = InMemoryIdentity::new();
        assert!(matches!(
            identity.verify("nobody", "anything").await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let identity = InMemoryIdentity::new();
        identity.register("alice", "hunter2").await.unwrap();

        assert!(matches!(
            identity.register("alice", "other").await,
            Err(Error::UsernameTaken(name)) if name == "alice"
        ));
    }

    #[tokio::test]
    async fn test_same_password_distinct_digests() {
        // Per-user salts: equal passwords must not produce equal digests.
        let identity = InMemoryIdentity::new();
        identity.register("alice", "hunter2").await.unwrap();
        identity.register("bob", "hunter2").await.unwrap();

        let alice = identity.users.get("alice").unwrap().value().clone();
        let bob = identity.users.get("bob").unwrap().value().clone();
        assert_ne!(alice.digest, bob.digest);
        assert_ne!(alice.owner_id, bob.owner_id);
    }
}
