//! Persistence seam for identities and server-side sessions.
//!
//! The gate never talks to a database directly; it goes through [`AuthStore`].
//! `PgStore` is the production implementation, `MemoryStore` backs the tests
//! and nothing else.
//!
//! Two rules every implementation must follow:
//! - a duplicate email on insert is reported as [`StoreError::Conflict`],
//! - deleting an identity removes every session bound to it.

use async_trait::async_trait;
use std::fmt;
use std::time::SystemTime;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Stored credential record.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    password_hash: String,
    pub created_at_unix: i64,
}

impl Identity {
    #[must_use]
    pub fn new(id: Uuid, email: String, password_hash: String, created_at_unix: i64) -> Self {
        Self {
            id,
            email,
            password_hash,
            created_at_unix,
        }
    }

    /// PHC-formatted Argon2 hash of the password.
    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .field("created_at_unix", &self.created_at_unix)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (duplicate email or session hash).
    #[error("unique constraint violated")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Persist a new identity. The email is expected to be normalized already.
    async fn insert_identity(&self, email: &str, password_hash: &str)
        -> Result<Identity, StoreError>;

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    /// Remove an identity together with its sessions. Returns whether it existed.
    async fn delete_identity(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Store a session keyed by the token hash and return its expiry (unix seconds).
    async fn insert_session(
        &self,
        identity_id: Uuid,
        token_hash: &[u8],
        ttl_seconds: i64,
    ) -> Result<i64, StoreError>;

    /// Resolve an unexpired session to its identity.
    async fn lookup_session(&self, token_hash: &[u8]) -> Result<Option<Identity>, StoreError>;

    /// Idempotent: deleting an unknown session is not an error.
    async fn delete_session(&self, token_hash: &[u8]) -> Result<(), StoreError>;

    /// Drop every expired session record. Returns how many were removed.
    async fn purge_expired_sessions(&self) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
