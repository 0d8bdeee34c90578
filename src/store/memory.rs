//! In-process [`AuthStore`] backing the test suites.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{now_unix_seconds, AuthStore, Identity, StoreError};

#[derive(Debug, Clone)]
struct SessionRecord {
    identity_id: Uuid,
    expires_at_unix: i64,
}

#[derive(Debug, Default)]
struct State {
    identities: HashMap<Uuid, Identity>,
    by_email: HashMap<String, Uuid>,
    sessions: HashMap<Vec<u8>, SessionRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live session records, expired ones included.
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn insert_identity(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Identity, StoreError> {
        let mut state = self.state.lock().await;
        if state.by_email.contains_key(email) {
            return Err(StoreError::Conflict);
        }

        let identity = Identity::new(
            Uuid::new_v4(),
            email.to_string(),
            password_hash.to_string(),
            now_unix_seconds(),
        );
        state.by_email.insert(identity.email.clone(), identity.id);
        state.identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .by_email
            .get(email)
            .and_then(|id| state.identities.get(id))
            .cloned())
    }

    async fn delete_identity(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(identity) = state.identities.remove(&id) else {
            return Ok(false);
        };
        state.by_email.remove(&identity.email);
        state.sessions.retain(|_, record| record.identity_id != id);
        Ok(true)
    }

    async fn insert_session(
        &self,
        identity_id: Uuid,
        token_hash: &[u8],
        ttl_seconds: i64,
    ) -> Result<i64, StoreError> {
        let mut state = self.state.lock().await;
        if !state.identities.contains_key(&identity_id) {
            return Err(anyhow::anyhow!("identity {identity_id} does not exist").into());
        }
        if state.sessions.contains_key(token_hash) {
            return Err(StoreError::Conflict);
        }

        let expires_at_unix = now_unix_seconds().saturating_add(ttl_seconds);
        state.sessions.insert(
            token_hash.to_vec(),
            SessionRecord {
                identity_id,
                expires_at_unix,
            },
        );
        Ok(expires_at_unix)
    }

    async fn lookup_session(&self, token_hash: &[u8]) -> Result<Option<Identity>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(record) = state.sessions.get(token_hash).cloned() else {
            return Ok(None);
        };

        if record.expires_at_unix <= now_unix_seconds() {
            state.sessions.remove(token_hash);
            return Ok(None);
        }

        Ok(state.identities.get(&record.identity_id).cloned())
    }

    async fn delete_session(&self, token_hash: &[u8]) -> Result<(), StoreError> {
        self.state.lock().await.sessions.remove(token_hash);
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> Result<u64, StoreError> {
        let now = now_unix_seconds();
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, record| record.expires_at_unix > now);
        Ok(u64::try_from(before - state.sessions.len()).unwrap_or(u64::MAX))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_identity_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let first = store
            .insert_identity("a@x.com", "hash-one")
            .await
            .expect("first insert");

        let err = store
            .insert_identity("a@x.com", "hash-two")
            .await
            .expect_err("duplicate insert");
        assert!(matches!(err, StoreError::Conflict));

        let stored = store
            .find_identity_by_email("a@x.com")
            .await
            .expect("lookup")
            .expect("identity present");
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.password_hash(), "hash-one");
    }

    #[tokio::test]
    async fn lookup_session_honours_expiry() {
        let store = MemoryStore::new();
        let identity = store.insert_identity("a@x.com", "h").await.expect("insert");

        store
            .insert_session(identity.id, b"live", 60)
            .await
            .expect("live session");
        store
            .insert_session(identity.id, b"dead", 0)
            .await
            .expect("expired session");

        let found = store.lookup_session(b"live").await.expect("lookup");
        assert_eq!(found.map(|i| i.id), Some(identity.id));
        assert!(store.lookup_session(b"dead").await.expect("lookup").is_none());
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn insert_session_rejects_hash_collision() {
        let store = MemoryStore::new();
        let identity = store.insert_identity("a@x.com", "h").await.expect("insert");
        store
            .insert_session(identity.id, b"same", 60)
            .await
            .expect("first session");
        let err = store
            .insert_session(identity.id, b"same", 60)
            .await
            .expect_err("collision");
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn delete_identity_drops_its_sessions() {
        let store = MemoryStore::new();
        let keep = store.insert_identity("keep@x.com", "h").await.expect("insert");
        let gone = store.insert_identity("gone@x.com", "h").await.expect("insert");
        store.insert_session(keep.id, b"k", 60).await.expect("session");
        store.insert_session(gone.id, b"g1", 60).await.expect("session");
        store.insert_session(gone.id, b"g2", 60).await.expect("session");

        assert!(store.delete_identity(gone.id).await.expect("delete"));
        assert!(!store.delete_identity(gone.id).await.expect("second delete"));

        assert!(store.lookup_session(b"g1").await.expect("lookup").is_none());
        assert!(store.lookup_session(b"g2").await.expect("lookup").is_none());
        assert!(store.lookup_session(b"k").await.expect("lookup").is_some());
        assert!(store
            .find_identity_by_email("gone@x.com")
            .await
            .expect("lookup")
            .is_none());
    }

    #[tokio::test]
    async fn purge_drops_only_expired_sessions() {
        let store = MemoryStore::new();
        let identity = store.insert_identity("a@x.com", "h").await.expect("insert");
        store.insert_session(identity.id, b"live", 60).await.expect("session");
        store.insert_session(identity.id, b"dead1", 0).await.expect("session");
        store.insert_session(identity.id, b"dead2", 0).await.expect("session");

        assert_eq!(store.purge_expired_sessions().await.expect("purge"), 2);
        assert_eq!(store.session_count().await, 1);
        assert_eq!(store.purge_expired_sessions().await.expect("purge"), 0);
        assert!(store.lookup_session(b"live").await.expect("lookup").is_some());
    }

    #[tokio::test]
    async fn delete_session_is_idempotent() {
        let store = MemoryStore::new();
        store.delete_session(b"missing").await.expect("no-op delete");
    }
}
