//! The auth gate: credential storage, the login lifecycle and per-request identity binding.
//!
//! `AuthGate` is built once by the server action and shared with handlers as
//! `Extension<Arc<AuthGate>>`. Handlers never touch the store directly.
//!
//! Session lifecycle:
//! - `login` (or `start_session` after `register`) mints a random token,
//!   stores `SHA-256(token)` with an expiry and hands the raw token back for the cookie.
//! - `authorize` resolves the token to its identity, or fails with `Unauthenticated`.
//! - `logout` deletes the record. Unknown tokens are ignored.

use anyhow::Context;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::mail::{self, EmailSender};
use crate::store::{AuthStore, Identity, StoreError};

mod error;
mod password;
mod token;
pub mod validate;

pub use error::{
    AuthError, DUPLICATE_IDENTITY_MESSAGE, INVALID_CREDENTIALS_MESSAGE, UNAUTHENTICATED_MESSAGE,
};

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const SESSION_INSERT_ATTEMPTS: usize = 3;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    session_ttl_seconds: i64,
    secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            secure_cookies: false,
        }
    }

    /// Negative values are clamped to zero, which yields sessions that are already expired.
    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds.max(0);
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }
}

/// An authenticated session as handed back to the HTTP layer.
#[derive(Clone)]
pub struct Session {
    token: String,
    identity: Identity,
    expires_at_unix: i64,
}

impl Session {
    /// Raw token. Only ever written into the session cookie.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn expires_at_unix(&self) -> i64 {
        self.expires_at_unix
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"***")
            .field("identity", &self.identity)
            .field("expires_at_unix", &self.expires_at_unix)
            .finish()
    }
}

pub struct AuthGate {
    config: AuthConfig,
    store: Arc<dyn AuthStore>,
    mailer: Arc<dyn EmailSender>,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn AuthStore>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            config,
            store,
            mailer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn AuthStore> {
        &self.store
    }

    /// Create an identity and send the welcome mail in the background.
    ///
    /// # Errors
    /// `Validation` for bad input, `DuplicateIdentity` if the email is taken,
    /// `Internal` on store or hashing failures.
    pub async fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = validate::registration(email, password)?;

        if self.store.find_identity_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .context("password hashing task failed")??;

        // A concurrent registration can still win the race; the unique constraint decides.
        let identity = match self.store.insert_identity(&email, &password_hash).await {
            Ok(identity) => identity,
            Err(StoreError::Conflict) => return Err(AuthError::DuplicateIdentity),
            Err(err) => return Err(err.into()),
        };

        info!(identity_id = %identity.id, "identity registered");
        mail::dispatch(self.mailer.clone(), mail::welcome_message(&identity.email));

        Ok(identity)
    }

    /// Verify credentials and open a session.
    ///
    /// # Errors
    /// `Validation` for bad input, `InvalidCredentials` for an unknown email or a
    /// wrong password, `Internal` on store failures.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = validate::login(email, password)?;
        let identity = self.store.find_identity_by_email(&email).await?;

        let password = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || match identity {
            Some(identity) if password::verify_password(&password, identity.password_hash()) => {
                Some(identity)
            }
            Some(_) => None,
            None => {
                password::verify_dummy(&password);
                None
            }
        })
        .await
        .context("password verification task failed")?;

        let Some(identity) = verified else {
            warn!("login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        // Housekeeping only; a failed sweep never blocks a login.
        if let Err(err) = self.purge_expired_sessions().await {
            warn!("Failed to purge expired sessions: {err}");
        }

        self.start_session(&identity).await
    }

    /// Open a session for an identity that was just authenticated.
    ///
    /// # Errors
    /// `Internal` if no token could be stored.
    pub async fn start_session(&self, identity: &Identity) -> Result<Session, AuthError> {
        let ttl_seconds = self.config.session_ttl_seconds;

        for _ in 0..SESSION_INSERT_ATTEMPTS {
            let token = token::generate_session_token()?;
            let token_hash = token::hash_session_token(&token);
            match self
                .store
                .insert_session(identity.id, &token_hash, ttl_seconds)
                .await
            {
                Ok(expires_at_unix) => {
                    info!(identity_id = %identity.id, "session opened");
                    return Ok(Session {
                        token,
                        identity: identity.clone(),
                        expires_at_unix,
                    });
                }
                Err(StoreError::Conflict) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Err(AuthError::Internal(anyhow::anyhow!(
            "failed to allocate a unique session token"
        )))
    }

    /// Resolve the presented token to its identity.
    ///
    /// # Errors
    /// `Unauthenticated` when the token is missing, unknown, expired or orphaned.
    pub async fn authorize(&self, token: Option<&str>) -> Result<Identity, AuthError> {
        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return Err(AuthError::Unauthenticated);
        };
        let token_hash = token::hash_session_token(token);
        self.store
            .lookup_session(&token_hash)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    /// Invalidate the session behind `token`. Missing or stale sessions are not an error.
    ///
    /// # Errors
    /// `Internal` on store failures.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AuthError> {
        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return Ok(());
        };
        let token_hash = token::hash_session_token(token);
        self.store.delete_session(&token_hash).await?;
        Ok(())
    }

    /// Delete expired session records.
    ///
    /// # Errors
    /// `Internal` on store failures.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        let purged = self.store.purge_expired_sessions().await?;
        if purged > 0 {
            info!(purged, "expired sessions purged");
        }
        Ok(purged)
    }

    /// Administrative removal. Every session bound to the identity stops authorizing at once.
    ///
    /// # Errors
    /// `Internal` on store failures.
    pub async fn remove_identity(&self, id: Uuid) -> Result<bool, AuthError> {
        let removed = self.store.delete_identity(id).await?;
        if removed {
            info!(identity_id = %id, "identity removed");
        }
        Ok(removed)
    }
}
