//! Per-request identity binding for protected routes.

use axum::{
    extract::{Extension, Request},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use super::session::extract_session_token;
use crate::gate::{AuthError, AuthGate};
use crate::store::Identity;

/// Identity bound to the current request, inserted by [`require_auth`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub identity_id: Uuid,
    pub email: String,
}

impl From<&Identity> for Principal {
    fn from(identity: &Identity) -> Self {
        Self {
            identity_id: identity.id,
            email: identity.email.clone(),
        }
    }
}

/// Middleware run before every protected handler.
pub async fn require_auth(
    Extension(gate): Extension<Arc<AuthGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_session_token(request.headers());
    match gate.authorize(token.as_deref()).await {
        Ok(identity) => {
            request.extensions_mut().insert(Principal::from(&identity));
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Identity behind the request on public routes; a missing or stale session is `None`.
pub(crate) async fn current_identity(
    gate: &AuthGate,
    headers: &HeaderMap,
) -> Result<Option<Identity>, AuthError> {
    let token = extract_session_token(headers);
    match gate.authorize(token.as_deref()).await {
        Ok(identity) => Ok(Some(identity)),
        Err(AuthError::Unauthenticated) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Session check for the sign-in posts: `true` when the request already carries a
/// valid session. A stale token is revoked so its record does not linger.
pub(crate) async fn resume_or_revoke(
    gate: &AuthGate,
    headers: &HeaderMap,
) -> Result<bool, AuthError> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(false);
    };
    match gate.authorize(Some(&token)).await {
        Ok(_) => Ok(true),
        Err(AuthError::Unauthenticated) => {
            gate.logout(Some(&token)).await?;
            Ok(false)
        }
        Err(err) => Err(err),
    }
}
