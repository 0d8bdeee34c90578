use axum::{extract::Extension, http::HeaderMap, response::Response};
use std::sync::Arc;
use tracing::error;

use super::{
    see_other,
    session::{clear_session_cookie, extract_session_token},
};
use crate::gate::AuthGate;

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared, redirect to /login")
    ),
    security(("session_cookie" = [])),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, Extension(gate): Extension<Arc<AuthGate>>) -> Response {
    let token = extract_session_token(&headers);
    if let Err(err) = gate.logout(token.as_deref()).await {
        error!("Failed to delete session: {err}");
    }

    // Always clear the cookie, even if the session record was missing.
    see_other("/login", [clear_session_cookie(gate.config())])
}
