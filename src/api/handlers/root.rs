use axum::{extract::Extension, http::HeaderMap, response::Response};
use std::sync::Arc;

use super::{principal::current_identity, redirect_to};
use crate::gate::{AuthError, AuthGate};

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 303, description = "To /home with a session, otherwise to /register")
    ),
    tag = "auth"
)]
pub async fn root(
    headers: HeaderMap,
    Extension(gate): Extension<Arc<AuthGate>>,
) -> Result<Response, AuthError> {
    let location = if current_identity(&gate, &headers).await?.is_some() {
        "/home"
    } else {
        "/register"
    };
    Ok(redirect_to(location))
}
