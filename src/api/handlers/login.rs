use axum::{extract::Extension, http::HeaderMap, response::Response, Form};
use std::sync::Arc;

use super::{
    flash::{page_response, PageMessage},
    principal::{current_identity, resume_or_revoke},
    redirect_to,
    see_other,
    session::session_cookie,
    CredentialsForm, ErrorBody,
};
use crate::gate::{AuthError, AuthGate};

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login page with any pending message", body = PageMessage),
        (status = 303, description = "Already signed in, redirect to /home")
    ),
    tag = "auth"
)]
pub async fn login_page(
    headers: HeaderMap,
    Extension(gate): Extension<Arc<AuthGate>>,
) -> Result<Response, AuthError> {
    if current_identity(&gate, &headers).await?.is_some() {
        return Ok(redirect_to("/home"));
    }
    Ok(page_response(&headers))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in (to /home), or credentials rejected (to /login)"),
        (status = 422, description = "Email or password outside the allowed length", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    Extension(gate): Extension<Arc<AuthGate>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AuthError> {
    // One session per agent: a still-valid one short-circuits, a stale one is revoked.
    if resume_or_revoke(&gate, &headers).await? {
        return Ok(redirect_to("/home"));
    }

    let session = gate.login(&form.email, &form.password).await?;
    let cookie = session_cookie(gate.config(), session.token())?;

    Ok(see_other("/home", [cookie]))
}
