use axum::{extract::Extension, http::HeaderMap, response::Response, Form};
use std::sync::Arc;

use super::{
    flash::{page_response, Flash, PageMessage},
    principal::{current_identity, resume_or_revoke},
    redirect_to,
    see_other,
    session::session_cookie,
    CredentialsForm, ErrorBody,
};
use crate::gate::{AuthError, AuthGate};

#[utoipa::path(
    get,
    path = "/register",
    responses(
        (status = 200, description = "Registration page with any pending message", body = PageMessage),
        (status = 303, description = "Already signed in, redirect to /home")
    ),
    tag = "auth"
)]
pub async fn register_page(
    headers: HeaderMap,
    Extension(gate): Extension<Arc<AuthGate>>,
) -> Result<Response, AuthError> {
    if current_identity(&gate, &headers).await?.is_some() {
        return Ok(redirect_to("/home"));
    }
    Ok(page_response(&headers))
}

/// Create the account and sign it in.
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered and signed in (to /home), or email taken (to /login)"),
        (status = 422, description = "Invalid email or password", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register(
    headers: HeaderMap,
    Extension(gate): Extension<Arc<AuthGate>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AuthError> {
    if resume_or_revoke(&gate, &headers).await? {
        return Ok(redirect_to("/home"));
    }

    let identity = gate.register(&form.email, &form.password).await?;
    let session = gate.start_session(&identity).await?;
    let cookie = session_cookie(gate.config(), session.token())?;

    Ok(see_other("/home", [cookie, Flash::Registered.cookie()]))
}
