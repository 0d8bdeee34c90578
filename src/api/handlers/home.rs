use axum::{extract::Extension, http::HeaderMap, response::Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    flash::{json_clearing_flash, take_flash},
    principal::Principal,
};

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct HomeResponse {
    pub id: String,
    pub email: String,
    /// Pending flash message, e.g. the registration notice.
    pub message: Option<String>,
}

#[utoipa::path(
    get,
    path = "/home",
    responses(
        (status = 200, description = "Current identity and any pending message", body = HomeResponse),
        (status = 303, description = "No valid session, redirect to /login")
    ),
    security(("session_cookie" = [])),
    tag = "auth"
)]
pub async fn home(headers: HeaderMap, Extension(principal): Extension<Principal>) -> Response {
    let (message, consumed) = take_flash(&headers);
    json_clearing_flash(
        HomeResponse {
            id: principal.identity_id.to_string(),
            email: principal.email,
            message,
        },
        consumed,
    )
}
