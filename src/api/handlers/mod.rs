//! HTTP handlers and the mapping from gate errors to responses.
//!
//! Expected auth failures are not hard errors for a browser: duplicate
//! registration, bad credentials and missing sessions all redirect to
//! `/login` with a flash cookie. Only validation failures (422) and
//! internal errors (500) produce a JSON error body.

use axum::{
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::gate::AuthError;

pub mod flash;
pub mod health;
pub mod home;
pub mod login;
pub mod logout;
pub mod principal;
pub mod register;
pub mod root;
pub mod session;

use flash::Flash;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Form body posted by the register and login pages.
#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    #[schema(format = Password)]
    pub password: String,
}

pub(crate) fn redirect_to(location: &str) -> Response {
    Redirect::to(location).into_response()
}

/// 303 to `location`, appending each cookie as its own `Set-Cookie` header.
pub(crate) fn see_other<I>(location: &str, cookies: I) -> Response
where
    I: IntoIterator<Item = HeaderValue>,
{
    let mut response = Redirect::to(location).into_response();
    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody { error: message }),
            )
                .into_response(),
            Self::DuplicateIdentity => see_other("/login", [Flash::DuplicateIdentity.cookie()]),
            Self::InvalidCredentials => see_other("/login", [Flash::InvalidCredentials.cookie()]),
            Self::Unauthenticated => see_other("/login", [Flash::LoginRequired.cookie()]),
            Self::Internal(err) => {
                error!("Internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "Internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
