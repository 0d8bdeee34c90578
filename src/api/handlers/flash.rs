//! One-shot status messages carried across a redirect in a short-lived cookie.

use axum::{
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::session::read_cookie;
use crate::gate::{DUPLICATE_IDENTITY_MESSAGE, INVALID_CREDENTIALS_MESSAGE, UNAUTHENTICATED_MESSAGE};

pub const FLASH_COOKIE_NAME: &str = "cardbase_flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flash {
    Registered,
    DuplicateIdentity,
    InvalidCredentials,
    LoginRequired,
}

impl Flash {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::DuplicateIdentity => "duplicate_identity",
            Self::InvalidCredentials => "invalid_credentials",
            Self::LoginRequired => "login_required",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registered" => Some(Self::Registered),
            "duplicate_identity" => Some(Self::DuplicateIdentity),
            "invalid_credentials" => Some(Self::InvalidCredentials),
            "login_required" => Some(Self::LoginRequired),
            _ => None,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Registered => {
                "Registration successful! An email has been sent to your email address."
            }
            Self::DuplicateIdentity => DUPLICATE_IDENTITY_MESSAGE,
            Self::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE,
            Self::LoginRequired => UNAUTHENTICATED_MESSAGE,
        }
    }

    #[must_use]
    pub fn cookie(self) -> HeaderValue {
        HeaderValue::from_static(match self {
            Self::Registered => "cardbase_flash=registered; Path=/; HttpOnly; SameSite=Lax; Max-Age=60",
            Self::DuplicateIdentity => {
                "cardbase_flash=duplicate_identity; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
            }
            Self::InvalidCredentials => {
                "cardbase_flash=invalid_credentials; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
            }
            Self::LoginRequired => {
                "cardbase_flash=login_required; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
            }
        })
    }
}

fn clear_flash_cookie() -> HeaderValue {
    HeaderValue::from_static("cardbase_flash=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct PageMessage {
    /// Pending flash message, if any.
    pub message: Option<String>,
}

/// Read the pending flash, if any. The flag says whether a flash cookie was present
/// and must be cleared, even when its kind is unknown.
pub(crate) fn take_flash(headers: &HeaderMap) -> (Option<String>, bool) {
    let pending = read_cookie(headers, FLASH_COOKIE_NAME);
    let message = pending
        .as_deref()
        .and_then(Flash::parse)
        .map(|flash| flash.message().to_string());
    (message, pending.is_some())
}

/// 200 JSON response that clears the flash cookie once it has been shown.
pub(crate) fn json_clearing_flash<T: Serialize>(body: T, consumed: bool) -> Response {
    let mut response = (StatusCode::OK, Json(body)).into_response();
    if consumed {
        response
            .headers_mut()
            .append(SET_COOKIE, clear_flash_cookie());
    }
    response
}

/// Render a form page: hand out the pending flash once and clear it.
pub(crate) fn page_response(headers: &HeaderMap) -> Response {
    let (message, consumed) = take_flash(headers);
    json_clearing_flash(PageMessage { message }, consumed)
}
