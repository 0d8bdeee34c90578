//! Session cookie handling for cookie and bearer auth.

use anyhow::{Context, Result};
use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};

use crate::gate::AuthConfig;

pub const SESSION_COOKIE_NAME: &str = "cardbase_session";

/// Build an `HttpOnly` cookie carrying the session token.
pub(crate) fn session_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.secure_cookies() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).context("invalid session cookie")
}

pub(crate) fn clear_session_cookie(config: &AuthConfig) -> HeaderValue {
    if config.secure_cookies() {
        HeaderValue::from_static(
            "cardbase_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure",
        )
    } else {
        HeaderValue::from_static("cardbase_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

/// Value of the named cookie, if the request carries one.
pub(crate) fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            if key.trim() == name {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}

/// Session token from `Authorization: Bearer` or the session cookie, bearer first.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    read_cookie(headers, SESSION_COOKIE_NAME).filter(|token| !token.is_empty())
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
