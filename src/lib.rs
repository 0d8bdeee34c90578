//! # CardBase auth gate
//!
//! Account registration, password login and server-side sessions for the
//! CardBase apps. Everything behind `/home` (and any route added to the
//! protected router) only runs once the gate has bound a verified identity to
//! the request.
//!
//! ## Credentials
//!
//! Passwords are hashed with Argon2id (PHC strings, random salt). Emails are
//! trimmed and lowercased before they are stored or looked up, and are unique.
//! A failed login never reveals whether the email exists.
//!
//! ## Sessions
//!
//! A session is an opaque 32-byte random token handed to the browser in an
//! `HttpOnly` cookie (or sent back as a bearer token). The database only keeps
//! its SHA-256, the identity it belongs to and an expiry. Logout and identity
//! removal delete the record, so the token stops working immediately.

pub mod api;
pub mod cli;
pub mod gate;
pub mod mail;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
