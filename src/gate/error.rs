use thiserror::Error;

use crate::store::StoreError;

pub const DUPLICATE_IDENTITY_MESSAGE: &str =
    "An account with that email already exists. Please log in.";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Please check your login details and try again.";
pub const UNAUTHENTICATED_MESSAGE: &str = "Please log in to access this page.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("{}", DUPLICATE_IDENTITY_MESSAGE)]
    DuplicateIdentity,

    /// Same text for unknown email and wrong password.
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,

    #[error("{}", UNAUTHENTICATED_MESSAGE)]
    Unauthenticated,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Internal(anyhow::anyhow!("unexpected store conflict")),
            StoreError::Other(err) => Self::Internal(err),
        }
    }
}
