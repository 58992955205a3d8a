use super::store::StoreError;
use crate::api::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("No refresh token stored; sign in again")]
    NoRefreshToken,
    #[error("Session expired; sign in again")]
    RefreshRejected,
    /// Backend unreachable or timed out; the session was left unchanged.
    #[error(transparent)]
    Network(AppError),
    /// Unexpected status or undecodable response from the backend.
    #[error(transparent)]
    Backend(AppError),
    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.is_network() {
            Self::Network(err)
        } else {
            Self::Backend(err)
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Network(inner) | AuthError::Backend(inner) => inner,
            AuthError::Store(inner) => AppError::Store(inner.to_string()),
            other @ (AuthError::InvalidCredentials
            | AuthError::NoRefreshToken
            | AuthError::RefreshRejected) => AppError::Http {
                status: 401,
                message: other.to_string(),
            },
        }
    }
}
