//! Client wrappers for the identity backend endpoints. These go straight to the
//! transport, never through the refreshing `ApiClient`, so an auth endpoint
//! answering 401 cannot recurse into another refresh.

use crate::{
    api::{AppError, HttpRequest, Transport},
    auth::types::{LoginRequest, LoginResponse, LogoutRequest, RefreshRequest, RefreshResponse},
    config::Endpoints,
};
use serde::Serialize;
use serde_json::Value;

fn encode<B: Serialize>(body: &B) -> Result<Value, AppError> {
    serde_json::to_value(body)
        .map_err(|err| AppError::Serialization(format!("Failed to encode request: {err}")))
}

/// Exchanges credentials for a token pair and the user profile.
/// The request body holds the password and must never be logged.
pub(crate) async fn login<T: Transport>(
    transport: &T,
    endpoints: &Endpoints,
    request: &LoginRequest<'_>,
) -> Result<LoginResponse, AppError> {
    let body = encode(request)?;
    transport
        .send(HttpRequest::post(&endpoints.login, body))
        .await?
        .json()
}

/// Revokes the refresh token on the backend. Only a 2xx counts as success.
pub(crate) async fn logout<T: Transport>(
    transport: &T,
    endpoints: &Endpoints,
    request: &LogoutRequest<'_>,
) -> Result<(), AppError> {
    let body = encode(request)?;
    let response = transport
        .send(HttpRequest::post(&endpoints.logout, body))
        .await?;
    if response.is_success() {
        Ok(())
    } else {
        Err(response.error())
    }
}

/// Exchanges the refresh token for a new access token, possibly rotating it.
pub(crate) async fn refresh<T: Transport>(
    transport: &T,
    endpoints: &Endpoints,
    request: &RefreshRequest<'_>,
) -> Result<RefreshResponse, AppError> {
    let body = encode(request)?;
    transport
        .send(HttpRequest::post(&endpoints.refresh, body))
        .await?
        .json()
}
