//! Request client for portal API calls.
//!
//! Every page-level call goes through `ApiClient::send`, which attaches the
//! stored access token and owns the one retry policy in the crate:
//! - a 401 triggers a single-flight refresh, then exactly one replay with the
//!   new token;
//! - a failed refresh, or a replay that is rejected again, ends the session
//!   and sends the navigator to the login page;
//! - the caller always gets the 401 back in those cases, never a loop.

use super::{
    errors::AppError,
    transport::{HttpRequest, HttpResponse, Transport},
};
use crate::auth::{
    errors::AuthError,
    guards::{Navigator, RouteGuard},
    session::SessionManager,
    store::{TokenStore, ACCESS_TOKEN_KEY},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Refresh the session and replay once when a request comes back 401.
    pub refresh_on_unauthorized: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            refresh_on_unauthorized: true,
        }
    }
}

pub struct ApiClient<T, S> {
    session: Arc<SessionManager<T, S>>,
    guard: RouteGuard<S>,
    navigator: Arc<dyn Navigator>,
    policy: RetryPolicy,
}

impl<T: Transport, S: TokenStore> ApiClient<T, S> {
    pub fn new(
        session: Arc<SessionManager<T, S>>,
        guard: RouteGuard<S>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            guard,
            navigator,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sends `request` with the stored bearer token.
    ///
    /// Any status other than a final 401 comes back as `Ok`; use the typed
    /// helpers to turn non-2xx statuses into errors.
    ///
    /// # Errors
    /// `AppError::Http` with status 401 when the session could not be
    /// recovered (the session is cleared by then), `AppError::Network` or
    /// `AppError::Timeout` when the backend is unreachable.
    #[instrument(skip_all, fields(http.method = %request.method, path = %request.path))]
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let access = self.session.store().get(ACCESS_TOKEN_KEY);
        let response = self.dispatch(&request, access.as_deref()).await?;

        if !response.is_unauthorized() || !self.policy.refresh_on_unauthorized {
            return Ok(response);
        }

        debug!("request rejected with 401, refreshing session");

        match self.session.refresh_after_rejection(access.as_deref()).await {
            Ok(Some(token)) => {
                let replay = self.dispatch(&request, Some(token.expose_secret())).await?;
                if replay.is_unauthorized() {
                    warn!("replayed request rejected again, ending session");
                    self.force_logout().await;
                    return Err(replay.error());
                }
                Ok(replay)
            }
            Ok(None) | Err(AuthError::NoRefreshToken) => {
                self.force_logout().await;
                Err(response.error())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// # Errors
    /// Transport errors, `AppError::Http` for non-2xx statuses, and
    /// `AppError::Parse` when the body does not decode into `R`.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, AppError> {
        self.send(HttpRequest::get(path)).await?.json()
    }

    /// # Errors
    /// Same as [`ApiClient::get_json`], plus `AppError::Serialization` when
    /// `body` cannot be encoded.
    pub async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, AppError> {
        let body = serde_json::to_value(body)
            .map_err(|err| AppError::Serialization(format!("Failed to encode request: {err}")))?;
        self.send(HttpRequest::post(path, body)).await?.json()
    }

    /// # Errors
    /// Transport errors and `AppError::Http` for non-2xx statuses.
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        let response = self.send(HttpRequest::delete(path)).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(response.error())
        }
    }

    async fn dispatch(
        &self,
        request: &HttpRequest,
        token: Option<&str>,
    ) -> Result<HttpResponse, AppError> {
        let request = request
            .clone()
            .with_bearer(token.map(|token| SecretString::from(token.to_string())));
        self.session.transport().send(request).await
    }

    async fn force_logout(&self) {
        if let Err(err) = self.session.logout().await {
            error!("failed to clear session after authorization failure: {err}");
        }
        let target = self.guard.login_location(&self.navigator.current());
        self.navigator.navigate(&target);
    }
}
