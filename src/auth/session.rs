//! Auth session manager: login, logout, refresh and profile lookup as atomic
//! operations against the token store.
//!
//! Flow Overview:
//! - `login` exchanges credentials for `{access, refresh, user}` and writes all
//!   three in one store update.
//! - `refresh` trades the stored refresh token for a new access token. A
//!   rejected refresh token always ends in a full logout; a stale refresh token
//!   is never left behind.
//! - `logout` revokes on the backend when it can and always clears the store.
//!
//! Every mutating operation holds the session gate, an async mutex, so a
//! refresh can never interleave with a login or logout. The same gate makes
//! refresh single-flight for the request client (`refresh_after_rejection`).

use super::{
    client,
    errors::AuthError,
    state::AuthState,
    store::{StoreError, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY},
    types::{LoginRequest, LogoutRequest, RefreshRequest, Session, UserProfile},
};
use crate::{api::Transport, config::Endpoints};
use secrecy::SecretString;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

pub struct SessionManager<T, S> {
    transport: T,
    store: Arc<S>,
    endpoints: Endpoints,
    gate: Mutex<()>,
    refreshing: AtomicBool,
}

/// Marks a refresh as in flight until dropped.
struct RefreshingFlag<'a>(&'a AtomicBool);

impl<'a> RefreshingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for RefreshingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Transport, S: TokenStore> SessionManager<T, S> {
    pub fn new(transport: T, store: Arc<S>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            store,
            endpoints,
            gate: Mutex::new(()),
            refreshing: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Signs in and persists the new session.
    ///
    /// # Errors
    /// `InvalidCredentials` when the backend rejects the credentials (the
    /// stored session is untouched), `Network` when it cannot be reached.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let _permit = self.gate.lock().await;

        let request = LoginRequest { email, password };
        let response = match client::login(&self.transport, &self.endpoints, &request).await {
            Ok(response) => response,
            Err(err) if err.is_rejection() => {
                info!("login rejected by identity backend");
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(err.into()),
        };

        let user_json = response
            .user
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StoreError::from)?;

        self.store.update(&[
            (ACCESS_TOKEN_KEY, Some(response.access.as_str())),
            (REFRESH_TOKEN_KEY, Some(response.refresh.as_str())),
            (USER_KEY, user_json.as_deref()),
        ])?;

        info!("session established");

        Ok(Session {
            access_token: Some(SecretString::from(response.access)),
            refresh_token: Some(SecretString::from(response.refresh)),
            user: response.user,
        })
    }

    /// Ends the session. Backend revocation is best-effort; the store is
    /// always cleared. Calling this while signed out does nothing.
    ///
    /// # Errors
    /// Only `Store`, when the cleared session could not be persisted. In that
    /// case the previous session is still intact.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _permit = self.gate.lock().await;
        self.logout_locked().await
    }

    async fn logout_locked(&self) -> Result<(), AuthError> {
        match self.store.get(REFRESH_TOKEN_KEY) {
            Some(refresh) => {
                let request = LogoutRequest { refresh: &refresh };
                if let Err(err) = client::logout(&self.transport, &self.endpoints, &request).await {
                    warn!("backend logout failed, clearing local session anyway: {err}");
                }
            }
            None => debug!("no refresh token stored, skipping backend logout"),
        }

        self.store.clear()?;
        info!("session cleared");
        Ok(())
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Returns `Ok(None)` when the backend rejected the refresh token; the
    /// session has been logged out by then.
    ///
    /// # Errors
    /// `NoRefreshToken` when nothing is stored (the store is cleared),
    /// `Network` when the backend is unreachable (the session is unchanged).
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> Result<Option<SecretString>, AuthError> {
        let _permit = self.gate.lock().await;
        self.refresh_locked().await
    }

    /// Single-flight refresh for a request that was rejected while carrying
    /// `rejected` as its access token.
    ///
    /// If the stored access token changed while waiting for the gate, another
    /// caller already refreshed (or logged out) and its result is returned
    /// without contacting the backend again.
    ///
    /// # Errors
    /// Same as [`SessionManager::refresh`].
    #[instrument(skip_all)]
    pub async fn refresh_after_rejection(
        &self,
        rejected: Option<&str>,
    ) -> Result<Option<SecretString>, AuthError> {
        let _permit = self.gate.lock().await;

        let current = self.store.get(ACCESS_TOKEN_KEY);
        if current.as_deref() != rejected {
            debug!("session changed while waiting for refresh, reusing stored access token");
            return Ok(current.map(SecretString::from));
        }

        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<Option<SecretString>, AuthError> {
        match self.exchange_refresh_token().await {
            Ok(access) => Ok(Some(access)),
            Err(AuthError::RefreshRejected) => {
                warn!("refresh token rejected, ending session");
                self.logout_locked().await?;
                Ok(None)
            }
            Err(AuthError::NoRefreshToken) => {
                warn!("refresh requested without a stored refresh token, ending session");
                self.logout_locked().await?;
                Err(AuthError::NoRefreshToken)
            }
            Err(err) => Err(err),
        }
    }

    async fn exchange_refresh_token(&self) -> Result<SecretString, AuthError> {
        let refresh_token = self
            .store
            .get(REFRESH_TOKEN_KEY)
            .ok_or(AuthError::NoRefreshToken)?;

        let _flag = RefreshingFlag::raise(&self.refreshing);

        let request = RefreshRequest {
            refresh: &refresh_token,
        };
        let response = client::refresh(&self.transport, &self.endpoints, &request)
            .await
            .map_err(|err| {
                if err.is_rejection() {
                    AuthError::RefreshRejected
                } else {
                    AuthError::from(err)
                }
            })?;

        let mut changes = vec![(ACCESS_TOKEN_KEY, Some(response.access.as_str()))];
        match response.refresh.as_deref().filter(|rotated| !rotated.is_empty()) {
            Some(rotated) => {
                debug!("refresh token rotated");
                changes.push((REFRESH_TOKEN_KEY, Some(rotated)));
            }
            None => debug!("refresh token kept"),
        }
        self.store.update(&changes)?;

        info!("access token refreshed");
        Ok(SecretString::from(response.access))
    }

    /// Reads the cached profile. Never touches the network.
    pub fn current_user(&self) -> Option<UserProfile> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                debug!("cached user profile is not valid JSON: {err}");
                None
            }
        }
    }

    pub fn session(&self) -> Session {
        Session {
            access_token: self.store.get(ACCESS_TOKEN_KEY).map(SecretString::from),
            refresh_token: self.store.get(REFRESH_TOKEN_KEY).map(SecretString::from),
            user: self.current_user(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.get(ACCESS_TOKEN_KEY).is_some()
    }

    pub fn state(&self) -> AuthState {
        if self.refreshing.load(Ordering::Acquire) {
            AuthState::Refreshing
        } else if self.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }
}
