//! Auth state and the provider that owns it. The provider is the single place
//! a session store lives; pages, the request client and the route guard all
//! receive it from here instead of reaching for a global.

use super::{guards::Navigator, guards::RouteGuard, session::SessionManager, store::TokenStore};
use crate::{
    api::{ApiClient, RetryPolicy, Transport},
    config::AppConfig,
};
use std::{fmt, sync::Arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
    Refreshing,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated => "authenticated",
            Self::Refreshing => "refreshing",
        };
        f.write_str(label)
    }
}

/// Owns the session store and hands out the collaborators built on it.
pub struct AuthProvider<T, S> {
    session: Arc<SessionManager<T, S>>,
    guard: RouteGuard<S>,
    navigator: Arc<dyn Navigator>,
}

impl<T: Transport, S: TokenStore> AuthProvider<T, S> {
    pub fn new(config: &AppConfig, transport: T, store: S, navigator: Arc<dyn Navigator>) -> Self {
        let store = Arc::new(store);
        let guard = RouteGuard::new(Arc::clone(&store), config);
        let session = Arc::new(SessionManager::new(
            transport,
            store,
            config.endpoints.clone(),
        ));

        Self {
            session,
            guard,
            navigator,
        }
    }

    pub fn session(&self) -> &Arc<SessionManager<T, S>> {
        &self.session
    }

    pub fn guard(&self) -> &RouteGuard<S> {
        &self.guard
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Request client sharing this provider's session, guard and navigator.
    pub fn client(&self) -> ApiClient<T, S> {
        self.client_with_policy(RetryPolicy::default())
    }

    pub fn client_with_policy(&self, policy: RetryPolicy) -> ApiClient<T, S> {
        ApiClient::new(
            Arc::clone(&self.session),
            self.guard.clone(),
            Arc::clone(&self.navigator),
        )
        .with_policy(policy)
    }

    pub fn state(&self) -> AuthState {
        self.session.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{guards::History, store::MemoryStore},
        testing::{seed_session, StubTransport},
    };

    #[test]
    fn provider_components_share_one_store() {
        let config = AppConfig::new("https://api.adpa.org").unwrap();
        let provider = AuthProvider::new(
            &config,
            StubTransport::new(),
            MemoryStore::new(),
            Arc::new(History::default()),
        );
        assert_eq!(provider.state(), AuthState::Anonymous);
        assert!(!provider.guard().is_authenticated());

        seed_session(provider.session().store().as_ref(), "T1", "R1");

        assert_eq!(provider.state(), AuthState::Authenticated);
        assert!(provider.guard().is_authenticated());
        assert_eq!(AuthState::Authenticated.to_string(), "authenticated");
    }
}
