//! Route guard for member-only pages.
//!
//! The guard only asks whether an access token is stored. It does not check
//! expiry or signatures: any stored value passes, and the API stays the real
//! access control. When it denies a page it redirects to the login path and
//! carries the requested location in a `redirect` query parameter so the user
//! lands back there after signing in.

use super::store::{TokenStore, ACCESS_TOKEN_KEY};
use crate::config::AppConfig;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use url::form_urlencoded;

const REDIRECT_PARAM: &str = "redirect";

/// Where navigation goes; implemented by whatever owns the page history.
pub trait Navigator: Send + Sync {
    fn current(&self) -> String;
    fn navigate(&self, location: &str);
}

/// In-memory navigation history.
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self {
            entries: Mutex::new(vec![initial.to_string()]),
        }
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for History {
    fn current(&self) -> String {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }

    fn navigate(&self, location: &str) {
        debug!(location, "navigate");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(location.to_string());
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect { to: String },
}

pub struct RouteGuard<S> {
    store: Arc<S>,
    login_path: String,
    protected: Vec<String>,
}

impl<S> Clone for RouteGuard<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            login_path: self.login_path.clone(),
            protected: self.protected.clone(),
        }
    }
}

impl<S: TokenStore> RouteGuard<S> {
    pub fn new(store: Arc<S>, config: &AppConfig) -> Self {
        Self {
            store,
            login_path: config.login_path.clone(),
            protected: config.protected_paths.clone(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Token presence only; `"garbage"` and `""` both count as signed in.
    pub fn is_authenticated(&self) -> bool {
        self.store.get(ACCESS_TOKEN_KEY).is_some()
    }

    /// Prefix match on whole path segments: `/portal` covers `/portal` and
    /// `/portal/events`, not `/portals`.
    pub fn is_protected(&self, location: &str) -> bool {
        let path = path_of(location);
        self.protected.iter().any(|prefix| {
            prefix == "/"
                || path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// The login page always renders, even under a protected prefix.
    pub fn check(&self, location: &str) -> GuardDecision {
        if path_of(location.trim()) == self.login_path
            || !self.is_protected(location)
            || self.is_authenticated()
        {
            return GuardDecision::Render;
        }
        GuardDecision::Redirect {
            to: self.login_location(location),
        }
    }

    /// Login path with `intended` preserved for after sign-in. The site root
    /// and the login page itself are not worth preserving.
    pub fn login_location(&self, intended: &str) -> String {
        let intended = intended.trim();
        let path = path_of(intended);
        if path.is_empty() || path == "/" || path == self.login_path {
            return self.login_path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(REDIRECT_PARAM, intended)
            .finish();
        format!("{}?{query}", self.login_path)
    }

    /// Where to go after a successful login started from `login_location`.
    /// Anything but a local absolute path falls back to `/`.
    pub fn resume_target(&self, login_location: &str) -> String {
        let query = login_location
            .split_once('?')
            .map_or("", |(_, query)| query);
        let query = query.split_once('#').map_or(query, |(query, _)| query);

        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == REDIRECT_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|target| is_local_path(target) && path_of(target) != self.login_path)
            .unwrap_or_else(|| "/".to_string())
    }

    /// Applies `check` to `navigator` and returns the decision.
    pub fn navigate(&self, navigator: &dyn Navigator, location: &str) -> GuardDecision {
        let decision = self.check(location);
        match &decision {
            GuardDecision::Render => navigator.navigate(location),
            GuardDecision::Redirect { to } => {
                debug!(location, "protected page requested without a session");
                navigator.navigate(to);
            }
        }
        decision
    }
}

/// Strips query and fragment.
fn path_of(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    &location[..end]
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control)
}
