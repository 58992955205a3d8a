//! Runtime configuration for the portal session layer: where the identity
//! backend lives, which paths are member-only, and where the session is
//! persisted. Values are public; never put tokens or passwords here.

use crate::api::AppError;
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Default request timeout applied by the HTTP transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_LOGIN_PATH: &str = "/login";

pub const DEFAULT_PROTECTED_PATH: &str = "/portal";

/// Identity backend endpoints, relative to the API base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub logout: String,
    pub refresh: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            logout: "/auth/logout".to_string(),
            refresh: "/auth/token/refresh".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub login_path: String,
    pub protected_paths: Vec<String>,
    pub store_path: PathBuf,
    pub timeout: Duration,
    pub endpoints: Endpoints,
}

impl AppConfig {
    /// Builds a config with defaults for everything but the API base URL.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the base URL is not an absolute http(s) URL.
    pub fn new(api_base_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            protected_paths: vec![DEFAULT_PROTECTED_PATH.to_string()],
            store_path: default_store_path(),
            timeout: DEFAULT_TIMEOUT,
            endpoints: Endpoints::default(),
        })
    }

    #[must_use]
    pub fn with_login_path(mut self, path: &str) -> Self {
        if let Some(path) = normalize_path(path) {
            self.login_path = path;
        }
        self
    }

    /// Replaces the protected prefixes; blank entries are dropped.
    #[must_use]
    pub fn with_protected_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let paths: Vec<String> = paths
            .into_iter()
            .filter_map(|path| normalize_path(path.as_ref()))
            .collect();
        if !paths.is_empty() {
            self.protected_paths = paths;
        }
        self
    }

    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    /// Joins the API base URL and an endpoint path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url_with_base(&self.api_base_url, path)
    }
}

/// Default session file: `$HOME/.config/adpa/session.json`, or the working
/// directory when `HOME` is unset.
fn default_store_path() -> PathBuf {
    std::env::var_os("HOME")
        .and_then(|home| normalize_value(&home.to_string_lossy()))
        .map_or_else(
            || PathBuf::from(".adpa-session.json"),
            |home| PathBuf::from(home).join(".config/adpa/session.json"),
        )
}

fn parse_base_url(raw: &str) -> Result<String, AppError> {
    let raw = normalize_value(raw)
        .ok_or_else(|| AppError::Config("API base URL is not configured.".to_string()))?;
    let url = Url::parse(&raw)
        .map_err(|err| AppError::Config(format!("Invalid API base URL {raw}: {err}")))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::Config(format!(
                "Unsupported API base URL scheme: {scheme}"
            )))
        }
    }
    if url.host().is_none() {
        return Err(AppError::Config(
            "Invalid API base URL: no host specified".to_string(),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Builds a URL from an explicit base URL and the provided path.
pub(crate) fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();
    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes a site path to a leading slash without a trailing one.
fn normalize_path(value: &str) -> Option<String> {
    let trimmed = normalize_value(value)?;
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.is_empty() {
        return Some("/".to_string());
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{build_url_with_base, normalize_path, normalize_value, AppConfig};
    use std::time::Duration;

    #[test]
    fn normalize_value_trims_and_rejects_empty() {
        assert_eq!(normalize_value(""), None);
        assert_eq!(normalize_value("   "), None);
        assert_eq!(
            normalize_value("  https://api.adpa.org "),
            Some("https://api.adpa.org".to_string())
        );
    }

    #[test]
    fn normalize_path_adds_leading_slash() {
        assert_eq!(normalize_path("portal/"), Some("/portal".to_string()));
        assert_eq!(normalize_path("/"), Some("/".to_string()));
        assert_eq!(normalize_path(" "), None);
    }

    #[test]
    fn new_rejects_unsupported_base_urls() {
        assert!(AppConfig::new("").is_err());
        assert!(AppConfig::new("ftp://api.adpa.org").is_err());
        assert!(AppConfig::new("not a url").is_err());
    }

    #[test]
    fn new_strips_trailing_slash() {
        let config = AppConfig::new("https://api.adpa.org/").expect("config");
        assert_eq!(config.api_base_url, "https://api.adpa.org");
        assert_eq!(
            config.url(&config.endpoints.refresh),
            "https://api.adpa.org/auth/token/refresh"
        );
    }

    #[test]
    fn builder_ignores_empty_overrides() {
        let config = AppConfig::new("https://api.adpa.org")
            .expect("config")
            .with_login_path("  ")
            .with_protected_paths(["", " "])
            .with_timeout(Duration::ZERO);
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.protected_paths, vec!["/portal".to_string()]);
        assert_eq!(config.timeout, super::DEFAULT_TIMEOUT);
    }

    #[test]
    fn builder_applies_overrides() {
        let config = AppConfig::new("https://api.adpa.org")
            .expect("config")
            .with_login_path("signin")
            .with_protected_paths(["/portal", "members/"])
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.login_path, "/signin");
        assert_eq!(
            config.protected_paths,
            vec!["/portal".to_string(), "/members".to_string()]
        );
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn build_url_with_empty_base_keeps_path() {
        assert_eq!(build_url_with_base("", "/auth/login"), "/auth/login");
        assert_eq!(
            build_url_with_base("http://127.0.0.1:8080/", "auth/login"),
            "http://127.0.0.1:8080/auth/login"
        );
    }
}
