use crate::config::AppConfig;
use anyhow::{Context, Result};
use std::{path::PathBuf, time::Duration};

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub store_path: Option<PathBuf>,
    pub login_path: String,
    pub protected: Vec<String>,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            store_path: None,
            login_path: crate::config::DEFAULT_LOGIN_PATH.to_string(),
            protected: vec![crate::config::DEFAULT_PROTECTED_PATH.to_string()],
            timeout: crate::config::DEFAULT_TIMEOUT,
        }
    }

    /// # Errors
    /// Returns an error if the API URL is not a usable http(s) URL.
    pub fn config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::new(&self.api_url)
            .with_context(|| format!("invalid ADPA_API_BASE_URL: {}", self.api_url))?
            .with_login_path(&self.login_path)
            .with_protected_paths(&self.protected)
            .with_timeout(self.timeout);

        if let Some(path) = &self.store_path {
            config = config.with_store_path(path);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new("https://api.adpa.org/".to_string());
        let config = args.config().unwrap();
        assert_eq!(config.api_base_url, "https://api.adpa.org");
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.protected_paths, vec!["/portal"]);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_global_args_overrides() {
        let mut args = GlobalArgs::new("http://localhost:8000".to_string());
        args.store_path = Some(PathBuf::from("/tmp/session.json"));
        args.login_path = "signin".to_string();
        args.protected = vec!["/members/".to_string(), String::new()];
        args.timeout = Duration::ZERO;

        let config = args.config().unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/session.json"));
        assert_eq!(config.login_path, "/signin");
        assert_eq!(config.protected_paths, vec!["/members"]);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_global_args_invalid_url() {
        let args = GlobalArgs::new("ftp://api.adpa.org".to_string());
        assert!(args.config().is_err());
    }
}
