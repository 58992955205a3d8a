use thiserror::Error;

/// Transport-level failures surfaced to pages and the CLI.
///
/// Cloneable so callers can keep the last error around for display.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Session storage error: {0}")]
    Store(String),
}

impl AppError {
    /// True when the backend could not be reached at all.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for the statuses the identity backend uses to reject a credential.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self.status(), Some(400 | 401 | 403))
    }
}
