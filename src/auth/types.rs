//! Session snapshot, user profile, and identity backend payloads. Request
//! payloads carry passwords and refresh tokens, so none of them derive `Debug`.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of the persisted session.
///
/// Tokens are wrapped in `SecretString` so the snapshot can be logged or
/// printed with `{:?}` without leaking credentials.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub user: Option<UserProfile>,
}

impl Session {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

/// Profile payload as returned by the identity backend.
///
/// The shape is owned by the backend; accessors read fields defensively and
/// accept both `camelCase` and `snake_case` names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Value);

impl UserProfile {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// The backend uses both numeric and string ids; both read as a string.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.field(&["id"])? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.field(&["firstName", "first_name"])?.as_str()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.field(&["email"])?.as_str()
    }

    #[must_use]
    pub fn is_member(&self) -> Option<bool> {
        self.field(&["membershipFlag", "membership_flag", "isMember", "is_member"])?
            .as_bool()
    }

    /// Best available label for greetings: first name, then email.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.first_name().or_else(|| self.email())
    }

    fn field(&self, names: &[&str]) -> Option<&Value> {
        let object = self.0.as_object()?;
        names
            .iter()
            .find_map(|name| object.get(*name))
            .filter(|value| !value.is_null())
    }
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Serialize)]
pub(crate) struct LogoutRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}
