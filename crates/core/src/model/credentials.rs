use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display information returned by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Persisted bearer token plus the user it was issued to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    user: UserProfile,
    saved_at: DateTime<Utc>,
}

impl Credentials {
    #[must_use]
    pub fn new(token: impl Into<String>, user: UserProfile, saved_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            user,
            saved_at,
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    #[must_use]
    pub fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

/// Who is using the app, passed explicitly into anything that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionContext {
    #[default]
    Anonymous,
    SignedIn(Credentials),
}

impl SessionContext {
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            SessionContext::SignedIn(creds) => Some(creds),
            SessionContext::Anonymous => None,
        }
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.credentials().map(Credentials::token)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.credentials()
            .map(|creds| creds.user().name.as_str())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("User")
    }
}

/// Gate for protected flows. Only checks that a non-empty token is present.
#[must_use]
pub fn is_authorized(context: &SessionContext) -> bool {
    context
        .bearer_token()
        .is_some_and(|token| !token.trim().is_empty())
}
