//! Normalization of the backend's authentication payloads.
//!
//! Backend revisions disagree on field names: the token is `access_token` or
//! `token`, and the identity is either nested under `user` or flattened into
//! the top level (`user_id`, `user_email`, `user_name`). Everything is mapped
//! here into the canonical `User`/`SessionData` shapes and nowhere else.

use chrono::Utc;
use serde::Deserialize;

use super::ApiError;
use crate::auth::{SessionData, User, DEFAULT_ROLE};

/// Display name used when the backend sends none
const DEFAULT_NAME: &str = "User";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn as_i64(&self) -> Option<i64> {
        match self {
            RawId::Number(n) => Some(*n),
            RawId::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIdentity {
    id: Option<RawId>,
    user_id: Option<RawId>,
    email: Option<String>,
    user_email: Option<String>,
    name: Option<String>,
    user_name: Option<String>,
    role: Option<String>,
}

impl RawIdentity {
    fn id(&self) -> Option<i64> {
        self.id
            .as_ref()
            .or(self.user_id.as_ref())
            .and_then(RawId::as_i64)
    }

    fn email(&self) -> Option<&str> {
        non_empty(self.email.as_deref()).or(non_empty(self.user_email.as_deref()))
    }

    fn name(&self) -> Option<&str> {
        non_empty(self.name.as_deref()).or(non_empty(self.user_name.as_deref()))
    }

    fn role(&self) -> Option<&str> {
        non_empty(self.role.as_deref())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Response of `/auth/login` and `/auth/me`, in any of the known shapes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthPayload {
    access_token: Option<String>,
    token: Option<String>,
    user: Option<RawIdentity>,
    #[serde(flatten)]
    flat: RawIdentity,
}

impl AuthPayload {
    fn token(&self) -> Option<&str> {
        non_empty(self.access_token.as_deref()).or(non_empty(self.token.as_deref()))
    }

    /// Pick a field from the nested identity first, then the flattened one
    fn pick<'a, T>(&'a self, f: impl Fn(&'a RawIdentity) -> Option<T>) -> Option<T> {
        self.user.as_ref().and_then(&f).or_else(|| f(&self.flat))
    }

    /// Build a session from a login response.
    ///
    /// `login_email` fills in a missing email. A missing id becomes the
    /// current epoch milliseconds.
    pub fn into_session(self, login_email: &str) -> Result<SessionData, ApiError> {
        let token = self
            .token()
            .ok_or_else(|| ApiError::InvalidResponse("token not received from server".into()))?
            .to_string();

        let user = User {
            id: self
                .pick(RawIdentity::id)
                .unwrap_or_else(|| Utc::now().timestamp_millis()),
            email: self.pick(RawIdentity::email).unwrap_or(login_email).to_string(),
            name: self.pick(RawIdentity::name).unwrap_or(DEFAULT_NAME).to_string(),
            role: self.pick(RawIdentity::role).unwrap_or(DEFAULT_ROLE).to_string(),
        };

        Ok(SessionData { token, user })
    }

    /// Build the identity returned by `/auth/me`. Id and email are required.
    pub fn into_user(self) -> Result<User, ApiError> {
        let id = self
            .pick(RawIdentity::id)
            .ok_or_else(|| ApiError::InvalidResponse("user id missing".into()))?;
        let email = self
            .pick(RawIdentity::email)
            .ok_or_else(|| ApiError::InvalidResponse("user email missing".into()))?
            .to_string();

        Ok(User {
            id,
            email,
            name: self.pick(RawIdentity::name).unwrap_or(DEFAULT_NAME).to_string(),
            role: self.pick(RawIdentity::role).unwrap_or(DEFAULT_ROLE).to_string(),
        })
    }
}
