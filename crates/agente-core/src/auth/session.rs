use serde::{Deserialize, Serialize};

/// Role assigned when the backend does not send one
pub const DEFAULT_ROLE: &str = "user";

/// Authenticated identity, in the canonical shape persisted under `user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// Token and identity of a logged-in user. They only ever exist together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub token: String,
    pub user: User,
}

/// Snapshot of the session as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub data: Option<SessionData>,
    /// True until the persisted record has been read at startup
    pub loading: bool,
}

impl Session {
    pub fn state(&self) -> AuthState {
        if self.loading {
            AuthState::Bootstrapping
        } else if self.data.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    /// Get the bearer token if logged in
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.data.as_ref().map(|d| &d.user)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Bootstrapping,
    Anonymous,
    Authenticated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_defaults_when_missing() {
        let user: User =
            serde_json::from_str(r#"{"id":1,"email":"admin@x.com","name":"Admin"}"#).unwrap();
        assert_eq!(user.role, "user");
    }

    #[test]
    fn test_session_states() {
        let mut session = Session::default();
        assert_eq!(session.state(), AuthState::Bootstrapping);
        assert_eq!(session.token(), None);

        session.loading = false;
        assert_eq!(session.state(), AuthState::Anonymous);

        session.data = Some(SessionData {
            token: "abc".to_string(),
            user: User {
                id: 1,
                email: "admin@x.com".to_string(),
                name: "Admin".to_string(),
                role: "admin".to_string(),
            },
        });
        assert_eq!(session.state(), AuthState::Authenticated);
        assert_eq!(session.token(), Some("abc"));
        assert_eq!(session.user().map(|u| u.name.as_str()), Some("Admin"));
    }
}
