use std::sync::Arc;

use anyhow::Result;
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::context::{Navigator, SessionContext};
use super::error::AuthError;
use super::session::{AuthState, Session, User};
use crate::api::{ApiClient, AuthPayload};
use crate::config::Config;
use crate::storage::SessionStorage;

const LOGIN_PATH: &str = "/auth/login";
const SIGNUP_PATH: &str = "/auth/signup";
const ME_PATH: &str = "/auth/me";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Who is logged in, and the operations that change it.
#[derive(Clone)]
pub struct SessionStore {
    session: Arc<SessionContext>,
    api: ApiClient,
}

impl SessionStore {
    /// Build the session context, API client and store in one go
    pub fn new(
        config: &Config,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let session = Arc::new(SessionContext::new(storage, navigator));
        let api = ApiClient::new(config, session)?;
        Ok(Self::with_client(api))
    }

    /// Use an existing client; the store shares the client's session context
    pub fn with_client(api: ApiClient) -> Self {
        Self {
            session: api.session().clone(),
            api,
        }
    }

    /// Restore the persisted session. Only the first call has any effect.
    pub fn bootstrap(&self) -> AuthState {
        let state = self.session.bootstrap();
        debug!(?state, "Session bootstrap complete");
        state
    }

    /// Authenticate with the backend and persist the new session.
    ///
    /// On failure the current session is left as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        debug!(email, "Attempting login");

        let payload: AuthPayload = self
            .api
            .send_anonymous(Method::POST, LOGIN_PATH, Some(&LoginRequest { email, password }))
            .await
            .map_err(|e| {
                warn!(error = %e, "Login request failed");
                AuthError::from_login(e)
            })?;

        let data = payload.into_session(email).map_err(|e| {
            warn!(error = %e, "Unusable login response");
            AuthError::from_login(e)
        })?;

        let user = data.user.clone();
        self.session.install(data);
        info!(user_id = user.id, "Logged in");
        Ok(user)
    }

    /// Create an account, then log into it.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        debug!(email, "Attempting signup");

        self.api
            .send_anonymous::<serde_json::Value, _>(
                Method::POST,
                SIGNUP_PATH,
                Some(&SignupRequest {
                    name,
                    email,
                    password,
                }),
            )
            .await
            .map_err(|e| {
                warn!(error = %e, "Signup request failed");
                AuthError::from_signup(e)
            })?;

        info!(email, "Account created");
        self.login(email, password).await
    }

    /// Forget the session, in memory and on disk.
    pub fn logout(&self) {
        if self.session.clear_session() {
            info!("Logged out");
        }
    }

    /// Ask the backend whether the current token is still good.
    ///
    /// A confirmed token refreshes the stored identity. Any failure logs the
    /// user out. Returns false when there is no session, or when the session
    /// changed while the check was in flight.
    pub async fn verify_token(&self) -> bool {
        let Some(credential) = self.session.credential() else {
            return false;
        };

        let result = self
            .api
            .get::<AuthPayload>(ME_PATH)
            .await
            .and_then(AuthPayload::into_user);

        match result {
            Ok(user) => self.session.replace_user(credential.generation, user),
            Err(e) => {
                warn!(error = %e, "Token verification failed");
                self.logout();
                false
            }
        }
    }

    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    pub fn user(&self) -> Option<User> {
        self.session.snapshot().data.map(|d| d.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state() == AuthState::Bootstrapping
    }

    /// The shared client, for calls to the other backend services
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.session
    }
}
