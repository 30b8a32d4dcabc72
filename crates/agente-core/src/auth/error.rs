use thiserror::Error;

use crate::api::ApiError;

/// User-facing failures of login and signup.
///
/// The display strings are shown to the user as-is.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Server unavailable - check that the backend is running ({0})")]
    ServerUnavailable(String),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Could not create account: {0}")]
    SignupFailed(String),
}

impl AuthError {
    /// Classify a failed login request
    pub fn from_login(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => AuthError::InvalidCredentials,
            other => AuthError::ServerUnavailable(other.to_string()),
        }
    }

    /// Classify a failed signup request
    pub fn from_signup(err: ApiError) -> Self {
        match err {
            ApiError::Conflict(_) => AuthError::EmailTaken,
            other => AuthError::SignupFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_classification() {
        let err = AuthError::from_login(ApiError::Unauthorized);
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(err.to_string().contains("Invalid credentials"));

        let err = AuthError::from_login(ApiError::NotFound("/auth/login".to_string()));
        assert!(matches!(err, AuthError::ServerUnavailable(_)));

        let err = AuthError::from_login(ApiError::InvalidResponse("no token".to_string()));
        assert!(matches!(err, AuthError::ServerUnavailable(_)));
    }

    #[test]
    fn test_signup_classification() {
        let err = AuthError::from_signup(ApiError::Conflict("exists".to_string()));
        assert!(matches!(err, AuthError::EmailTaken));

        let err = AuthError::from_signup(ApiError::InvalidResponse("bad".to_string()));
        assert!(matches!(err, AuthError::SignupFailed(_)));

        // Anything but a conflict is a failed signup, unreachable backend included
        let err = AuthError::from_signup(ApiError::NotFound("Not Found".to_string()));
        assert!(matches!(err, AuthError::SignupFailed(_)));

        let err = AuthError::from_signup(ApiError::ServerError("boom".to_string()));
        assert!(matches!(err, AuthError::SignupFailed(_)));
    }
}
