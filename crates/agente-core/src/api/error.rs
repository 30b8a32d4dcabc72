use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// FastAPI error envelope
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
            None => body.to_string(),
            Some((cut, _)) => format!(
                "{}... (truncated, {} total bytes)",
                &body[..cut],
                body.len()
            ),
        }
    }

    /// Prefer the backend's `detail` message over the raw body
    fn message(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(detail),
            }) => Self::truncate_body(&detail),
            Ok(ErrorBody { detail }) => Self::truncate_body(&detail.to_string()),
            Err(_) => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let mut message = Self::message(body);
        if message.trim().is_empty() {
            message = status.canonical_reason().unwrap_or("no details").to_string();
        }
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, ""),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_detail_is_extracted() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, r#"{"detail":"Not Found"}"#);
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "Not Found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert_eq!(err.to_string(), "Resource not found: Not Found");

        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "  ");
        assert_eq!(err.to_string(), "Server error: Bad Gateway");
    }

    #[test]
    fn test_long_body_is_truncated_on_char_boundary() {
        let body = "é".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.starts_with(&"é".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.contains("truncated"));
    }
}
