//! API client for communicating with the dashboard backend.
//!
//! Every outbound request goes through `ApiClient`, which attaches the
//! session's bearer token and turns a rejected token into a forced logout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::{Credential, SessionContext};
use crate::config::Config;

/// API client for the dashboard backend.
/// Clone is cheap - reqwest::Client and the session context are both shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionContext>,
    max_rate_limit_retries: u32,
    initial_backoff_ms: u64,
}

impl ApiClient {
    /// Create a new API client bound to a session context
    pub fn new(config: &Config, session: Arc<SessionContext>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
            max_rate_limit_retries: config.max_rate_limit_retries,
            initial_backoff_ms: config.initial_backoff_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request, authenticated when a session exists.
    ///
    /// A 401 on an authenticated request clears the session and triggers the
    /// login navigation before the error is returned.
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let credential = self.session.credential();
        self.execute(method, path, body, credential).await
    }

    /// Send a request without a bearer token, e.g. the login call itself
    pub async fn send_anonymous<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(method, path, body, None).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    async fn execute<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        credential: Option<Credential>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = self.initial_backoff_ms;

        loop {
            let mut builder = self.client.request(method.clone(), &url);
            if let Some(ref credential) = credential {
                builder = builder.bearer_auth(&credential.token);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder.send().await.inspect_err(|e| {
                warn!(%method, url = %url, error = %e, "Request failed");
            })?;
            let status = response.status();
            debug!(%method, url = %url, status = status.as_u16(), "API response");

            if status.is_success() {
                return Self::parse_json(response, &url).await;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > self.max_rate_limit_retries {
                    return Err(ApiError::RateLimited);
                }
                warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = next_backoff(backoff_ms);
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED {
                if let Some(ref credential) = credential {
                    self.session.force_logout(credential.generation);
                }
            }
            return Err(ApiError::from_status(status, &text));
        }
    }

    /// Deserialize a successful response. An empty body reads as JSON `null`.
    async fn parse_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }
}

/// Exponential backoff step, capped instead of overflowing
fn next_backoff(backoff_ms: u64) -> u64 {
    backoff_ms.saturating_mul(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoopNavigator;
    use crate::storage::MemoryStorage;

    fn client(base_url: &str) -> ApiClient {
        let config = Config {
            api_base_url: base_url.to_string(),
            ..Config::default()
        };
        let session = Arc::new(SessionContext::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(NoopNavigator),
        ));
        ApiClient::new(&config, session).unwrap()
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        assert_eq!(next_backoff(1000), 2000);
        assert_eq!(next_backoff(u64::MAX / 2 + 1), u64::MAX);
        assert_eq!(next_backoff(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_url_joining() {
        let api = client("http://localhost:8000/api/");
        assert_eq!(api.base_url(), "http://localhost:8000/api");
        assert_eq!(api.url("/auth/login"), "http://localhost:8000/api/auth/login");
        assert_eq!(api.url("kpis"), "http://localhost:8000/api/kpis");
    }
}
