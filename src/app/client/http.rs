//! Core HTTP operations for the authenticated session
//!
//! This module wraps the cookie-carrying `reqwest` client. Every call goes
//! through the client-side rate limiter and returns the raw status with the
//! body; deciding what a status means is left to the caller. Nothing here
//! retries.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::errors::{ConfigError, ConfigResult};

/// Number of body characters kept when logging a failed response
const BODY_PREVIEW_CHARS: usize = 200;

/// Status and body of a completed API call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Whether the service answered 200
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// First characters of the body for log lines
    pub fn body_preview(&self) -> String {
        self.body.chars().take(BODY_PREVIEW_CHARS).collect()
    }

    /// Human-readable error message from an API error body.
    ///
    /// The service wraps errors as `{"error": {"message": "...", "status_code": n}}`,
    /// sometimes with the message itself JSON-quoted.
    pub fn error_message(&self) -> String {
        let message = serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|value| {
                value
                    .pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(|m| m.trim_matches('"').to_string())
            });

        match message {
            Some(message) if !message.is_empty() => message,
            _ => self
                .status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        }
    }
}

/// HTTP operations handler bound to one session
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    base_url: Url,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client, base URL and pacing
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the rate limit is zero
    pub fn new(client: Client, base_url: Url, rate_limit_rps: u32) -> ConfigResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            base_url,
            rate_limiter,
        })
    }

    /// Builds the rate limiter with the specified rate limit
    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> ConfigResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| ConfigError::InvalidValue {
            field: "client.rate_limit_rps".to_string(),
            value: rate_limit_rps.to_string(),
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Waits for a rate limiter slot
    async fn pace(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;
    }

    /// Resolves an endpoint path against the API base URL
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }

    /// GET with query parameters, returning status and body text
    pub async fn get(
        &self,
        url: &Url,
        params: &[(&str, String)],
    ) -> reqwest::Result<ApiResponse> {
        self.pace().await;
        tracing::debug!("GET {} params={:?}", url, params);

        let response = self.client.get(url.clone()).query(params).send().await?;
        Self::into_api_response(response).await
    }

    /// GET carrying HTTP Basic credentials, used only for the login call
    ///
    /// Both parts are URL-encoded before Basic encoding, as the API expects.
    pub async fn get_with_basic_auth(
        &self,
        url: &Url,
        username: &str,
        password: &str,
    ) -> reqwest::Result<ApiResponse> {
        self.pace().await;
        tracing::debug!("GET {} (basic auth for {})", url, username);

        let user = urlencoding::encode(username);
        let pass = urlencoding::encode(password);
        let response = self
            .client
            .get(url.clone())
            .basic_auth(user, Some(pass))
            .send()
            .await?;
        Self::into_api_response(response).await
    }

    /// POST a JSON body, returning status and body text
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &B,
    ) -> reqwest::Result<ApiResponse> {
        self.pace().await;
        tracing::debug!("POST {}", url);

        let response = self.client.post(url.clone()).json(body).send().await?;
        Self::into_api_response(response).await
    }

    /// GET returning status and raw bytes
    pub async fn get_binary(&self, url: &Url) -> reqwest::Result<(StatusCode, Vec<u8>)> {
        self.pace().await;
        tracing::debug!("GET (binary) {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "*/*")
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok((status, bytes.to_vec()))
    }

    /// GET returning the response unread, for streaming downloads
    pub async fn get_response(&self, url: &Url) -> reqwest::Result<reqwest::Response> {
        self.pace().await;
        tracing::debug!("GET (stream) {}", url);

        self.client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "*/*")
            .send()
            .await
    }

    async fn into_api_response(response: reqwest::Response) -> reqwest::Result<ApiResponse> {
        let status = response.status();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }

    /// Get the API base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}
