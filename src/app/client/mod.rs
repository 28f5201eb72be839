//! HTTP client implementation for VRChat API interaction
//!
//! This module provides the session client used by every API call after login.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `auth`: login, two-factor verification and the resulting `Session`
//! - `http`: raw request operations with rate limiting
//! - `download`: streamed file downloads with progress reporting

use std::path::Path;

use url::Url;

use crate::app::models::{AvatarRecord, ReleaseFilter};
use crate::constants::api;
use crate::errors::{ApiError, ApiResult, ConfigResult, DownloadError, DownloadResult};

// Module declarations
pub mod auth;
pub mod config;
pub mod download;
pub mod http;

pub use auth::{AuthHandler, LoginOutcome, PendingTwoFactor, Session};
pub use config::ClientConfig;
pub use download::{DownloadHandler, DownloadProgress};
pub use http::ApiResponse;

use http::HttpHandler;

/// HTTP client for the VRChat API
///
/// Owns one cookie jar. A client becomes usable for listing and downloads
/// once it is wrapped in an authenticated [`Session`].
#[derive(Debug)]
pub struct ApiClient {
    http_handler: HttpHandler,
}

impl ApiClient {
    /// Creates a client with a fresh, empty cookie jar
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid
    pub fn new(config: &ClientConfig) -> ConfigResult<Self> {
        let client = config.build_http_client()?;
        let base_url = config.parsed_base_url()?;
        let http_handler = HttpHandler::new(client, base_url, config.rate_limit_rps)?;

        tracing::debug!("Created API client for {}", http_handler.base_url());

        Ok(Self { http_handler })
    }

    /// Resolves an endpoint path against the base URL
    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.http_handler
            .endpoint(path)
            .map_err(|e| ApiError::InvalidUrl {
                url: path.to_string(),
                error: e.to_string(),
            })
    }

    /// Fetches one page of the avatar listing
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for any non-200 response
    pub async fn list_avatars_page(
        &self,
        filter: ReleaseFilter,
        offset: usize,
        page_size: usize,
    ) -> ApiResult<Vec<AvatarRecord>> {
        let url = self.endpoint(api::AVATARS_PATH)?;
        let params = filter.query_params(offset, page_size);

        let response = self.http_handler.get(&url, &params).await?;
        if !response.is_ok() {
            tracing::error!(
                "API error: {} - {}",
                response.status.as_u16(),
                response.body_preview()
            );
            return Err(ApiError::Status {
                status: response.status.as_u16(),
                body: response.body_preview(),
            });
        }

        Ok(response.json()?)
    }

    /// Fetches the detailed record of one avatar, including its packages
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for any non-200 response
    pub async fn fetch_avatar(&self, avatar_id: &str) -> ApiResult<AvatarRecord> {
        let url = self.endpoint(&format!(
            "{}/{}",
            api::AVATARS_PATH,
            urlencoding::encode(avatar_id)
        ))?;
        tracing::info!("Fetching detailed information for avatar ID: {}", avatar_id);

        let response = self.http_handler.get(&url, &[]).await?;
        if !response.is_ok() {
            tracing::error!(
                "Failed to fetch avatar details: {} - {}",
                response.status.as_u16(),
                response.body_preview()
            );
            return Err(ApiError::Status {
                status: response.status.as_u16(),
                body: response.body_preview(),
            });
        }

        Ok(response.json()?)
    }

    /// Streams a file to disk, reporting whole-percent progress
    ///
    /// See [`DownloadHandler::download_file`].
    pub async fn download_file<F>(
        &self,
        url: &str,
        destination: &Path,
        force: bool,
        on_progress: F,
    ) -> DownloadResult<u64>
    where
        F: FnMut(&DownloadProgress),
    {
        DownloadHandler::new(&self.http_handler)
            .download_file(url, destination, force, on_progress)
            .await
    }

    /// Downloads a small file into memory
    pub async fn download_content(&self, url: &str) -> DownloadResult<Vec<u8>> {
        DownloadHandler::new(&self.http_handler)
            .download_content(url)
            .await
    }

    /// Downloads an avatar's thumbnail image to `destination`
    pub async fn download_thumbnail(
        &self,
        record: &AvatarRecord,
        destination: &Path,
    ) -> DownloadResult<u64> {
        let url = record
            .thumbnail_image_url
            .as_deref()
            .or(record.image_url.as_deref())
            .filter(|url| !url.is_empty())
            .ok_or(DownloadError::MissingThumbnail)?;

        let bytes = self.download_content(url).await?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &bytes).await?;

        tracing::info!(
            "Saved thumbnail for {} to {}",
            record.display_name(),
            destination.display()
        );
        Ok(bytes.len() as u64)
    }

    /// Get the base URL for the API
    pub fn base_url(&self) -> &Url {
        self.http_handler.base_url()
    }

    pub(crate) fn http(&self) -> &HttpHandler {
        &self.http_handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new(&ClientConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), api::BASE_URL);
    }

    #[test]
    fn test_client_creation_rejects_bad_user_agent() {
        let config = ClientConfig {
            user_agent: "python-requests/2.31".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            ApiClient::new(&config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_endpoint_resolution() {
        let client = ApiClient::new(&ClientConfig::default()).unwrap();
        let url = client.endpoint(api::AVATARS_PATH).unwrap();
        assert_eq!(url.host_str(), Some("api.vrchat.cloud"));
        assert_eq!(url.path(), "/api/1/avatars");
    }

    #[tokio::test]
    async fn test_thumbnail_requires_url() {
        let client = ApiClient::new(&ClientConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let record = AvatarRecord {
            id: "avtr_1".to_string(),
            ..Default::default()
        };

        let result = client
            .download_thumbnail(&record, &dir.path().join("thumb.png"))
            .await;
        assert!(matches!(result, Err(DownloadError::MissingThumbnail)));
    }
}
