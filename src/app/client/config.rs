//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the session
//! HTTP client used against the VRChat API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{api, http, limits};
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the session HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL; endpoint paths are joined onto it
    pub base_url: String,
    /// Exact user agent, `<product>/<version> (<contact>)`
    pub user_agent: String,
    /// Enable HTTP/2 adaptive window
    pub http2: bool,
    /// Request timeout (None = wait indefinitely)
    pub request_timeout: Option<Duration>,
    /// Connect timeout (None = wait indefinitely)
    pub connect_timeout: Option<Duration>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: api::BASE_URL.to_string(),
            user_agent: http::USER_AGENT.to_string(),
            http2: false,
            request_timeout: None,
            connect_timeout: None,
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

impl ClientConfig {
    /// Builds a fresh HTTP client with its own empty cookie jar
    pub fn build_http_client(&self) -> ConfigResult<Client> {
        self.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut client_builder = Client::builder()
            .cookie_store(true) // session auth lives in cookies
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if self.http2 {
            client_builder = client_builder.http2_adaptive_window(true);
        }

        if let Some(timeout) = self.request_timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(timeout) = self.connect_timeout {
            client_builder = client_builder.connect_timeout(timeout);
        }

        client_builder
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "client".to_string(),
                value: self.base_url.clone(),
                reason: e.to_string(),
            })
    }

    /// Parses the base URL, forcing a trailing slash so joins keep the `/api/1` prefix
    pub fn parsed_base_url(&self) -> ConfigResult<Url> {
        let mut raw = self.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
            field: "client.base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })
    }

    /// Validates settings the remote service is strict about
    pub fn validate(&self) -> ConfigResult<()> {
        if !is_valid_user_agent(&self.user_agent) {
            return Err(ConfigError::InvalidValue {
                field: "client.user_agent".to_string(),
                value: self.user_agent.clone(),
                reason: "Expected the form '<product>/<version> (<contact>)'".to_string(),
            });
        }

        if self.rate_limit_rps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.rate_limit_rps".to_string(),
                value: "0".to_string(),
                reason: "Rate limit must be non-zero".to_string(),
            });
        }

        self.parsed_base_url().map(|_| ())
    }
}

/// Check a user agent has the `<product>/<version> (<contact>)` shape
pub fn is_valid_user_agent(agent: &str) -> bool {
    let Some((product_version, contact)) = agent.split_once(" (") else {
        return false;
    };
    let Some(contact) = contact.strip_suffix(')') else {
        return false;
    };
    let Some((product, version)) = product_version.split_once('/') else {
        return false;
    };

    !product.is_empty()
        && !version.is_empty()
        && !contact.is_empty()
        && !product.contains(char::is_whitespace)
        && !version.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert!(!config.http2);
        assert!(config.request_timeout.is_none());
        assert!(config.connect_timeout.is_none());
        assert_eq!(config.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_client_creation() {
        let config = ClientConfig::default();
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_http_client_with_timeouts() {
        let config = ClientConfig {
            request_timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        };

        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_user_agent_format() {
        assert!(is_valid_user_agent("SaveMyProjects/1.0.0 (none@example.com)"));
        assert!(is_valid_user_agent(http::USER_AGENT));

        assert!(!is_valid_user_agent("SaveMyProjects"));
        assert!(!is_valid_user_agent("SaveMyProjects/1.0.0"));
        assert!(!is_valid_user_agent("SaveMyProjects/1.0.0 ()"));
        assert!(!is_valid_user_agent("/1.0.0 (contact)"));
        assert!(!is_valid_user_agent("Save My/1.0.0 (contact)"));
    }

    #[test]
    fn test_invalid_user_agent_rejected() {
        let config = ClientConfig {
            user_agent: "curl".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            config.build_http_client(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:8080/api/1".to_string(),
            ..Default::default()
        };

        let base = config.parsed_base_url().unwrap();
        assert_eq!(
            base.join("avatars").unwrap().as_str(),
            "http://127.0.0.1:8080/api/1/avatars"
        );
    }
}
