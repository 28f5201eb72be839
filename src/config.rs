//! Configuration management for Avatar Fetcher
//!
//! This module provides unified configuration management with automatic
//! first-run initialization, multi-source loading, and zero-config defaults.
//! Every section may be omitted from the file; missing keys take defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::client::ClientConfig;
use crate::app::fetch::FetchConfig;
use crate::constants::{api, catalog, fetch, files, http, limits, logging, tasks};
use crate::errors::{AppError, ConfigError, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Listing fetch settings
    pub fetch: FetchConfigToml,
    /// Local catalog settings
    pub catalog: CatalogConfigToml,
    /// Download settings
    pub download: DownloadConfigToml,
    /// Background task settings
    pub tasks: TasksConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// API base URL
    pub base_url: String,
    /// User agent, `<product>/<version> (<contact>)`
    pub user_agent: String,
    /// Enable HTTP/2 adaptive window
    pub http2: bool,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds (unset = no timeout)
    pub request_timeout_secs: Option<u64>,
    /// Connect timeout in seconds (unset = no timeout)
    pub connect_timeout_secs: Option<u64>,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            base_url: api::BASE_URL.to_string(),
            user_agent: http::USER_AGENT.to_string(),
            http2: false,
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: None,
            connect_timeout_secs: None,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// TOML-friendly fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfigToml {
    /// Records requested per page
    pub page_size: usize,
    /// Hard cap on pages per fetch
    pub max_pages: usize,
}

impl Default for FetchConfigToml {
    fn default() -> Self {
        Self {
            page_size: fetch::PAGE_SIZE,
            max_pages: fetch::MAX_PAGES,
        }
    }
}

/// TOML-friendly catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfigToml {
    /// Avatars shown per page
    pub page_size: usize,
}

impl Default for CatalogConfigToml {
    fn default() -> Self {
        Self {
            page_size: catalog::DEFAULT_PAGE_SIZE,
        }
    }
}

/// TOML-friendly download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfigToml {
    /// Directory downloads go to when no output path is given
    pub output_dir: PathBuf,
    /// Extension appended to avatar save names
    pub file_extension: String,
}

impl Default for DownloadConfigToml {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_extension: files::DEFAULT_FILE_EXTENSION.to_string(),
        }
    }
}

/// TOML-friendly task configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfigToml {
    /// Tasks allowed to run at once
    pub max_concurrent: usize,
}

impl Default for TasksConfigToml {
    fn default() -> Self {
        Self {
            max_concurrent: tasks::DEFAULT_MAX_CONCURRENT_TASKS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
    /// Always write a log file, as if `--save-log` were given
    pub file_logging: bool,
    /// Log file path (if file_logging is enabled)
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
            file_logging: false,
            log_file: None,
        }
    }
}

/// Download settings used at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub output_dir: PathBuf,
    pub file_extension: String,
}

/// Configuration the application runs with
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub client: ClientConfig,
    pub fetch: FetchConfig,
    pub catalog_page_size: usize,
    pub download: DownloadSettings,
    pub max_concurrent_tasks: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        AppConfig::default().to_runtime_config()
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            client: self.client.to_runtime_config(),
            fetch: FetchConfig {
                page_size: self.fetch.page_size.max(1),
                max_pages: self.fetch.max_pages,
            },
            catalog_page_size: self.catalog.page_size.max(1),
            download: DownloadSettings {
                output_dir: self.download.output_dir.clone(),
                file_extension: normalize_extension(&self.download.file_extension),
            },
            max_concurrent_tasks: self.tasks.max_concurrent.max(1),
        }
    }

    /// Checks values that would only fail later at first use
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.client.to_runtime_config().validate()?;

        if self.fetch.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.max_pages".to_string(),
                value: "0".to_string(),
                reason: "At least one page must be fetched".to_string(),
            });
        }

        Ok(())
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit path, then project-local, then user config)
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        Self::load_with_source(config_file_override)
            .await
            .map(|(config, _)| config)
    }

    /// Like [`load`](Self::load), also returning the file that was read
    ///
    /// Runs before logging is set up, so the caller reports the source.
    pub async fn load_with_source(
        config_file_override: Option<PathBuf>,
    ) -> Result<(Self, Option<PathBuf>)> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match &config_path {
            Some(path) => Self::load_from_file(path).await?,
            None => Self::default(),
        };

        config.validate()?;
        Ok((config, config_path))
    }

    /// Initialize configuration on first run
    ///
    /// Creates a default config file if none exists and notifies the user
    pub async fn initialize_first_run() -> Result<Option<PathBuf>> {
        let config_path = Self::get_default_config_path()?;

        if config_path.exists() {
            return Ok(Some(config_path));
        }

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::generic(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to write config file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

        eprintln!("Created default configuration file:");
        eprintln!("   {}", config_path.display());
        eprintln!("   You can customize settings by editing this file.");
        eprintln!();

        Ok(Some(config_path))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(files::LOCAL_CONFIG_FILE_NAME)];
        if let Ok(path) = Self::get_default_config_path() {
            search_paths.push(path);
        }

        search_paths.into_iter().find(|path| path.exists())
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> std::result::Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir
            .join(files::APP_DIR_NAME)
            .join(files::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# Avatar Fetcher Configuration
# This file was automatically generated on first run.
# You can customize any of these settings to suit your needs.

[client]
base_url = "{base_url}"
# The API rejects agents not shaped like "<product>/<version> (<contact>)"
user_agent = "{user_agent}"
http2 = false
pool_max_per_host = {pool}
rate_limit_rps = {rps}
# Requests wait indefinitely unless these are set
# request_timeout_secs = 60
# connect_timeout_secs = 30

[fetch]
page_size = {page_size}
max_pages = {max_pages}

[catalog]
# Avatars per page: 10, 25, 50 or 100
page_size = {catalog_page_size}

[download]
output_dir = "."
file_extension = "{extension}"

[tasks]
max_concurrent = {max_tasks}

[logging]
level = "{level}"  # error, warn, info, debug, trace
file_logging = false
# log_file = "/path/to/avatar_fetcher.log"
"#,
            base_url = api::BASE_URL,
            user_agent = http::USER_AGENT,
            pool = http::POOL_MAX_PER_HOST,
            rps = limits::DEFAULT_RATE_LIMIT_RPS,
            page_size = fetch::PAGE_SIZE,
            max_pages = fetch::MAX_PAGES,
            catalog_page_size = catalog::DEFAULT_PAGE_SIZE,
            extension = files::DEFAULT_FILE_EXTENSION,
            max_tasks = tasks::DEFAULT_MAX_CONCURRENT_TASKS,
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            http2: self.http2,
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            rate_limit_rps: self.rate_limit_rps,
        }
    }
}

fn normalize_extension(extension: &str) -> String {
    let extension = extension.trim();
    if extension.is_empty() {
        files::DEFAULT_FILE_EXTENSION.to_string()
    } else if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}
