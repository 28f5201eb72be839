//! Error types for Avatar Fetcher
//!
//! This module defines the error types for all components of the application.
//! Each failure ends the task that raised it and carries one human-readable
//! message suitable for both the log and the user.

use std::path::PathBuf;
use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No credentials saved, in the environment, or entered
    #[error(
        "Missing VRChat credentials. Set VRC_USERNAME and VRC_PASSWORD environment variables or run 'auth setup'"
    )]
    MissingCredentials,

    /// HTTP request failed during authentication
    #[error("HTTP request failed during authentication: {0}")]
    Http(#[from] reqwest::Error),

    /// Login rejected; carries the raw reason from the service
    #[error("Login failed: {reason}")]
    LoginFailed { reason: String },

    /// Two-factor verification rejected
    #[error("2FA verification failed: {reason}")]
    TwoFactorFailed { reason: String },

    /// Two-factor code rejected client-side
    #[error("Invalid two-factor code: {reason}")]
    InvalidTwoFactorCode { reason: String },

    /// Empty or otherwise unusable username
    #[error("Invalid username: {reason}")]
    InvalidUsername { reason: String },

    /// Operation requires an authenticated session
    #[error("Not logged in. Run 'login' first")]
    NotAuthenticated,

    /// Unexpected status from an authentication endpoint
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Endpoint URL could not be built
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Response body could not be decoded
    #[error("Unexpected authentication response: {0}")]
    Decode(#[from] serde_json::Error),

    /// File I/O error during settings storage
    #[error("Failed to access settings file: {0}")]
    CredentialStorage(#[from] std::io::Error),

    /// Settings file is not valid TOML
    #[error("Settings file {path} is malformed: {reason}")]
    CredentialFormat { path: PathBuf, reason: String },

    /// Session client could not be built
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Listing and detail request errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-200 status
    #[error("API error: {status}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// URL could not be built
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },
}

/// Download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Server returned a non-200 status
    #[error("Download failed with status {status}")]
    ServerError { status: u16 },

    /// Avatar exposes no asset URL the user may download
    #[error("no downloadable asset")]
    NoDownloadableAsset,

    /// Record lacks an avatar id
    #[error("Avatar ID not found")]
    MissingAvatarId,

    /// Record lacks a thumbnail image
    #[error("Avatar has no thumbnail image")]
    MissingThumbnail,

    /// File already exists and force flag not set
    #[error("File already exists: {path}. Use --force to overwrite")]
    FileExists { path: String },

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// Looking up the avatar record failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Could not locate the user configuration directory
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Background task errors
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task panicked; the pool keeps running
    #[error("Unexpected error in task '{task}': {message}")]
    Panicked { task: String, message: String },

    /// Task was dropped before completing (runtime shutting down)
    #[error("Task '{task}' was aborted before completing")]
    Aborted { task: String },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Authentication error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Listing or detail request error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Background task error
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("{message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Missing data the user should be warned about rather than treated as a crash
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            AppError::Download(
                DownloadError::NoDownloadableAsset
                    | DownloadError::MissingAvatarId
                    | DownloadError::MissingThumbnail
            )
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Api(_) => "api",
            AppError::Download(_) => "download",
            AppError::Config(_) => "config",
            AppError::Task(_) => "task",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// API result type alias
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
