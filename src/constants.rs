//! Application constants for Avatar Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for authentication
pub mod env {
    /// Environment variable name for the VRChat username
    pub const USERNAME: &str = "VRC_USERNAME";

    /// Environment variable name for the VRChat password
    pub const PASSWORD: &str = "VRC_PASSWORD";
}

/// Authentication and two-factor constants
pub mod auth {
    /// File permissions for the settings file (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const SETTINGS_FILE_PERMISSIONS: u32 = 0o600;

    /// Number of digits in a two-factor code
    pub const TWO_FACTOR_CODE_LENGTH: usize = 6;

    /// Reason fragment identifying an email-delivered code
    pub const EMAIL_TWO_FACTOR_REASON: &str = "Email 2 Factor Authentication";

    /// Reason fragment identifying any two-factor requirement
    pub const TWO_FACTOR_REASON: &str = "2 Factor Authentication";

    /// Reason reported when the identity endpoint asks for an emailed code
    pub const EMAIL_TWO_FACTOR_REQUIRED: &str =
        "Email 2 Factor Authentication verification is required";

    /// Reason reported when the identity endpoint asks for an authenticator code
    pub const TWO_FACTOR_REQUIRED: &str = "2 Factor Authentication verification is required";

    /// Marker in `requiresTwoFactorAuth` for the email flow
    pub const EMAIL_OTP_METHOD: &str = "emailOtp";
}

/// HTTP client configuration constants
pub mod http {
    /// User agent sent with every request. The API rejects requests whose
    /// agent does not follow `<product>/<version> (<contact>)`.
    pub const USER_AGENT: &str = "AvatarFetcher/0.1.0 (avatar-fetcher@users.noreply.github.com)";

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 4;
}

/// Rate limiting configuration
pub mod limits {
    /// Default client-side request pacing (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;
}

/// VRChat API URLs and endpoint paths
pub mod api {
    /// API base URL
    pub const BASE_URL: &str = "https://api.vrchat.cloud/api/1/";

    /// Identity endpoint (current user)
    pub const CURRENT_USER_PATH: &str = "auth/user";

    /// Authenticator-app code verification endpoint
    pub const VERIFY_TOTP_PATH: &str = "auth/twofactorauth/totp/verify";

    /// Emailed code verification endpoint
    pub const VERIFY_EMAIL_OTP_PATH: &str = "auth/twofactorauth/emailotp/verify";

    /// Avatar listing and detail endpoint
    pub const AVATARS_PATH: &str = "avatars";
}

/// Paginated listing constants
pub mod fetch {
    /// Records requested per page
    pub const PAGE_SIZE: usize = 100;

    /// Hard cap on pages requested by one fetch
    pub const MAX_PAGES: usize = 10;

    /// Sort key used for public and private listings
    pub const SORT_FIELD: &str = "updated";

    /// Sort order used for public and private listings
    pub const SORT_ORDER: &str = "descending";
}

/// Local catalog paging constants
pub mod catalog {
    /// Default number of avatars shown per page
    pub const DEFAULT_PAGE_SIZE: usize = 50;

    /// Page sizes offered in interactive mode
    pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];
}

/// Download resolution and file constants
pub mod files {
    /// Platform whose package is preferred when resolving downloads
    pub const TARGET_PLATFORM: &str = "standalonewindows";

    /// Path segment the server mis-serves for direct downloads
    pub const SECURITY_VARIANT_SEGMENT: &str = "/variant/security";

    /// Extension given to downloaded avatar bundles
    pub const DEFAULT_FILE_EXTENSION: &str = ".vrca";

    /// Name used when an avatar has no usable name
    pub const DEFAULT_FILE_STEM: &str = "avatar";

    /// Characters replaced with `_` in save names
    pub const FORBIDDEN_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Download chunk size for streaming (8KB)
    pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

    /// Bytes between progress log lines for large downloads (5MB)
    pub const PROGRESS_LOG_INTERVAL_BYTES: u64 = 5 * 1024 * 1024;

    /// Application directory name under the user config directory
    pub const APP_DIR_NAME: &str = "avatar-fetcher";

    /// Settings file name (saved credentials and theme flag)
    pub const SETTINGS_FILE_NAME: &str = "settings.toml";

    /// Configuration file name
    pub const CONFIG_FILE_NAME: &str = "config.toml";

    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE_NAME: &str = "avatar-fetcher.toml";

    /// Prefix for on-demand log files
    pub const LOG_FILE_PREFIX: &str = "avatar_fetcher_log_";
}

/// Background task configuration
pub mod tasks {
    /// Default number of tasks allowed to run at once
    pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 4;
}

/// Progress display constants
pub mod progress {
    use super::Duration;

    /// Spinner tick interval
    pub const SPINNER_TICK: Duration = Duration::from_millis(120);
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use api::BASE_URL as API_BASE_URL;
pub use env::{PASSWORD as ENV_PASSWORD, USERNAME as ENV_USERNAME};
pub use fetch::{MAX_PAGES, PAGE_SIZE};
pub use http::USER_AGENT;
pub use limits::DEFAULT_RATE_LIMIT_RPS;
pub use tasks::DEFAULT_MAX_CONCURRENT_TASKS;
