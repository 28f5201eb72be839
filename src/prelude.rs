//! Prelude module for Avatar Fetcher Library
//!
//! Re-exports the items most integrations need, so a single
//! `use avatar_fetcher::prelude::*;` is enough for the usual login, fetch and
//! download flow.
//!
//! # Usage
//!
//! ```rust,no_run
//! use avatar_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = Settings::load(&default_settings_path()?)?;
//!     let credentials = credentials_or_prompt(&settings)?;
//!     let session = login_interactive(&ClientConfig::default(), &credentials).await?;
//!
//!     let records = AvatarFetcher::new(session.client(), FetchConfig::default())
//!         .fetch_all(ReleaseFilter::Private)
//!         .await?;
//!     println!("{} private avatars", records.len());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Session, listing and download
pub use crate::app::{
    resolve_download_url, sanitize_filename, ApiClient, AppContext, AuthHandler, AvatarCatalog,
    AvatarFetcher, AvatarRecord, ClientConfig, DownloadProgress, FetchConfig, LoginOutcome,
    PendingTwoFactor, ReleaseFilter, Session, TaskPool, TwoFactorKind, User,
};

// Credentials and settings
pub use crate::auth::{
    credentials_or_prompt, default_settings_path, login_interactive, Credentials, Settings,
};

// Configuration
pub use crate::config::{AppConfig, RuntimeConfig};

// Commonly used constants
pub use crate::constants::{ENV_PASSWORD, ENV_USERNAME, USER_AGENT};

pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
