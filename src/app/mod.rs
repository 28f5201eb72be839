//! Core application logic for Avatar Fetcher
//!
//! This module contains the session client, the listing fetch engine, the
//! local catalog, download resolution and the task pool that runs them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use avatar_fetcher::app::{
//!     resolve_download_url, AuthHandler, AvatarCatalog, AvatarFetcher, ClientConfig,
//!     FetchConfig, LoginOutcome, ReleaseFilter,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = match AuthHandler::login(&ClientConfig::default(), "user", "pass").await? {
//!     LoginOutcome::Authenticated(session) => session,
//!     LoginOutcome::TwoFactorRequired(pending) => pending.verify("123456").await?,
//! };
//!
//! let records = AvatarFetcher::new(session.client(), FetchConfig::default())
//!     .fetch_all(ReleaseFilter::All)
//!     .await?;
//!
//! let mut catalog = AvatarCatalog::default();
//! catalog.replace_records(records);
//! catalog.set_filter("fox");
//!
//! if let Some(record) = catalog.select(1) {
//!     let detail = session.client().fetch_avatar(&record.id).await?;
//!     println!("{}", resolve_download_url(&detail)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod context;
pub mod fetch;
pub mod models;
pub mod resolve;
pub mod tasks;

// Re-export main public API
pub use catalog::AvatarCatalog;
pub use client::{
    ApiClient, AuthHandler, ClientConfig, DownloadProgress, LoginOutcome, PendingTwoFactor,
    Session,
};
pub use context::{AppContext, AuthState, DownloadSummary};
pub use fetch::{AvatarFetcher, AvatarPageSource, FetchConfig, PageProgress};
pub use models::{AvatarRecord, ReleaseFilter, TwoFactorKind, UnityPackage, User};
pub use resolve::{default_file_name, resolve_download_url, sanitize_filename, strip_security_variant};
pub use tasks::{ProgressReporter, TaskHandle, TaskPool, TaskProgress};
