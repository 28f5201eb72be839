//! Avatar Fetcher Library
//!
//! A Rust client for the VRChat API that logs in with two-factor support,
//! retrieves the avatars on an account page by page, filters and paginates
//! them locally, and downloads avatar bundles with progress reporting.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
