//! Credential and settings management for VRChat logins
//!
//! This module covers everything around a login that is not the protocol
//! itself: the saved settings file, environment overrides, interactive
//! prompts and the `auth` subcommands.
//!
//! # Examples
//!
//! ```rust,no_run
//! use avatar_fetcher::app::ClientConfig;
//! use avatar_fetcher::auth::{credentials_or_prompt, default_settings_path, login_interactive, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(&default_settings_path()?)?;
//! let credentials = credentials_or_prompt(&settings)?;
//! let session = login_interactive(&ClientConfig::default(), &credentials).await?;
//! println!("Logged in as {}", session.user().display_name);
//! # Ok(())
//! # }
//! ```

pub mod credentials;

pub use credentials::{
    clear_credentials, confirm, credentials_or_prompt, default_settings_path, get_auth_status,
    login_interactive, prompt_credentials, prompt_two_factor_code, resolve_credentials,
    save_theme, setup_credentials, show_auth_status, verify_credentials, AuthStatus,
    CredentialSource, Credentials, Settings,
};
