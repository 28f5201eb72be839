//! Saved settings and credential handling for VRChat logins
//!
//! The settings file is a small TOML record with the username, the password
//! and the theme flag. The password is stored in plaintext, so the file is
//! written owner-only on Unix and a warning is printed whenever it is saved.
//! `VRC_USERNAME` / `VRC_PASSWORD` (also loaded from `.env`) take precedence
//! over the saved values.

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::client::{AuthHandler, ClientConfig, LoginOutcome, PendingTwoFactor, Session};
use crate::app::models::TwoFactorKind;
use crate::constants::{auth, env as env_constants, files};
use crate::errors::{AuthError, AuthResult, ConfigError};

/// Persisted user settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_dark_mode")]
    pub dark_mode: bool,
}

fn default_dark_mode() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            dark_mode: default_dark_mode(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`; a missing file yields defaults
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CredentialFormat` if the file is not valid TOML
    pub fn load(path: &Path) -> AuthResult<Self> {
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&content).map_err(|e| AuthError::CredentialFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Writes settings to `path` with owner-only permissions
    pub fn save(&self, path: &Path) -> AuthResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(ConfigError::from)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(
                path,
                std::fs::Permissions::from_mode(auth::SETTINGS_FILE_PERMISSIONS),
            )?;
        }

        if self.password.is_some() {
            tracing::warn!(
                "Password saved in plaintext to {}; protect this file",
                path.display()
            );
        }
        tracing::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Whether a complete username/password pair is saved
    pub fn has_saved_credentials(&self) -> bool {
        non_empty(&self.username).is_some() && non_empty(&self.password).is_some()
    }
}

/// Default settings file location under the user config directory
pub fn default_settings_path() -> AuthResult<PathBuf> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir
        .join(files::APP_DIR_NAME)
        .join(files::SETTINGS_FILE_NAME))
}

/// A username/password pair ready for login
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the username in use came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    SettingsFile,
    Missing,
}

/// Merges environment overrides with saved settings
pub fn resolve_credentials(settings: &Settings) -> Option<Credentials> {
    resolve_credentials_from(
        settings,
        env::var(env_constants::USERNAME).ok(),
        env::var(env_constants::PASSWORD).ok(),
    )
}

fn resolve_credentials_from(
    settings: &Settings,
    env_username: Option<String>,
    env_password: Option<String>,
) -> Option<Credentials> {
    let username = non_empty(&env_username).or_else(|| non_empty(&settings.username))?;
    let password = non_empty(&env_password).or_else(|| non_empty(&settings.password))?;

    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Authentication status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    pub username: Option<String>,
    pub username_source: CredentialSource,
    pub password_set: bool,
    pub settings_path: PathBuf,
    pub settings_file_exists: bool,
    /// None until a login has been attempted
    pub credentials_valid: Option<bool>,
}

impl AuthStatus {
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password_set
    }

    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match (self.has_credentials(), self.credentials_valid) {
            (false, _) => "Missing credentials - run 'auth setup' to configure".to_string(),
            (true, None) => "Credentials configured but not verified".to_string(),
            (true, Some(true)) => "Credentials configured and verified".to_string(),
            (true, Some(false)) => "Credentials configured but invalid".to_string(),
        }
    }
}

/// Inspects environment and settings file without contacting the service
pub fn get_auth_status(settings_path: &Path) -> AuthResult<AuthStatus> {
    let settings = Settings::load(settings_path)?;
    let env_username = env::var(env_constants::USERNAME).ok();
    let env_password = env::var(env_constants::PASSWORD).ok();

    let (username, username_source) = match (non_empty(&env_username), non_empty(&settings.username)) {
        (Some(name), _) => (Some(name.to_string()), CredentialSource::Environment),
        (None, Some(name)) => (Some(name.to_string()), CredentialSource::SettingsFile),
        (None, None) => (None, CredentialSource::Missing),
    };

    Ok(AuthStatus {
        username,
        username_source,
        password_set: non_empty(&env_password).is_some() || non_empty(&settings.password).is_some(),
        settings_path: settings_path.to_path_buf(),
        settings_file_exists: settings_path.exists(),
        credentials_valid: None,
    })
}

fn read_line(prompt: &str) -> AuthResult<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Asks a yes/no question; `default` applies to an empty answer
pub fn confirm(prompt: &str, default: bool) -> AuthResult<bool> {
    let answer = read_line(prompt)?.to_lowercase();
    Ok(match answer.chars().next() {
        Some('y') => true,
        Some('n') => false,
        _ => default,
    })
}

/// Prompt user for credentials interactively
pub fn prompt_credentials(default_username: Option<&str>) -> AuthResult<Credentials> {
    let prompt = match default_username {
        Some(name) => format!("VRChat Username [{}]: ", name),
        None => "VRChat Username: ".to_string(),
    };

    let mut username = read_line(&prompt)?;
    if username.is_empty() {
        username = default_username.unwrap_or_default().to_string();
    }
    if username.is_empty() {
        return Err(AuthError::InvalidUsername {
            reason: "Username cannot be empty".to_string(),
        });
    }

    let password = rpassword::prompt_password("VRChat Password: ")?;
    if password.is_empty() {
        return Err(AuthError::InvalidUsername {
            reason: "Password cannot be empty".to_string(),
        });
    }

    Ok(Credentials { username, password })
}

/// Asks for the second-factor code
pub fn prompt_two_factor_code(kind: TwoFactorKind) -> AuthResult<String> {
    println!("Two-factor authentication required.");
    read_line(&format!(
        "Enter the {}-digit code {}: ",
        auth::TWO_FACTOR_CODE_LENGTH,
        kind.code_source()
    ))
}

/// Logs in, prompting for a second-factor code when the service asks for one
pub async fn login_interactive(
    config: &ClientConfig,
    credentials: &Credentials,
) -> AuthResult<Session> {
    match AuthHandler::login(config, &credentials.username, &credentials.password).await? {
        LoginOutcome::Authenticated(session) => Ok(session),
        LoginOutcome::TwoFactorRequired(pending) => complete_two_factor(pending).await,
    }
}

async fn complete_two_factor(pending: PendingTwoFactor) -> AuthResult<Session> {
    let code = prompt_two_factor_code(pending.kind())?;
    pending.verify(&code).await
}

/// Resolves credentials, prompting for whatever is missing
pub fn credentials_or_prompt(settings: &Settings) -> AuthResult<Credentials> {
    if let Some(credentials) = resolve_credentials(settings) {
        return Ok(credentials);
    }

    if !atty::is(atty::Stream::Stdin) {
        return Err(AuthError::MissingCredentials);
    }
    prompt_credentials(non_empty(&settings.username))
}

/// Verifies credentials by logging in
pub async fn verify_credentials(config: &ClientConfig, settings_path: &Path) -> AuthResult<bool> {
    let settings = Settings::load(settings_path)?;
    let credentials = resolve_credentials(&settings).ok_or(AuthError::MissingCredentials)?;

    println!("Verifying credentials with VRChat...");
    match login_interactive(config, &credentials).await {
        Ok(session) => {
            println!("Credentials verified. Logged in as {}", session.user().display_name);
            Ok(true)
        }
        Err(e) => {
            println!("Credential verification failed: {}", e);
            Ok(false)
        }
    }
}

/// Interactive credential setup workflow
pub async fn setup_credentials(config: &ClientConfig, settings_path: &Path) -> AuthResult<()> {
    println!("VRChat Authentication Setup");
    println!("===========================");
    println!();
    println!("Your username and password will be saved to:");
    println!("   {}", settings_path.display());
    println!("The password is stored in plaintext; the file is readable only by you.");
    println!();

    let mut settings = Settings::load(settings_path)?;
    if settings.has_saved_credentials()
        && !confirm("Credentials are already saved. Update them? [y/N]: ", false)?
    {
        println!("Setup cancelled.");
        return Ok(());
    }

    let credentials = prompt_credentials(non_empty(&settings.username))?;

    println!();
    let session = match login_interactive(config, &credentials).await {
        Ok(session) => session,
        Err(e) => {
            println!("Login failed: {}", e);
            println!("Credentials were not saved. Run 'auth setup' to try again.");
            return Ok(());
        }
    };

    settings.username = Some(credentials.username);
    settings.password = Some(credentials.password);
    settings.save(settings_path)?;

    println!();
    println!(
        "Setup complete! Logged in as {}. Credentials saved.",
        session.user().display_name
    );
    Ok(())
}

/// Show current authentication status
pub async fn show_auth_status(config: &ClientConfig, settings_path: &Path) -> AuthResult<()> {
    let mut status = get_auth_status(settings_path)?;

    println!("VRChat Authentication Status");
    println!("============================");
    println!();

    match (&status.username, status.username_source) {
        (Some(name), CredentialSource::Environment) => {
            println!("Username: {} (from {})", name, env_constants::USERNAME)
        }
        (Some(name), _) => println!("Username: {} (saved)", name),
        (None, _) => println!("Username: Not set"),
    }
    println!(
        "Password: {}",
        if status.password_set { "Set" } else { "Not set" }
    );
    println!(
        "Settings file: {} ({})",
        status.settings_path.display(),
        if status.settings_file_exists {
            "exists"
        } else {
            "not found"
        }
    );
    println!();

    if status.has_credentials() {
        status.credentials_valid = Some(verify_credentials(config, settings_path).await?);
        println!();
    }

    println!("Status: {}", status.status_message());
    if !status.has_credentials() || status.credentials_valid == Some(false) {
        println!();
        println!("To configure credentials, run: avatar_fetcher auth setup");
    }

    Ok(())
}

/// Updates the persisted theme flag, keeping everything else
pub fn save_theme(settings_path: &Path, dark_mode: bool) -> AuthResult<Settings> {
    let mut settings = Settings::load(settings_path)?;
    settings.dark_mode = dark_mode;
    settings.save(settings_path)?;
    Ok(settings)
}

/// Removes saved credentials, keeping the theme flag
pub fn clear_credentials(settings_path: &Path) -> AuthResult<bool> {
    let mut settings = Settings::load(settings_path)?;
    if settings.username.is_none() && settings.password.is_none() {
        return Ok(false);
    }

    settings.username = None;
    settings.password = None;
    settings.save(settings_path)?;
    Ok(true)
}
