//! VRChat authentication logic
//!
//! This module handles login and two-factor verification. Login runs against
//! the identity endpoint with HTTP Basic credentials; the service answers with
//! a session cookie and either the user or a demand for a second factor.
//!
//! The flow is encoded in types: [`AuthHandler::login`] yields either a
//! [`Session`] or a [`PendingTwoFactor`], and only
//! [`PendingTwoFactor::verify`] turns the latter into a `Session`. A pending
//! session cannot be used for API calls.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::app::client::{ApiClient, ApiResponse, ClientConfig};
use crate::app::models::{TwoFactorKind, User};
use crate::constants::{api, auth};
use crate::errors::{AuthError, AuthResult};

/// Authenticated context attached to every API call after login
#[derive(Debug, Clone)]
pub struct Session {
    client: Arc<ApiClient>,
    user: User,
}

impl Session {
    /// The authenticated user
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Client carrying the session cookies
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Shared handle to the session client, for moving into tasks
    pub fn shared_client(&self) -> Arc<ApiClient> {
        Arc::clone(&self.client)
    }
}

/// Login accepted the password but still needs a second factor
#[derive(Debug)]
pub struct PendingTwoFactor {
    client: ApiClient,
    kind: TwoFactorKind,
}

impl PendingTwoFactor {
    /// Which code the service expects
    pub fn kind(&self) -> TwoFactorKind {
        self.kind
    }

    /// Submits the code and confirms the resulting identity
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidTwoFactorCode` before any request if the
    /// code does not reduce to six digits, and `AuthError::TwoFactorFailed`
    /// if the service rejects it or still withholds the user afterwards.
    pub async fn verify(self, code: &str) -> AuthResult<Session> {
        let code = normalize_two_factor_code(code)?;
        AuthHandler::submit_two_factor(&self.client, &code, self.kind).await?;

        match AuthHandler::current_user(&self.client).await? {
            IdentityResponse::User(user) => {
                tracing::info!("Successfully logged in with 2FA as: {}", user.display_name);
                Ok(Session {
                    client: Arc::new(self.client),
                    user,
                })
            }
            IdentityResponse::TwoFactorRequired { reason } => {
                tracing::error!("2FA verification failed: {}", reason);
                Err(AuthError::TwoFactorFailed { reason })
            }
            IdentityResponse::Unauthorized { reason } => {
                tracing::error!("2FA verification failed: {}", reason);
                Err(AuthError::TwoFactorFailed { reason })
            }
        }
    }
}

/// Result of a password login
#[derive(Debug)]
pub enum LoginOutcome {
    /// Logged in without a second factor
    Authenticated(Session),
    /// A code must be submitted through [`PendingTwoFactor::verify`]
    TwoFactorRequired(PendingTwoFactor),
}

/// Identity endpoint answer, classified
#[derive(Debug)]
enum IdentityResponse {
    User(User),
    TwoFactorRequired { reason: String },
    Unauthorized { reason: String },
}

/// Handles VRChat authentication operations
pub struct AuthHandler;

impl AuthHandler {
    /// Logs in with username and password on a fresh session client
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if:
    /// - The username or password is empty
    /// - The client cannot be built from `config`
    /// - The request fails at the transport level
    /// - The service rejects the credentials (`LoginFailed` with its reason)
    /// - The service answers with any other unexpected status
    pub async fn login(
        config: &ClientConfig,
        username: &str,
        password: &str,
    ) -> AuthResult<LoginOutcome> {
        if username.trim().is_empty() {
            return Err(AuthError::InvalidUsername {
                reason: "Username cannot be empty".to_string(),
            });
        }
        if password.is_empty() {
            return Err(AuthError::InvalidUsername {
                reason: "Password cannot be empty".to_string(),
            });
        }

        let client = ApiClient::new(config)?;
        let url = Self::endpoint(&client, api::CURRENT_USER_PATH)?;

        tracing::info!("Attempting to log in to VRChat as {}", username);
        let response = client
            .http()
            .get_with_basic_auth(&url, username.trim(), password)
            .await?;

        match Self::classify_identity(&response)? {
            IdentityResponse::User(user) => {
                tracing::info!("Successfully logged in as: {}", user.display_name);
                Ok(LoginOutcome::Authenticated(Session {
                    client: Arc::new(client),
                    user,
                }))
            }
            IdentityResponse::TwoFactorRequired { reason } => {
                // classify_identity only yields this for reasons that route
                let kind =
                    TwoFactorKind::from_reason(&reason).unwrap_or(TwoFactorKind::Authenticator);
                tracing::info!("Login requires {}: {}", kind, reason);
                Ok(LoginOutcome::TwoFactorRequired(PendingTwoFactor {
                    client,
                    kind,
                }))
            }
            IdentityResponse::Unauthorized { reason } => {
                tracing::error!("Authentication error: {}", reason);
                Err(AuthError::LoginFailed { reason })
            }
        }
    }

    /// Calls the verification endpoint for `kind`
    async fn submit_two_factor(
        client: &ApiClient,
        code: &str,
        kind: TwoFactorKind,
    ) -> AuthResult<()> {
        let path = match kind {
            TwoFactorKind::Email => api::VERIFY_EMAIL_OTP_PATH,
            TwoFactorKind::Authenticator => api::VERIFY_TOTP_PATH,
        };
        let url = Self::endpoint(client, path)?;

        tracing::info!("Submitting {} for verification", kind);
        let response = client.http().post_json(&url, &json!({ "code": code })).await?;

        if !response.is_ok() {
            let reason = response.error_message();
            tracing::error!(
                "2FA verification failed: {} - {}",
                response.status.as_u16(),
                reason
            );
            return Err(AuthError::TwoFactorFailed { reason });
        }

        let verified = response
            .json::<Value>()
            .ok()
            .and_then(|body| body.get("verified").and_then(Value::as_bool))
            .unwrap_or(false);

        if !verified {
            return Err(AuthError::TwoFactorFailed {
                reason: "Code was not accepted".to_string(),
            });
        }

        Ok(())
    }

    /// Re-fetches the identity with the session cookies only
    async fn current_user(client: &ApiClient) -> AuthResult<IdentityResponse> {
        let url = Self::endpoint(client, api::CURRENT_USER_PATH)?;
        let response = client.http().get(&url, &[]).await?;
        Self::classify_identity(&response)
    }

    /// Sorts an identity response into user, second-factor demand, or rejection
    fn classify_identity(response: &ApiResponse) -> AuthResult<IdentityResponse> {
        match response.status {
            StatusCode::OK => {
                let body: Value = response.json()?;

                let methods: Vec<String> = body
                    .get("requiresTwoFactorAuth")
                    .and_then(|value| serde_json::from_value(value.clone()).ok())
                    .unwrap_or_default();

                if !methods.is_empty() {
                    let reason = TwoFactorKind::reason_for_methods(&methods).to_string();
                    return Ok(IdentityResponse::TwoFactorRequired { reason });
                }

                Ok(IdentityResponse::User(serde_json::from_value(body)?))
            }
            StatusCode::UNAUTHORIZED => {
                let reason = response.error_message();
                if TwoFactorKind::from_reason(&reason).is_some() {
                    Ok(IdentityResponse::TwoFactorRequired { reason })
                } else {
                    Ok(IdentityResponse::Unauthorized { reason })
                }
            }
            status => Err(AuthError::Api {
                status: status.as_u16(),
                message: response.error_message(),
            }),
        }
    }

    fn endpoint(client: &ApiClient, path: &str) -> AuthResult<url::Url> {
        client.endpoint(path).map_err(|e| AuthError::InvalidUrl {
            url: path.to_string(),
            error: e.to_string(),
        })
    }
}

/// Reduces user input to a six-digit code.
///
/// Non-digits are dropped and anything past six digits is cut off, the way
/// the code input field behaves. Fewer than six digits is an error.
pub fn normalize_two_factor_code(input: &str) -> AuthResult<String> {
    let code: String = input
        .chars()
        .filter(char::is_ascii_digit)
        .take(auth::TWO_FACTOR_CODE_LENGTH)
        .collect();

    if code.len() != auth::TWO_FACTOR_CODE_LENGTH {
        return Err(AuthError::InvalidTwoFactorCode {
            reason: format!(
                "Expected {} digits, got {}",
                auth::TWO_FACTOR_CODE_LENGTH,
                code.len()
            ),
        });
    }

    Ok(code)
}
