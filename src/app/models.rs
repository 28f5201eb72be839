//! Data models for Avatar Fetcher
//!
//! This module defines the data-transfer types for API responses. Fields the
//! service is known to send as `null` are typed as optional (or defaulted) from
//! the start, and every key the code does not inspect is kept in an untyped
//! `extra` map so records round-trip unchanged.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::{auth, fetch};

/// Deserialize a field that may be `null` into its default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Authenticated identity returned by the identity endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id (e.g., "usr_...")
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Name shown to other users
    pub display_name: String,
    /// Login name, absent for some account types
    #[serde(default)]
    pub username: Option<String>,
    /// Asset URL of the avatar currently worn; the service sends `null` for it
    #[serde(default)]
    pub current_avatar_asset_url: Option<String>,
    /// Remaining fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Platform-specific build of an avatar
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnityPackage {
    /// Target platform (e.g., "standalonewindows", "android")
    #[serde(default, deserialize_with = "null_as_default")]
    pub platform: String,
    /// Download URL of the bundle for this platform
    #[serde(default)]
    pub asset_url: Option<String>,
    /// Unity editor version the bundle was built with
    #[serde(default)]
    pub unity_version: Option<String>,
    /// Bundle variant (e.g., "standard", "security")
    #[serde(default)]
    pub variant: Option<String>,
    /// Remaining fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UnityPackage {
    /// Asset URL if present and non-empty
    pub fn usable_asset_url(&self) -> Option<&str> {
        self.asset_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// One avatar from the listing or detail endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarRecord {
    /// Avatar id (e.g., "avtr_...")
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Avatar name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Display name of the author
    #[serde(default, deserialize_with = "null_as_default")]
    pub author_name: String,
    /// Free-form description
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// "public" or "private"
    #[serde(default)]
    pub release_status: Option<String>,
    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail_image_url: Option<String>,
    /// Full-size image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Per-platform builds, in the order the service lists them
    #[serde(default, deserialize_with = "null_as_default")]
    pub unity_packages: Vec<UnityPackage>,
    /// Legacy top-level asset URL
    #[serde(default)]
    pub asset_url: Option<String>,
    /// Remaining fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AvatarRecord {
    /// Check whether the lowercase needle occurs in name, author or description
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        [&self.name, &self.author_name, &self.description]
            .iter()
            .any(|field| field.to_lowercase().contains(needle_lowercase))
    }

    /// Platforms with a package, in listed order
    pub fn platforms(&self) -> Vec<&str> {
        self.unity_packages
            .iter()
            .map(|pkg| pkg.platform.as_str())
            .collect()
    }

    /// Name for display, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Release-status filter applied to the listing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseFilter {
    /// Every avatar the user owns
    #[default]
    All,
    /// Public avatars only
    Public,
    /// Private avatars only
    Private,
}

impl ReleaseFilter {
    /// Value sent as `releaseStatus`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    /// Query parameters for one listing page
    pub fn query_params(&self, offset: usize, page_size: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("n", page_size.to_string()),
            ("offset", offset.to_string()),
            ("releaseStatus", self.as_str().to_string()),
        ];

        if *self != Self::All {
            params.push(("sort", fetch::SORT_FIELD.to_string()));
            params.push(("order", fetch::SORT_ORDER.to_string()));
        }

        params
    }
}

impl std::fmt::Display for ReleaseFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReleaseFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(format!(
                "unknown release filter '{}', expected all, public or private",
                other
            )),
        }
    }
}

/// Which code the second factor expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoFactorKind {
    /// Code delivered by email
    Email,
    /// Code from an authenticator app
    Authenticator,
}

impl TwoFactorKind {
    /// Classify a human-readable reason from the service.
    ///
    /// The email marker is checked first because it contains the generic one.
    pub fn from_reason(reason: &str) -> Option<Self> {
        if reason.contains(auth::EMAIL_TWO_FACTOR_REASON) {
            Some(Self::Email)
        } else if reason.contains(auth::TWO_FACTOR_REASON) {
            Some(Self::Authenticator)
        } else {
            None
        }
    }

    /// Reason text equivalent to a `requiresTwoFactorAuth` method list
    pub fn reason_for_methods(methods: &[String]) -> &'static str {
        if methods.iter().any(|m| m == auth::EMAIL_OTP_METHOD) {
            auth::EMAIL_TWO_FACTOR_REQUIRED
        } else {
            auth::TWO_FACTOR_REQUIRED
        }
    }

    /// Where the user finds the code
    pub fn code_source(&self) -> &'static str {
        match self {
            Self::Email => "sent to your email",
            Self::Authenticator => "from your authenticator app",
        }
    }
}

impl std::fmt::Display for TwoFactorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email => write!(f, "email code"),
            Self::Authenticator => write!(f, "authenticator code"),
        }
    }
}
