//! Download URL resolution and save-name helpers

use crate::app::models::AvatarRecord;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// Picks the asset URL to download for an avatar.
///
/// The Windows package wins, then the first package with any URL, then the
/// legacy top-level `assetUrl`. The result has any security variant stripped.
///
/// # Errors
///
/// Returns `DownloadError::NoDownloadableAsset` if no candidate is non-empty.
pub fn resolve_download_url(record: &AvatarRecord) -> DownloadResult<String> {
    let preferred = record
        .unity_packages
        .iter()
        .find(|pkg| pkg.platform == files::TARGET_PLATFORM)
        .and_then(|pkg| pkg.usable_asset_url());

    let url = preferred
        .or_else(|| {
            record
                .unity_packages
                .iter()
                .find_map(|pkg| pkg.usable_asset_url())
        })
        .or_else(|| record.asset_url.as_deref().filter(|url| !url.is_empty()))
        .ok_or(DownloadError::NoDownloadableAsset)?;

    tracing::debug!("Resolved download URL for {}: {}", record.id, url);
    Ok(strip_security_variant(url))
}

/// Truncates a URL at the `/variant/security` segment, if present
pub fn strip_security_variant(url: &str) -> String {
    match url.find(files::SECURITY_VARIANT_SEGMENT) {
        Some(index) => url[..index].to_string(),
        None => url.to_string(),
    }
}

/// Replaces characters not allowed in file names with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if files::FORBIDDEN_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Default save name for an avatar bundle
pub fn default_file_name(record: &AvatarRecord) -> String {
    file_name_with_extension(record, files::DEFAULT_FILE_EXTENSION)
}

/// Sanitized avatar name (or `avatar`) followed by `extension`
pub fn file_name_with_extension(record: &AvatarRecord, extension: &str) -> String {
    let stem = sanitize_filename(record.name.trim());
    let stem = if stem.is_empty() {
        files::DEFAULT_FILE_STEM.to_string()
    } else {
        stem
    };
    format!("{}{}", stem, extension)
}
