//! File download operations with atomic writes and streaming
//!
//! Avatar bundles are streamed with the session cookies into a temporary
//! sibling file and renamed over the destination once complete. Progress is
//! reported per whole percent when the server sends a length.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::app::resolve::strip_security_variant;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Progress of one streamed download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Whole percent complete, 0-100
    pub percent: u8,
    /// Bytes written so far
    pub downloaded: u64,
    /// Length announced by the server
    pub total: u64,
    /// Line suitable for a status bar
    pub message: String,
}

impl DownloadProgress {
    fn new(downloaded: u64, total: u64) -> Self {
        let percent = ((downloaded.min(total) * 100) / total) as u8;
        let message = format!(
            "Downloading file... {:.1} MB / {:.1} MB ({}%)",
            downloaded as f64 / BYTES_PER_MB,
            total as f64 / BYTES_PER_MB,
            percent
        );

        Self {
            percent,
            downloaded,
            total,
            message,
        }
    }
}

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler) -> Self {
        Self { http_handler }
    }

    /// Streams `url` to `destination`, returning the number of bytes written
    ///
    /// A `/variant/security` suffix is stripped from the URL first. The body
    /// goes to a temporary file next to the destination, which is renamed into
    /// place on success and removed on failure.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The file already exists and force is false
    /// - The URL cannot be parsed
    /// - The server answers anything but 200
    /// - The HTTP stream or file I/O fails
    pub async fn download_file<F>(
        &self,
        url: &str,
        destination: &Path,
        force: bool,
        mut on_progress: F,
    ) -> DownloadResult<u64>
    where
        F: FnMut(&DownloadProgress),
    {
        if destination.exists() && !force {
            return Err(DownloadError::FileExists {
                path: destination.display().to_string(),
            });
        }

        let url = parse_url(&strip_security_variant(url))?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = temp_path_for(destination);
        tracing::info!("Downloading from {} to {}", url, destination.display());

        let written = match self
            .stream_to_file(&url, &temp_path, &mut on_progress)
            .await
        {
            Ok(written) => written,
            Err(e) => {
                if temp_path.exists() {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
                tracing::error!("Download error: {}", e);
                return Err(e);
            }
        };

        tokio::fs::rename(&temp_path, destination)
            .await
            .map_err(|_e| DownloadError::AtomicOperationFailed {
                temp_path: temp_path.clone(),
                final_path: destination.to_path_buf(),
            })?;

        tracing::info!(
            "Download complete: {} ({} bytes)",
            destination.display(),
            written
        );
        Ok(written)
    }

    async fn stream_to_file<F>(
        &self,
        url: &Url,
        temp_path: &Path,
        on_progress: &mut F,
    ) -> DownloadResult<u64>
    where
        F: FnMut(&DownloadProgress),
    {
        let response = self.http_handler.get_response(url).await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::error!("Download failed with status {}", status.as_u16());
            return Err(DownloadError::ServerError {
                status: status.as_u16(),
            });
        }

        let total = response.content_length().filter(|&len| len > 0);
        match total {
            Some(len) => tracing::info!("File size: {:.2} MB", len as f64 / BYTES_PER_MB),
            None => tracing::debug!("Server sent no content length; progress disabled"),
        }

        let file = File::create(temp_path).await?;
        let mut writer = BufWriter::with_capacity(files::DOWNLOAD_CHUNK_SIZE, file);

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        let mut last_percent: Option<u8> = None;
        let mut next_log_at = files::PROGRESS_LOG_INTERVAL_BYTES;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(total) = total {
                let progress = DownloadProgress::new(downloaded, total);
                if last_percent.map_or(true, |last| progress.percent > last) {
                    last_percent = Some(progress.percent);
                    on_progress(&progress);
                }

                if downloaded >= next_log_at {
                    tracing::info!("{}", progress.message);
                    next_log_at += files::PROGRESS_LOG_INTERVAL_BYTES;
                }
            }
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;

        Ok(downloaded)
    }

    /// Downloads a small file into memory
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the URL is invalid, the server answers
    /// anything but 200, or the body cannot be read
    pub async fn download_content(&self, url: &str) -> DownloadResult<Vec<u8>> {
        let parsed_url = parse_url(url)?;

        let (status, bytes) = self.http_handler.get_binary(&parsed_url).await?;
        if status != reqwest::StatusCode::OK {
            return Err(DownloadError::ServerError {
                status: status.as_u16(),
            });
        }

        Ok(bytes)
    }
}

fn parse_url(url: &str) -> DownloadResult<Url> {
    Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
        url: url.to_string(),
        error: e.to_string(),
    })
}

/// Sibling path the body is written to before the final rename
fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(files::TEMP_FILE_SUFFIX);
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::fs;

    use crate::app::client::config::ClientConfig;

    fn create_test_handler() -> HttpHandler {
        let config = ClientConfig::default();
        HttpHandler::new(
            config.build_http_client().unwrap(),
            config.parsed_base_url().unwrap(),
            5,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_download_file_already_exists() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("existing.vrca");
        fs::write(&file_path, "existing content").await.unwrap();

        let http_handler = create_test_handler();
        let download_handler = DownloadHandler::new(&http_handler);

        let result = download_handler
            .download_file("https://example.com/file", &file_path, false, |_| {})
            .await;

        match result {
            Err(DownloadError::FileExists { .. }) => {}
            other => panic!("Expected DownloadError::FileExists, got {:?}", other),
        }
        assert_eq!(
            fs::read_to_string(&file_path).await.unwrap(),
            "existing content"
        );
    }

    #[tokio::test]
    async fn test_download_rejects_invalid_url() {
        let temp_dir = tempdir().unwrap();
        let http_handler = create_test_handler();
        let download_handler = DownloadHandler::new(&http_handler);

        let result = download_handler
            .download_file("not-a-url", &temp_dir.path().join("a.vrca"), false, |_| {})
            .await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[test]
    fn test_temp_path_keeps_full_name() {
        let temp = temp_path_for(Path::new("/tmp/My Avatar.vrca"));
        assert_eq!(temp, PathBuf::from("/tmp/My Avatar.vrca.tmp"));

        let temp = temp_path_for(Path::new("/tmp/bundle"));
        assert_eq!(temp, PathBuf::from("/tmp/bundle.tmp"));
    }

    #[test]
    fn test_progress_message() {
        let progress = DownloadProgress::new(5 * 1024 * 1024, 10 * 1024 * 1024);
        assert_eq!(progress.percent, 50);
        assert_eq!(
            progress.message,
            "Downloading file... 5.0 MB / 10.0 MB (50%)"
        );
    }

    #[test]
    fn test_progress_is_capped_at_total() {
        let progress = DownloadProgress::new(150, 100);
        assert_eq!(progress.percent, 100);
    }
}
