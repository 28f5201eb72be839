//! Paginated avatar listing
//!
//! Pulls the caller's avatars page by page until the service runs dry or the
//! page cap is reached. A failed page discards everything fetched so far.

use serde::{Deserialize, Serialize};

use crate::app::client::ApiClient;
use crate::app::models::{AvatarRecord, ReleaseFilter};
use crate::constants::fetch;
use crate::errors::ApiResult;

/// Listing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Records requested per page
    pub page_size: usize,
    /// Hard cap on pages per fetch
    pub max_pages: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: fetch::PAGE_SIZE,
            max_pages: fetch::MAX_PAGES,
        }
    }
}

/// Progress after each received page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    /// 1-based page number just received
    pub page: usize,
    /// Records received on that page
    pub received: usize,
    /// Records accumulated so far
    pub total: usize,
}

/// Anything that can serve one page of the avatar listing
#[allow(async_fn_in_trait)]
pub trait AvatarPageSource {
    async fn avatar_page(
        &self,
        filter: ReleaseFilter,
        offset: usize,
        page_size: usize,
    ) -> ApiResult<Vec<AvatarRecord>>;
}

impl AvatarPageSource for ApiClient {
    async fn avatar_page(
        &self,
        filter: ReleaseFilter,
        offset: usize,
        page_size: usize,
    ) -> ApiResult<Vec<AvatarRecord>> {
        self.list_avatars_page(filter, offset, page_size).await
    }
}

/// Runs full listing fetches against a page source
pub struct AvatarFetcher<'a, S> {
    source: &'a S,
    config: FetchConfig,
}

impl<'a, S: AvatarPageSource> AvatarFetcher<'a, S> {
    pub fn new(source: &'a S, config: FetchConfig) -> Self {
        Self { source, config }
    }

    /// Fetches every page for `filter`, starting from offset 0
    ///
    /// # Errors
    ///
    /// Returns the first page error; records from earlier pages are dropped
    pub async fn fetch_all(&self, filter: ReleaseFilter) -> ApiResult<Vec<AvatarRecord>> {
        self.fetch_all_with_progress(filter, |_| {}).await
    }

    /// Like [`fetch_all`](Self::fetch_all), calling `on_page` after each non-empty page
    pub async fn fetch_all_with_progress<F>(
        &self,
        filter: ReleaseFilter,
        mut on_page: F,
    ) -> ApiResult<Vec<AvatarRecord>>
    where
        F: FnMut(PageProgress),
    {
        let page_size = self.config.page_size.max(1);
        let mut records: Vec<AvatarRecord> = Vec::new();
        let mut offset = 0;

        tracing::info!("Fetching {} avatars", filter);

        for page in 1..=self.config.max_pages {
            let batch = match self.source.avatar_page(filter, offset, page_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::error!("Error fetching avatars at offset {}: {}", offset, e);
                    return Err(e);
                }
            };

            if batch.is_empty() {
                tracing::debug!("Empty page at offset {}, stopping", offset);
                break;
            }

            let received = batch.len();
            records.extend(batch);
            tracing::info!("Retrieved {} avatars (total: {})", received, records.len());
            on_page(PageProgress {
                page,
                received,
                total: records.len(),
            });

            if received < page_size {
                break;
            }

            offset += page_size;
        }

        tracing::info!("Total avatars retrieved: {}", records.len());
        Ok(records)
    }
}

/// Fetches every page with the default listing parameters
pub async fn fetch_all(client: &ApiClient, filter: ReleaseFilter) -> ApiResult<Vec<AvatarRecord>> {
    AvatarFetcher::new(client, FetchConfig::default())
        .fetch_all(filter)
        .await
}
