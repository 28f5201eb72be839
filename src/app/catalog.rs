//! In-memory avatar catalog with filtering and pagination
//!
//! The catalog owns the last fetched listing. Filtering always runs over the
//! whole listing, and any change to the filter, page size or listing puts the
//! view back on page 1. Page numbers are 1-based and clamped to
//! `[1, total_pages]`.

use crate::app::models::AvatarRecord;
use crate::constants::catalog;

/// Filtered, paginated view over the fetched avatars
#[derive(Debug, Clone)]
pub struct AvatarCatalog {
    records: Vec<AvatarRecord>,
    /// Indices into `records` that pass the filter, in listing order
    filtered: Vec<usize>,
    filter_text: String,
    current_page: usize,
    page_size: usize,
}

impl Default for AvatarCatalog {
    fn default() -> Self {
        Self::new(catalog::DEFAULT_PAGE_SIZE)
    }
}

impl AvatarCatalog {
    /// Empty catalog showing `page_size` records per page
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            filtered: Vec::new(),
            filter_text: String::new(),
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Swaps in a new listing, keeping the current filter text
    pub fn replace_records(&mut self, records: Vec<AvatarRecord>) {
        self.records = records;
        self.apply_filter();
    }

    /// Filters by case-insensitive substring over name, author and description
    pub fn set_filter(&mut self, text: &str) {
        self.filter_text = text.to_lowercase();
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        self.filtered = if self.filter_text.is_empty() {
            (0..self.records.len()).collect()
        } else {
            self.records
                .iter()
                .enumerate()
                .filter(|(_, record)| record.matches(&self.filter_text))
                .map(|(i, _)| i)
                .collect()
        };
        self.current_page = 1;

        tracing::debug!("{}", self.filter_summary());
    }

    /// Records on `page_number` (clamped) for the given page size
    pub fn get_page(&self, page_number: usize, page_size: usize) -> Vec<&AvatarRecord> {
        let page_size = page_size.max(1);
        let page = page_number.clamp(1, pages_for(self.filtered.len(), page_size));
        let start = (page - 1) * page_size;
        let end = (start + page_size).min(self.filtered.len());

        self.filtered[start..end]
            .iter()
            .map(|&i| &self.records[i])
            .collect()
    }

    /// Records on the current page
    pub fn current_page_items(&self) -> Vec<&AvatarRecord> {
        self.get_page(self.current_page, self.page_size)
    }

    /// Record at 1-based `position` on the current page
    pub fn select(&self, position: usize) -> Option<&AvatarRecord> {
        position
            .checked_sub(1)
            .and_then(|index| self.current_page_items().get(index).copied())
    }

    /// Changes the page size and returns to page 1; 0 is treated as 1
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.current_page = 1;
    }

    /// Moves to `page`, clamped to the valid range
    pub fn set_page(&mut self, page: usize) -> usize {
        self.current_page = page.clamp(1, self.total_pages());
        self.current_page
    }

    pub fn next_page(&mut self) -> usize {
        self.set_page(self.current_page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> usize {
        self.set_page(self.current_page.saturating_sub(1))
    }

    /// `max(1, ceil(filtered / page_size))`
    pub fn total_pages(&self) -> usize {
        pages_for(self.filtered.len(), self.page_size)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    /// Number of records in the whole listing
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records passing the filter
    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// Every record passing the filter, in listing order
    pub fn filtered_records(&self) -> impl Iterator<Item = &AvatarRecord> {
        self.filtered.iter().map(|&i| &self.records[i])
    }

    /// Summary of the filter result
    pub fn filter_summary(&self) -> String {
        if self.filter_text.is_empty() {
            format!("Showing all {} avatars", self.records.len())
        } else {
            format!(
                "Found {} of {} avatars matching '{}'",
                self.filtered.len(),
                self.records.len(),
                self.filter_text
            )
        }
    }

    /// Position of the current page within the filtered set
    pub fn status_line(&self) -> String {
        if self.filtered.is_empty() {
            return "No avatars found matching your search".to_string();
        }

        let start = (self.current_page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.filtered.len());
        format!(
            "Showing avatars {}-{} of {}",
            start + 1,
            end,
            self.filtered.len()
        )
    }

    /// `Page x of y` label
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.current_page, self.total_pages())
    }
}

fn pages_for(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}
