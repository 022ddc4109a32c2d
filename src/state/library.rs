//! Content library: media list, type filter, sort order and server ops.

use std::cell::RefCell;
use std::cmp::{Ordering, Reverse};
use std::rc::Rc;

use crate::constants::CONFIRM_DELETE_MEDIA;
use crate::error::ApiError;
use crate::models::{LibraryStats, MediaItem, MediaType};
use crate::network::{ApiClient, FormValue};
use crate::utils::timestamp_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFilter {
    #[default]
    All,
    Only(MediaType),
}

impl MediaFilter {
    /// Parse the `data-filter` attribute of a filter button.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "image" => MediaFilter::Only(MediaType::Image),
            "video" => MediaFilter::Only(MediaType::Video),
            _ => MediaFilter::All,
        }
    }

    pub fn accepts(&self, item: &MediaItem) -> bool {
        match self {
            MediaFilter::All => true,
            MediaFilter::Only(kind) => item.media_type == *kind,
        }
    }

    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            MediaFilter::All => None,
            MediaFilter::Only(kind) => Some(*kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Recent,
    Popular,
    Name,
}

impl SortKey {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "popular" => SortKey::Popular,
            "name" => SortKey::Name,
            _ => SortKey::Recent,
        }
    }
}

/// Stable sort in place.  Items without a parseable upload date sort last
/// under `Recent`.
pub fn sort_media(items: &mut [MediaItem], key: SortKey) {
    match key {
        SortKey::Recent => {
            items.sort_by_key(|m| Reverse(timestamp_millis(m.upload_date.as_deref()).unwrap_or(i64::MIN)))
        }
        SortKey::Popular => items.sort_by_key(|m| Reverse(m.used_count)),
        SortKey::Name => items.sort_by(|a, b| name_order(&a.filename, &b.filename)),
    }
}

// Case-insensitive first; names differing only in case keep a fixed order.
fn name_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    media: Vec<MediaItem>,
    filter: MediaFilter,
    sort: SortKey,
    stats: Option<LibraryStats>,
}

impl LibraryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list; the current sort order is re-applied.
    pub fn set_media(&mut self, mut media: Vec<MediaItem>) {
        sort_media(&mut media, self.sort);
        self.media = media;
    }

    pub fn media(&self) -> &[MediaItem] {
        &self.media
    }

    pub fn find(&self, id: &str) -> Option<&MediaItem> {
        self.media.iter().find(|m| m.id == id)
    }

    pub fn set_filter(&mut self, filter: MediaFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> MediaFilter {
        self.filter
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        sort_media(&mut self.media, sort);
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn set_stats(&mut self, stats: LibraryStats) {
        self.stats = Some(stats);
    }

    pub fn stats(&self) -> Option<&LibraryStats> {
        self.stats.as_ref()
    }

    pub fn visible(&self) -> Vec<&MediaItem> {
        self.media.iter().filter(|m| self.filter.accepts(m)).collect()
    }
}

/// Upload form contents for `POST /api/library/upload`.
pub struct LibraryUpload {
    pub file: FormValue,
    /// Comma-separated, sent verbatim.
    pub tags: String,
    pub description: String,
}

impl LibraryUpload {
    pub fn into_parts(self) -> Vec<(String, FormValue)> {
        vec![
            ("file".to_string(), self.file),
            ("tags".to_string(), FormValue::Text(self.tags)),
            ("description".to_string(), FormValue::Text(self.description)),
        ]
    }
}

#[derive(Clone)]
pub struct ContentLibrary {
    api: Rc<ApiClient>,
    state: Rc<RefCell<LibraryState>>,
}

impl ContentLibrary {
    pub fn new(api: Rc<ApiClient>) -> Self {
        Self {
            api,
            state: Rc::new(RefCell::new(LibraryState::new())),
        }
    }

    pub fn state(&self) -> &Rc<RefCell<LibraryState>> {
        &self.state
    }

    pub async fn load(&self) -> Result<(), ApiError> {
        let media = self.api.get_library(None).await?;
        self.state.borrow_mut().set_media(media);
        Ok(())
    }

    pub async fn load_stats(&self) -> Result<(), ApiError> {
        let stats = self.api.get_library_stats().await?;
        self.state.borrow_mut().set_stats(stats);
        Ok(())
    }

    /// Server-side search; a blank query reloads the whole library.
    pub async fn search(&self, query: &str) -> Result<(), ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return self.load().await;
        }
        let media = self.api.search_library(query).await?;
        self.state.borrow_mut().set_media(media);
        Ok(())
    }

    /// Returns `false` when the user declined; nothing is sent then.
    pub async fn delete(&self, id: &str, confirm: &dyn Fn(&str) -> bool) -> Result<bool, ApiError> {
        if !confirm(CONFIRM_DELETE_MEDIA) {
            return Ok(false);
        }
        self.api.delete_media(id).await?;
        self.reload_all().await;
        Ok(true)
    }

    pub async fn upload(&self, upload: LibraryUpload) -> Result<(), ApiError> {
        self.api.upload_media(upload.into_parts()).await?;
        self.reload_all().await;
        Ok(())
    }

    /// Record a use and reload so the card shows the new count.
    pub async fn use_in_post(&self, id: &str) -> Result<(), ApiError> {
        self.api.use_media(id).await?;
        self.load().await
    }

    async fn reload_all(&self) {
        if let Err(e) = self.load().await {
            error_log!("Error loading library: {}", e);
        }
        if let Err(e) = self.load_stats().await {
            error_log!("Error loading library stats: {}", e);
        }
    }
}
