//! Caption library state and its server operations.
//!
//! Both page layouts (the compact panel and the full library page) share
//! this module; they differ only in rendering.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::constants::{
    ALL_CATEGORIES, ALL_CATEGORIES_LABEL, CONFIRM_REPLACE_CAPTIONS, SPREADSHEET_EXTENSIONS,
    SPREADSHEET_MIME_TYPES,
};
use crate::error::ApiError;
use crate::models::{Caption, CaptionStats};
use crate::network::{ApiClient, FormValue};
use crate::utils::pluralize;

#[derive(Debug, Clone)]
pub struct CaptionLibraryState {
    captions: Vec<Caption>,
    category: String,
    search: String,
    stats: Option<CaptionStats>,
}

impl Default for CaptionLibraryState {
    fn default() -> Self {
        Self {
            captions: Vec::new(),
            category: ALL_CATEGORIES.to_string(),
            search: String::new(),
            stats: None,
        }
    }
}

impl CaptionLibraryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_captions(&mut self, captions: Vec<Caption>) {
        self.captions = captions;
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    pub fn total(&self) -> usize {
        self.captions.len()
    }

    pub fn find(&self, id: &str) -> Option<&Caption> {
        self.captions.iter().find(|c| c.id == id)
    }

    /// Select a category.  The expanded layout's "All Categories" button and
    /// an empty value both mean "no category filter".
    pub fn set_category(&mut self, category: &str) {
        let category = category.trim();
        self.category = if category.is_empty() || category == ALL_CATEGORIES_LABEL {
            ALL_CATEGORIES.to_string()
        } else {
            category.to_string()
        };
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_stats(&mut self, stats: CaptionStats) {
        self.stats = Some(stats);
    }

    pub fn stats(&self) -> Option<&CaptionStats> {
        self.stats.as_ref()
    }

    pub fn visible(&self) -> Vec<&Caption> {
        let needle = self.search.to_lowercase();
        self.captions
            .iter()
            .filter(|c| caption_matches(c, &self.category, &needle))
            .collect()
    }

    /// `All` followed by every distinct non-empty category, sorted.
    pub fn categories(&self) -> Vec<String> {
        let distinct: BTreeSet<&str> = self
            .captions
            .iter()
            .filter_map(|c| c.category.as_deref())
            .filter(|c| !c.is_empty())
            .collect();
        std::iter::once(ALL_CATEGORIES.to_string())
            .chain(distinct.into_iter().map(str::to_string))
            .collect()
    }

    /// Optimistically bump a caption's usage counter; returns the new value.
    pub fn record_use(&mut self, id: &str) -> Option<u32> {
        let caption = self.captions.iter_mut().find(|c| c.id == id)?;
        caption.usage_count = caption.usage_count.saturating_add(1);
        Some(caption.usage_count)
    }

    /// `"N caption(s)"` over the visible set.
    pub fn count_label(&self) -> String {
        pluralize(self.visible().len(), "caption")
    }
}

/// Category matches (or is `All`) and the lowercase `needle` occurs in the
/// text, case-insensitively.  An empty needle matches everything.
pub fn caption_matches(caption: &Caption, category: &str, needle: &str) -> bool {
    let category_ok = category == ALL_CATEGORIES || caption.category.as_deref() == Some(category);
    category_ok && (needle.is_empty() || caption.text.to_lowercase().contains(needle))
}

pub fn is_spreadsheet(filename: &str, mime: &str) -> bool {
    let name = filename.to_lowercase();
    SPREADSHEET_MIME_TYPES.contains(&mime) || SPREADSHEET_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplaceOutcome {
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
    Replaced { message: String, count: usize },
}

/// Caption library bound to the backend.  Cloning shares the state.
#[derive(Clone)]
pub struct CaptionLibrary {
    api: Rc<ApiClient>,
    state: Rc<RefCell<CaptionLibraryState>>,
}

impl CaptionLibrary {
    pub fn new(api: Rc<ApiClient>) -> Self {
        Self {
            api,
            state: Rc::new(RefCell::new(CaptionLibraryState::new())),
        }
    }

    pub fn state(&self) -> &Rc<RefCell<CaptionLibraryState>> {
        &self.state
    }

    pub async fn load(&self) -> Result<(), ApiError> {
        let captions = self.api.get_captions().await?;
        debug_log!("Loaded {} captions", captions.len());
        self.state.borrow_mut().set_captions(captions);
        Ok(())
    }

    pub async fn load_stats(&self) -> Result<(), ApiError> {
        let stats = self.api.get_caption_stats().await?;
        self.state.borrow_mut().set_stats(stats);
        Ok(())
    }

    /// Replace every caption with the contents of a spreadsheet.
    ///
    /// The file is checked before the user is asked, and nothing is sent when
    /// either the check or the confirmation fails.  On success the list (and
    /// the stats when `with_stats`) is reloaded so counts reflect the new set.
    pub async fn replace_all(
        &self,
        file: FormValue,
        filename: &str,
        mime: &str,
        confirm: &dyn Fn(&str) -> bool,
        with_stats: bool,
    ) -> Result<ReplaceOutcome, ApiError> {
        if !is_spreadsheet(filename, mime) {
            return Err(ApiError::validation("Please upload an Excel file (.xlsx or .xls)"));
        }
        if !confirm(CONFIRM_REPLACE_CAPTIONS) {
            return Ok(ReplaceOutcome::Cancelled);
        }

        let result = self.api.replace_all_captions(file).await?;
        if !result.success {
            return Err(ApiError::Rejected(
                result.message.unwrap_or_else(|| "Upload failed".to_string()),
            ));
        }
        if let Some(summary) = &result.summary {
            debug_log!(
                "Replaced with {} captions across {} categories",
                summary.total,
                summary.by_category.len()
            );
        }

        self.load().await?;
        if with_stats {
            if let Err(e) = self.load_stats().await {
                error_log!("Error loading caption stats: {}", e);
            }
        }

        let count = self.state.borrow().total();
        let message = result
            .message
            .unwrap_or_else(|| format!("Replaced all captions. Added {} captions", count));
        Ok(ReplaceOutcome::Replaced { message, count })
    }

    pub async fn add_single(&self, text: &str, category: &str) -> Result<(), ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::validation("Caption text is required"));
        }
        let result = self.api.add_caption(text, category).await?;
        if !result.success {
            return Err(ApiError::Rejected(
                result.message.unwrap_or_else(|| "Failed to add caption".to_string()),
            ));
        }
        self.load().await
    }

    /// Report a copy to the backend.  Failures are logged only; the local
    /// counter was already bumped by [`CaptionLibraryState::record_use`].
    pub async fn track_use(&self, id: &str) {
        if let Err(e) = self.api.track_caption_use(id).await {
            error_log!("Error tracking caption usage: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionHandle;
    use crate::models::User;
    use crate::network::mock::MockTransport;
    use crate::network::ApiConfig;
    use crate::storage::MemoryStore;
    use futures::executor::block_on;
    use proptest::prelude::*;
    use std::cell::Cell;

    fn caption(id: &str, text: &str, category: Option<&str>) -> Caption {
        Caption {
            id: id.into(),
            text: text.into(),
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    fn sample() -> CaptionLibraryState {
        let mut state = CaptionLibraryState::new();
        state.set_captions(vec![
            caption("1", "Good morning sunshine", Some("Morning")),
            caption("2", "New post is LIVE", Some("Promo")),
            caption("3", "morning coffee vibes", Some("Promo")),
            caption("4", "untagged", None),
        ]);
        state
    }

    fn library() -> (CaptionLibrary, Rc<MockTransport>) {
        let session = SessionHandle::load(Rc::new(MemoryStore::new()));
        session.establish("tok".into(), User::default());
        let transport = Rc::new(MockTransport::new());
        let api = ApiClient::new(ApiConfig::default(), session, transport.clone());
        (CaptionLibrary::new(Rc::new(api)), transport)
    }

    fn xlsx() -> FormValue {
        FormValue::Bytes {
            filename: "captions.xlsx".into(),
            mime: SPREADSHEET_MIME_TYPES[1].into(),
            data: vec![0x50, 0x4b],
        }
    }

    #[test]
    fn category_and_search_combine() {
        let mut state = sample();
        state.set_category("Promo");
        state.set_search("MORNING");
        let ids: Vec<&str> = state.visible().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);
        assert_eq!(state.count_label(), "1 caption");
    }

    #[test]
    fn all_categories_label_is_the_all_sentinel() {
        let mut state = sample();
        state.set_category(ALL_CATEGORIES_LABEL);
        assert_eq!(state.category(), ALL_CATEGORIES);
        assert_eq!(state.visible().len(), 4);
    }

    #[test]
    fn categories_are_sorted_after_all() {
        assert_eq!(sample().categories(), vec!["All", "Morning", "Promo"]);
    }

    #[test]
    fn record_use_is_local_and_unknown_ids_ignored() {
        let mut state = sample();
        assert_eq!(state.record_use("2"), Some(1));
        assert_eq!(state.record_use("2"), Some(2));
        assert_eq!(state.record_use("nope"), None);
    }

    #[test]
    fn spreadsheet_detection() {
        assert!(is_spreadsheet("Captions.XLSX", ""));
        assert!(is_spreadsheet("export", "application/vnd.ms-excel"));
        assert!(!is_spreadsheet("captions.csv", "text/csv"));
    }

    #[test]
    fn non_spreadsheet_is_rejected_before_confirmation() {
        let (lib, transport) = library();
        let asked = Cell::new(false);
        let confirm = |_: &str| {
            asked.set(true);
            true
        };
        let err = block_on(lib.replace_all(xlsx(), "notes.txt", "text/plain", &confirm, false)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(!asked.get());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn declined_confirmation_sends_nothing() {
        let (lib, transport) = library();
        let outcome = block_on(lib.replace_all(xlsx(), "captions.xlsx", "", &|_: &str| false, false)).unwrap();
        assert_eq!(outcome, ReplaceOutcome::Cancelled);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn replace_all_reloads_and_counts_new_set() {
        let (lib, transport) = library();
        lib.state().borrow_mut().set_captions(vec![caption("old", "old", None)]);
        transport.respond(200, r#"{"success":true,"message":"Replaced 2 captions","captions":[{"id":1,"text":"a"},{"id":2,"text":"b"}]}"#);
        transport.respond(200, r#"[{"id":1,"text":"a","category":"X"},{"id":2,"text":"b","category":"Y"}]"#);
        transport.respond(200, r#"{"total":2,"categories":{"X":1,"Y":1}}"#);

        let outcome = block_on(lib.replace_all(xlsx(), "captions.xlsx", "", &|_: &str| true, true)).unwrap();
        assert_eq!(
            outcome,
            ReplaceOutcome::Replaced {
                message: "Replaced 2 captions".into(),
                count: 2
            }
        );
        assert!(lib.state().borrow().find("old").is_none());
        assert_eq!(lib.state().borrow().stats().map(|s| s.total), Some(2));
        assert_eq!(
            transport.urls(),
            vec!["/api/captions/replace-all", "/api/captions", "/api/captions/stats"]
        );
        assert_eq!(transport.requests()[0].form_field_names(), vec!["file"]);
    }

    #[test]
    fn failed_replace_keeps_old_captions() {
        let (lib, transport) = library();
        lib.state().borrow_mut().set_captions(vec![caption("old", "old", None)]);
        transport.respond(200, r#"{"success":false,"message":"No captions found in file"}"#);
        let err = block_on(lib.replace_all(xlsx(), "c.xls", "", &|_: &str| true, false)).unwrap_err();
        assert_eq!(err, ApiError::Rejected("No captions found in file".into()));
        assert_eq!(lib.state().borrow().total(), 1);
    }

    #[test]
    fn empty_single_caption_is_blocked() {
        let (lib, transport) = library();
        let err = block_on(lib.add_single("   ", "General")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn add_single_posts_trimmed_text_then_reloads() {
        let (lib, transport) = library();
        transport.respond(200, r#"{"success":true}"#);
        transport.respond(200, r#"[{"id":"9","text":"hello"}]"#);
        block_on(lib.add_single("  hello ", "Promo")).unwrap();
        let req = &transport.requests()[0];
        assert_eq!(req.form_text("text"), Some("hello"));
        assert_eq!(req.form_text("category"), Some("Promo"));
        assert_eq!(lib.state().borrow().total(), 1);
    }

    #[test]
    fn failed_usage_tracking_keeps_local_count() {
        let (lib, transport) = library();
        lib.state().borrow_mut().set_captions(vec![caption("5", "hi", None)]);
        lib.state().borrow_mut().record_use("5");
        transport.fail("offline");
        block_on(lib.track_use("5"));
        assert_eq!(lib.state().borrow().find("5").map(|c| c.usage_count), Some(1));
    }

    #[test]
    fn search_keeps_surrounding_spaces() {
        let mut state = CaptionLibraryState::new();
        state.set_captions(vec![caption("1", "goodbye", None), caption("2", "Good day", None)]);
        state.set_search("good ");
        let ids: Vec<&str> = state.visible().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
        assert_eq!(state.search(), "good ");
    }

    proptest! {
        #[test]
        fn visible_is_exactly_the_filter(
            texts in prop::collection::vec(("[a-cA-C ]{0,8}", prop::option::of("[xy]")), 0..12),
            category in prop::sample::select(vec!["All", "x", "y"]),
            search in "[a-cA-C ]{0,3}",
        ) {
            let mut state = CaptionLibraryState::new();
            state.set_captions(
                texts.iter().enumerate()
                    .map(|(i, (t, c))| caption(&i.to_string(), t, c.as_deref()))
                    .collect(),
            );
            state.set_category(category);
            state.set_search(&search);

            let needle = search.to_lowercase();
            let expected: Vec<String> = texts.iter().enumerate()
                .filter(|(_, (t, c))| {
                    (category == "All" || c.as_deref() == Some(category))
                        && t.to_lowercase().contains(&needle)
                })
                .map(|(i, _)| i.to_string())
                .collect();
            let actual: Vec<String> = state.visible().iter().map(|c| c.id.clone()).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
