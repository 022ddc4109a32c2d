//! Post composer: selected models, attached media, submission and queue ops.
//!
//! [`ComposerState`] replaces the page-level globals the dashboard used to
//! share between handlers.  It is owned by [`Composer`] and only reached
//! through accessors.

use std::cell::RefCell;
use std::rc::Rc;

use crate::constants::{CAPTION_SUGGESTION_LIMIT, CONFIRM_CANCEL_POST, CONFIRM_DELETE_POST};
use crate::error::ApiError;
use crate::models::{Caption, MediaItem, PostEdit, SystemStatus};
use crate::network::{ApiClient, FormValue};
use crate::state::library::MediaFilter;
use crate::utils::pluralize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAction {
    /// Publish immediately; any schedule time is discarded.
    Now,
    /// Requires a schedule time.
    Schedule,
}

impl SubmitAction {
    pub fn parse(raw: &str) -> Self {
        if raw == "schedule" {
            SubmitAction::Schedule
        } else {
            SubmitAction::Now
        }
    }
}

/// A file chosen from disk, not yet uploaded.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub name: String,
    pub mime: String,
    pub value: FormValue,
}

impl PendingUpload {
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Everything `/schedule-post` needs, assembled at submit time.
#[derive(Debug, Clone)]
pub struct PendingPost {
    pub content: String,
    pub models: Vec<String>,
    pub schedule_time: String,
    pub library_media_ids: Vec<String>,
    pub files: Vec<PendingUpload>,
}

impl PendingPost {
    pub fn into_parts(self) -> Result<Vec<(String, FormValue)>, ApiError> {
        let mut parts = vec![
            ("content".to_string(), FormValue::Text(self.content)),
            (
                "models".to_string(),
                FormValue::Text(serde_json::to_string(&self.models)?),
            ),
            ("schedule_time".to_string(), FormValue::Text(self.schedule_time)),
        ];
        if !self.library_media_ids.is_empty() {
            parts.push((
                "library_media_ids".to_string(),
                FormValue::Text(serde_json::to_string(&self.library_media_ids)?),
            ));
        }
        for file in self.files {
            parts.push(("media_files".to_string(), file.value));
        }
        Ok(parts)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComposerState {
    models: Vec<String>,
    library_media: Vec<MediaItem>,
    uploads: Vec<PendingUpload>,
    picker_items: Vec<MediaItem>,
    picker_filter: MediaFilter,
}

impl ComposerState {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------- Models ----------------

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn is_model_selected(&self, name: &str) -> bool {
        self.models.iter().any(|m| m == name)
    }

    /// Checkbox toggle.  Selection order is preserved; duplicates ignored.
    pub fn set_model(&mut self, name: &str, selected: bool) {
        if selected {
            if !self.is_model_selected(name) {
                self.models.push(name.to_string());
            }
        } else {
            self.models.retain(|m| m != name);
        }
    }

    pub fn remove_model(&mut self, name: &str) {
        self.set_model(name, false);
    }

    pub fn select_all<S: AsRef<str>>(&mut self, available: &[S]) {
        self.models.clear();
        for name in available {
            self.set_model(name.as_ref(), true);
        }
    }

    pub fn deselect_all(&mut self) {
        self.models.clear();
    }

    // ---------------- Media ----------------

    pub fn library_media(&self) -> &[MediaItem] {
        &self.library_media
    }

    pub fn uploads(&self) -> &[PendingUpload] {
        &self.uploads
    }

    /// A new file-input selection replaces the previous one.
    pub fn set_uploads(&mut self, uploads: Vec<PendingUpload>) {
        self.uploads = uploads;
    }

    pub fn remove_upload(&mut self, index: usize) {
        if index < self.uploads.len() {
            self.uploads.remove(index);
        }
    }

    pub fn remove_library_media(&mut self, id: &str) {
        self.library_media.retain(|m| m.id != id);
    }

    pub fn media_count(&self) -> usize {
        self.library_media.len() + self.uploads.len()
    }

    pub fn media_count_label(&self) -> String {
        pluralize(self.media_count(), "file")
    }

    // ---------------- Library picker ----------------

    pub fn picker_items(&self) -> &[MediaItem] {
        &self.picker_items
    }

    pub fn set_picker_items(&mut self, items: Vec<MediaItem>) {
        self.picker_items = items;
    }

    pub fn picker_filter(&self) -> MediaFilter {
        self.picker_filter
    }

    pub fn set_picker_filter(&mut self, filter: MediaFilter) {
        self.picker_filter = filter;
    }

    pub fn is_library_selected(&self, id: &str) -> bool {
        self.library_media.iter().any(|m| m.id == id)
    }

    /// Toggle a picker item.  Picks come from the list already shown in the
    /// picker.  Returns the new selection state, or `None` for unknown ids.
    pub fn toggle_library_item(&mut self, id: &str) -> Option<bool> {
        if self.is_library_selected(id) {
            self.remove_library_media(id);
            return Some(false);
        }
        let item = self.picker_items.iter().find(|m| m.id == id)?.clone();
        self.library_media.push(item);
        Some(true)
    }

    pub fn picker_selection_label(&self) -> String {
        format!("{} selected", self.library_media.len())
    }

    // ---------------- Submission ----------------

    /// Validate and assemble the post.  `Schedule` without a time is refused;
    /// `Now` always sends an empty schedule time.
    pub fn build_post(
        &self,
        content: &str,
        schedule_time: &str,
        action: SubmitAction,
    ) -> Result<PendingPost, ApiError> {
        let schedule_time = match action {
            SubmitAction::Now => String::new(),
            SubmitAction::Schedule => {
                let t = schedule_time.trim();
                if t.is_empty() {
                    return Err(ApiError::validation("Please select a schedule time"));
                }
                t.to_string()
            }
        };
        Ok(PendingPost {
            content: content.to_string(),
            models: self.models.clone(),
            schedule_time,
            library_media_ids: self.library_media.iter().map(|m| m.id.clone()).collect(),
            files: self.uploads.clone(),
        })
    }

    pub fn edit_payload(&self, content: &str, schedule_time: &str) -> PostEdit {
        let schedule_time = schedule_time.trim();
        PostEdit {
            content: content.to_string(),
            models: self.models.clone(),
            schedule_time: (!schedule_time.is_empty()).then(|| schedule_time.to_string()),
        }
    }

    pub fn reset(&mut self) {
        self.models.clear();
        self.library_media.clear();
        self.uploads.clear();
    }
}

/// Case-insensitive model search used by the model dropdown.
pub fn model_matches(name: &str, search: &str) -> bool {
    name.to_lowercase().contains(&search.trim().to_lowercase())
}

/// Splice `insert` into `value` over the selection `[start, end)`.
///
/// Offsets are UTF-16 code units, as the DOM reports them.  Returns the new
/// value and the caret position just after the inserted text.
pub fn insert_at_cursor(value: &str, start: u32, end: u32, insert: &str) -> (String, u32) {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let a = utf16_to_byte(value, start);
    let b = utf16_to_byte(value, end);
    let mut out = String::with_capacity(value.len() + insert.len());
    out.push_str(&value[..a]);
    out.push_str(insert);
    out.push_str(&value[b..]);
    let caret = start + insert.encode_utf16().count() as u32;
    (out, caret)
}

fn utf16_to_byte(s: &str, offset: u32) -> usize {
    let mut units = 0u32;
    for (byte, ch) in s.char_indices() {
        if units >= offset {
            return byte;
        }
        units += ch.len_utf16() as u32;
    }
    s.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueTab {
    Queue,
    History,
}

impl QueueTab {
    pub fn from_hash(hash: &str) -> Self {
        if hash == "#history" {
            QueueTab::History
        } else {
            QueueTab::Queue
        }
    }
}

#[derive(Clone)]
pub struct Composer {
    api: Rc<ApiClient>,
    state: Rc<RefCell<ComposerState>>,
}

impl Composer {
    pub fn new(api: Rc<ApiClient>) -> Self {
        Self {
            api,
            state: Rc::new(RefCell::new(ComposerState::new())),
        }
    }

    pub fn state(&self) -> &Rc<RefCell<ComposerState>> {
        &self.state
    }

    /// Submit the post.  On success the composer is reset and the backend's
    /// message is returned for display.
    pub async fn submit(
        &self,
        content: &str,
        schedule_time: &str,
        action: SubmitAction,
    ) -> Result<String, ApiError> {
        let post = self.state.borrow().build_post(content, schedule_time, action)?;
        let result = self.api.schedule_post(post.into_parts()?).await?;
        let message = result.message.unwrap_or_default();
        if !result.success {
            return Err(ApiError::Rejected(message));
        }
        self.state.borrow_mut().reset();
        Ok(message)
    }

    /// Fill the library picker, honouring its type filter.
    pub async fn load_picker(&self, filter: MediaFilter) -> Result<(), ApiError> {
        self.state.borrow_mut().set_picker_filter(filter);
        let items = self.api.get_library(filter.media_type()).await?;
        self.state.borrow_mut().set_picker_items(items);
        Ok(())
    }

    pub async fn search_picker(&self, query: &str) -> Result<(), ApiError> {
        let query = query.trim();
        if query.is_empty() {
            let filter = self.state.borrow().picker_filter();
            return self.load_picker(filter).await;
        }
        let items = self.api.search_library(query).await?;
        self.state.borrow_mut().set_picker_items(items);
        Ok(())
    }

    pub async fn caption_suggestions(&self) -> Result<Vec<Caption>, ApiError> {
        self.api.get_popular_captions(CAPTION_SUGGESTION_LIMIT).await
    }

    pub async fn track_caption_use(&self, caption_id: &str) {
        if let Err(e) = self.api.track_caption_use(caption_id).await {
            error_log!("Error tracking caption usage: {}", e);
        }
    }

    pub async fn status(&self) -> Result<SystemStatus, ApiError> {
        self.api.get_status().await
    }

    /// Returns `false` when the user declined.
    pub async fn cancel_post(&self, post_id: &str, confirm: &dyn Fn(&str) -> bool) -> Result<bool, ApiError> {
        if !confirm(CONFIRM_CANCEL_POST) {
            return Ok(false);
        }
        self.api.cancel_post(post_id).await?;
        Ok(true)
    }

    /// Returns `false` when the user declined.
    pub async fn delete_post(&self, post_id: &str, confirm: &dyn Fn(&str) -> bool) -> Result<bool, ApiError> {
        if !confirm(CONFIRM_DELETE_POST) {
            return Ok(false);
        }
        self.api.delete_post(post_id).await?;
        Ok(true)
    }

    pub async fn edit_post(&self, post_id: &str, content: &str, schedule_time: &str) -> Result<(), ApiError> {
        let edit = self.state.borrow().edit_payload(content, schedule_time);
        self.api.edit_post(post_id, &edit).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionHandle;
    use crate::models::{MediaType, User};
    use crate::network::mock::MockTransport;
    use crate::network::ApiConfig;
    use crate::storage::MemoryStore;
    use futures::executor::block_on;
    use proptest::prelude::*;

    fn media(id: &str) -> MediaItem {
        MediaItem {
            id: id.into(),
            filename: format!("{}.png", id),
            media_type: MediaType::Image,
            url: format!("/m/{}.png", id),
            thumbnail_url: None,
            file_size: String::new(),
            used_count: 0,
            upload_date: None,
            tags: Vec::new(),
        }
    }

    fn upload(name: &str) -> PendingUpload {
        PendingUpload {
            name: name.into(),
            mime: "image/jpeg".into(),
            value: FormValue::Bytes {
                filename: name.into(),
                mime: "image/jpeg".into(),
                data: vec![0xff, 0xd8],
            },
        }
    }

    fn composer() -> (Composer, Rc<MockTransport>) {
        let session = SessionHandle::load(Rc::new(MemoryStore::new()));
        session.establish("tok".into(), User::default());
        let transport = Rc::new(MockTransport::new());
        let api = ApiClient::new(ApiConfig::default(), session, transport.clone());
        (Composer::new(Rc::new(api)), transport)
    }

    #[test]
    fn model_selection_is_an_ordered_set() {
        let mut state = ComposerState::new();
        state.set_model("b", true);
        state.set_model("a", true);
        state.set_model("b", true);
        assert_eq!(state.models(), ["b", "a"]);
        state.remove_model("b");
        assert_eq!(state.models(), ["a"]);
        state.select_all(&["x", "y", "x"]);
        assert_eq!(state.models(), ["x", "y"]);
        state.deselect_all();
        assert!(state.models().is_empty());
    }

    #[test]
    fn media_count_combines_sources() {
        let mut state = ComposerState::new();
        state.set_picker_items(vec![media("1"), media("2")]);
        assert_eq!(state.toggle_library_item("1"), Some(true));
        assert_eq!(state.toggle_library_item("missing"), None);
        state.set_uploads(vec![upload("a.jpg"), upload("b.jpg")]);
        assert_eq!(state.media_count_label(), "3 files");

        state.remove_upload(0);
        state.remove_upload(9);
        assert_eq!(state.toggle_library_item("1"), Some(false));
        assert_eq!(state.media_count_label(), "1 file");
        assert_eq!(state.uploads()[0].name, "b.jpg");
    }

    #[test]
    fn schedule_without_time_is_rejected() {
        let state = ComposerState::new();
        let err = state.build_post("hi", "  ", SubmitAction::Schedule).unwrap_err();
        assert_eq!(err, ApiError::Validation("Please select a schedule time".into()));
    }

    #[test]
    fn schedule_without_time_issues_no_request() {
        let (composer, transport) = composer();
        assert!(block_on(composer.submit("hi", "", SubmitAction::Schedule)).is_err());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn now_clears_schedule_time() {
        let (composer, transport) = composer();
        transport.respond(200, r#"{"success":true,"message":"Post scheduled"}"#);
        let msg = block_on(composer.submit("hi", "2030-01-01T10:00", SubmitAction::Now)).unwrap();
        assert_eq!(msg, "Post scheduled");
        assert_eq!(transport.requests()[0].form_text("schedule_time"), Some(""));
    }

    #[test]
    fn submission_parts_and_reset() {
        let (composer, transport) = composer();
        {
            let mut state = composer.state().borrow_mut();
            state.set_model("alpha", true);
            state.set_model("beta", true);
            state.set_picker_items(vec![media("7")]);
            state.toggle_library_item("7");
            state.set_uploads(vec![upload("new.jpg")]);
        }
        transport.respond(200, r#"{"success":true,"message":"ok"}"#);
        block_on(composer.submit("Caption", "2030-01-01T10:00", SubmitAction::Schedule)).unwrap();

        let req = &transport.requests()[0];
        assert_eq!(req.url, "/schedule-post");
        assert_eq!(
            req.form_field_names(),
            vec!["content", "models", "schedule_time", "library_media_ids", "media_files"]
        );
        assert_eq!(req.form_text("models"), Some(r#"["alpha","beta"]"#));
        assert_eq!(req.form_text("library_media_ids"), Some(r#"["7"]"#));
        assert_eq!(composer.state().borrow().media_count(), 0);
        assert!(composer.state().borrow().models().is_empty());
    }

    #[test]
    fn failed_submission_keeps_state() {
        let (composer, transport) = composer();
        composer.state().borrow_mut().set_model("alpha", true);
        transport.respond(200, r#"{"success":false,"message":"No models selected"}"#);
        let err = block_on(composer.submit("x", "", SubmitAction::Now)).unwrap_err();
        assert_eq!(err, ApiError::Rejected("No models selected".into()));
        assert_eq!(composer.state().borrow().models(), ["alpha"]);
        assert!(transport.requests()[0].form_field_names().iter().all(|n| *n != "library_media_ids"));
    }

    #[test]
    fn queue_actions_respect_confirmation() {
        let (composer, transport) = composer();
        assert!(!block_on(composer.cancel_post("3", &|_: &str| false)).unwrap());
        assert!(!block_on(composer.delete_post("3", &|_: &str| false)).unwrap());
        assert!(transport.requests().is_empty());

        assert!(block_on(composer.cancel_post("3", &|_: &str| true)).unwrap());
        assert!(block_on(composer.delete_post("3", &|_: &str| true)).unwrap());
        let requests = transport.requests();
        assert_eq!(requests[0].url, "/api/queue/3/cancel");
        assert_eq!(requests[1].url, "/api/queue/3");
    }

    #[test]
    fn edit_sends_full_replacement() {
        let (composer, transport) = composer();
        composer.state().borrow_mut().set_model("alpha", true);
        block_on(composer.edit_post("4", "new text", "")).unwrap();
        let req = &transport.requests()[0];
        assert_eq!(req.url, "/api/queue/4/edit");
        assert_eq!(
            req.json_body(),
            Some(r#"{"content":"new text","models":["alpha"],"schedule_time":null}"#)
        );
    }

    #[test]
    fn picker_filter_and_blank_search() {
        let (composer, transport) = composer();
        transport.respond(200, "[]");
        transport.respond(200, "[]");
        block_on(composer.load_picker(MediaFilter::parse("video"))).unwrap();
        block_on(composer.search_picker(" ")).unwrap();
        assert_eq!(
            transport.urls(),
            vec!["/api/library?media_type=video", "/api/library?media_type=video"]
        );
    }

    #[test]
    fn insert_replaces_selection_and_moves_caret() {
        assert_eq!(insert_at_cursor("Hello world", 6, 11, "there"), ("Hello there".into(), 11));
        assert_eq!(insert_at_cursor("", 0, 0, "hi"), ("hi".into(), 2));
        // "é" is one UTF-16 unit, "😀" two.
        assert_eq!(insert_at_cursor("é😀x", 3, 3, "!"), ("é😀!x".into(), 4));
        assert_eq!(insert_at_cursor("abc", 99, 99, "d"), ("abcd".into(), 100));
    }

    #[test]
    fn model_search_is_case_insensitive() {
        assert!(model_matches("Luna Star", "luna"));
        assert!(model_matches("Luna Star", ""));
        assert!(!model_matches("Luna Star", "sol"));
    }

    #[test]
    fn history_hash_selects_history_tab() {
        assert_eq!(QueueTab::from_hash("#history"), QueueTab::History);
        assert_eq!(QueueTab::from_hash(""), QueueTab::Queue);
    }

    proptest! {
        #[test]
        fn now_always_clears_time(time in ".{0,20}", content in ".{0,20}") {
            let post = ComposerState::new().build_post(&content, &time, SubmitAction::Now).unwrap();
            prop_assert_eq!(post.schedule_time, "");
        }

        #[test]
        fn schedule_requires_non_blank_time(time in "[ \t]{0,4}|[0-9T:-]{1,16}") {
            let result = ComposerState::new().build_post("x", &time, SubmitAction::Schedule);
            prop_assert_eq!(result.is_ok(), !time.trim().is_empty());
        }
    }
}
