//! Caption library views.
//!
//! The dashboard sidebar panel (`Compact`) and the standalone library page
//! (`Expanded`) drive the same [`CaptionLibrary`]; only markup and feedback
//! differ.

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{DragEvent, File, HtmlInputElement, KeyboardEvent};

use gloo_timers::callback::Timeout;

use crate::constants::{
    ALL_CATEGORIES, ALL_CATEGORIES_LABEL, COPY_TOAST_MS, DEFAULT_CAPTION_CATEGORY,
    SEARCH_DEBOUNCE_MS, UPLOAD_STATUS_HIDE_MS,
};
use crate::debounce::Debouncer;
use crate::dom_utils;
use crate::error::ApiError;
use crate::models::Caption;
use crate::network::{ApiClient, FormValue};
use crate::state::captions::{CaptionLibrary, CaptionLibraryState, ReplaceOutcome};
use crate::toast;
use crate::utils::{escape_html, format_short_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionLayout {
    /// `#captionGrid` panel with pill filters and an inline add box.
    Compact,
    /// `#messagesGrid` page with the drag-and-drop upload zone.
    Expanded,
}

impl CaptionLayout {
    fn grid_id(&self) -> &'static str {
        match self {
            CaptionLayout::Compact => "captionGrid",
            CaptionLayout::Expanded => "messagesGrid",
        }
    }

    fn search_id(&self) -> &'static str {
        match self {
            CaptionLayout::Compact => "searchInput",
            CaptionLayout::Expanded => "captionSearch",
        }
    }

    fn loads_stats(&self) -> bool {
        matches!(self, CaptionLayout::Expanded)
    }
}

#[derive(Debug, Clone, Copy)]
enum UploadStatus {
    Loading,
    Success,
    Error,
}

impl UploadStatus {
    fn class(&self) -> &'static str {
        match self {
            UploadStatus::Loading => "loading",
            UploadStatus::Success => "success",
            UploadStatus::Error => "error",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            UploadStatus::Loading => "⏳",
            UploadStatus::Success => "✓",
            UploadStatus::Error => "✕",
        }
    }
}

#[derive(Clone)]
struct CaptionLibraryView {
    library: CaptionLibrary,
    layout: CaptionLayout,
}

/// Mount the caption library onto the current page and load captions.
pub fn mount(api: Rc<ApiClient>, layout: CaptionLayout) -> Result<(), JsValue> {
    let view = CaptionLibraryView {
        library: CaptionLibrary::new(api),
        layout,
    };
    view.wire_common()?;
    match layout {
        CaptionLayout::Compact => view.wire_compact()?,
        CaptionLayout::Expanded => view.wire_expanded()?,
    }
    view.reload();
    Ok(())
}

impl CaptionLibraryView {
    fn reload(&self) {
        let view = self.clone();
        spawn_local(async move {
            if let Err(e) = view.library.load().await {
                error_log!("Error loading captions: {}", e);
            }
            view.render();
            if view.layout.loads_stats() {
                if let Err(e) = view.library.load_stats().await {
                    error_log!("Error loading stats: {}", e);
                }
            }
        });
    }

    fn render(&self) {
        let state = self.library.state().borrow();
        match self.layout {
            CaptionLayout::Compact => render_compact(&state),
            CaptionLayout::Expanded => render_expanded(&state),
        }
    }

    // -----------------------------------------------------------------
    // Wiring
    // -----------------------------------------------------------------

    fn wire_common(&self) -> Result<(), JsValue> {
        let debouncer = Debouncer::new(SEARCH_DEBOUNCE_MS);
        let search_id = self.layout.search_id();
        let view = self.clone();
        dom_utils::on_id(search_id, "input", move |_| {
            let view = view.clone();
            debouncer.call(move || {
                view.library
                    .state()
                    .borrow_mut()
                    .set_search(&dom_utils::value_of(search_id));
                view.render();
            });
        })?;

        let view = self.clone();
        dom_utils::on_id("excelUpload", "change", move |event| {
            let file = event
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));
            if let Some(file) = file {
                view.replace_from(file);
            }
        })?;

        let view = self.clone();
        let selector = match self.layout {
            CaptionLayout::Compact => ".caption-card-compact",
            CaptionLayout::Expanded => ".copy-btn",
        };
        dom_utils::on_id(self.layout.grid_id(), "click", move |event| {
            if let Some(id) = dom_utils::closest_target(&event, selector)
                .and_then(|el| el.get_attribute("data-id"))
            {
                view.copy(id);
            }
        })
    }

    fn wire_compact(&self) -> Result<(), JsValue> {
        for pill in dom_utils::query_all(".pill-mini") {
            let view = self.clone();
            let target = pill.clone();
            dom_utils::on(&pill, "click", move |_| {
                for other in dom_utils::query_all(".pill-mini") {
                    dom_utils::toggle_class(&other, "active", false);
                }
                dom_utils::toggle_class(&target, "active", true);
                let category = target.get_attribute("data-category").unwrap_or_default();
                view.library.state().borrow_mut().set_category(&category);
                view.render();
            })?;
        }

        let view = self.clone();
        dom_utils::on_id("addCaptionBtn", "click", move |_| view.add_caption())?;

        let view = self.clone();
        dom_utils::on_id("newCaptionInput", "keypress", move |event| {
            let enter = event
                .dyn_ref::<KeyboardEvent>()
                .map(|k| k.key() == "Enter")
                .unwrap_or(false);
            if enter {
                view.add_caption();
            }
        })?;

        let document = dom_utils::document()?;
        dom_utils::on(&document, "keydown", |event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if !(key.ctrl_key() || key.meta_key()) {
                return;
            }
            let target = match key.key().as_str() {
                "k" => "searchInput",
                "n" => "newCaptionInput",
                _ => return,
            };
            event.prevent_default();
            dom_utils::focus(target);
        })
    }

    fn wire_expanded(&self) -> Result<(), JsValue> {
        if let Some(zone) = dom_utils::by_id("uploadZone") {
            dom_utils::on(&zone, "click", |_| {
                if let Some(input) = dom_utils::by_id_as::<HtmlInputElement>("excelUpload") {
                    input.click();
                }
            })?;

            let target = zone.clone();
            dom_utils::on(&zone, "dragover", move |event| {
                event.prevent_default();
                dom_utils::toggle_class(&target, "dragging", true);
            })?;

            let target = zone.clone();
            dom_utils::on(&zone, "dragleave", move |_| {
                dom_utils::toggle_class(&target, "dragging", false);
            })?;

            let target = zone.clone();
            let view = self.clone();
            dom_utils::on(&zone, "drop", move |event| {
                event.prevent_default();
                dom_utils::toggle_class(&target, "dragging", false);
                let file = event
                    .dyn_ref::<DragEvent>()
                    .and_then(|e| e.data_transfer())
                    .and_then(|dt| dt.files())
                    .and_then(|files| files.get(0));
                match file {
                    Some(file) => view.replace_from(file),
                    None => show_status(UploadStatus::Error, "Please upload an Excel file (.xlsx or .xls)"),
                }
            })?;
        }

        let view = self.clone();
        dom_utils::on_id("categoryFilters", "click", move |event| {
            let Some(button) = dom_utils::closest_target(&event, ".filter-btn") else {
                return;
            };
            let category = button.get_attribute("data-category").unwrap_or_default();
            view.library.state().borrow_mut().set_category(&category);
            view.render();
        })
    }

    // -----------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------

    fn copy(&self, id: String) {
        let text = match self.library.state().borrow().find(&id) {
            Some(caption) => caption.text.clone(),
            None => return,
        };
        let view = self.clone();
        spawn_local(async move {
            if let Err(e) = dom_utils::copy_text(&text).await {
                error_log!("Error copying caption: {:?}", e);
                toast::error("Could not copy caption");
                return;
            }
            view.library.state().borrow_mut().record_use(&id);
            view.render();
            match view.layout {
                CaptionLayout::Compact => toast::success("Caption copied!"),
                CaptionLayout::Expanded => toast::flash("copyToast", COPY_TOAST_MS),
            }
            view.library.track_use(&id).await;
        });
    }

    fn replace_from(&self, file: File) {
        let view = self.clone();
        let expanded = self.layout == CaptionLayout::Expanded;
        spawn_local(async move {
            let name = file.name();
            let mime = file.type_();
            let confirm = |message: &str| {
                let accepted = dom_utils::confirm(message);
                if accepted && expanded {
                    show_status(UploadStatus::Loading, "Replacing all captions...");
                }
                accepted
            };
            let outcome = view
                .library
                .replace_all(FormValue::File(file), &name, &mime, &confirm, expanded)
                .await;

            match outcome {
                Ok(ReplaceOutcome::Cancelled) => {}
                Ok(ReplaceOutcome::Replaced { message, count }) => {
                    debug_log!("Caption library replaced: {} captions", count);
                    if expanded {
                        show_status(UploadStatus::Success, &message);
                    } else {
                        toast::success(&format!("Replaced all captions. Added {} captions", count));
                    }
                    view.render();
                }
                Err(e) => {
                    error_log!("Upload error: {}", e);
                    let message = match &e {
                        ApiError::Validation(_) | ApiError::Rejected(_) => e.to_string(),
                        _ if expanded => "Error uploading file. Please try again.".to_string(),
                        _ => "Upload error".to_string(),
                    };
                    if expanded {
                        show_status(UploadStatus::Error, &message);
                    } else {
                        toast::error(&message);
                    }
                }
            }
            dom_utils::set_value_of("excelUpload", "");
        });
    }

    fn add_caption(&self) {
        let text = dom_utils::value_of("newCaptionInput");
        let category = dom_utils::value_of("categorySelect");
        if text.trim().is_empty() {
            return;
        }
        let view = self.clone();
        spawn_local(async move {
            match view.library.add_single(&text, &category).await {
                Ok(()) => {
                    toast::success("Caption added");
                    dom_utils::set_value_of("newCaptionInput", "");
                    view.render();
                }
                Err(ApiError::Validation(_)) => {}
                Err(e) => {
                    error_log!("Error adding caption: {}", e);
                    toast::error("Failed to add caption");
                }
            }
        });
    }
}

// ---------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------

fn render_compact(state: &CaptionLibraryState) {
    if let Some(grid) = dom_utils::by_id("captionGrid") {
        let html: String = state.visible().into_iter().map(compact_card_html).collect();
        grid.set_inner_html(&html);
    }
    dom_utils::set_text_by_id("captionCount", &state.total().to_string());
}

fn render_expanded(state: &CaptionLibraryState) {
    render_category_filters(state);
    dom_utils::set_text_by_id("captionCount", &state.count_label());

    let Some(grid) = dom_utils::by_id("messagesGrid") else {
        return;
    };
    let visible = state.visible();
    if visible.is_empty() {
        grid.set_inner_html(EMPTY_STATE_HTML);
    } else {
        let html: String = visible.into_iter().map(message_card_html).collect();
        grid.set_inner_html(&html);
    }
}

fn render_category_filters(state: &CaptionLibraryState) {
    let Some(container) = dom_utils::by_id("categoryFilters") else {
        return;
    };
    let active = state.category();
    let html: String = state
        .categories()
        .iter()
        .map(|category| {
            let label = if category == ALL_CATEGORIES {
                ALL_CATEGORIES_LABEL
            } else {
                category.as_str()
            };
            format!(
                r#"<button class="filter-btn{}" data-category="{}">{}</button>"#,
                if category == active { " active" } else { "" },
                escape_html(label),
                escape_html(label),
            )
        })
        .collect();
    container.set_inner_html(&html);
}

fn compact_card_html(caption: &Caption) -> String {
    format!(
        r#"<div class="caption-card-compact" data-id="{id}"><div class="caption-text">{text}</div><div class="caption-meta"><span class="caption-category">{category}</span><span class="caption-usage">{uses} uses</span></div></div>"#,
        id = escape_html(&caption.id),
        text = escape_html(&caption.text),
        category = escape_html(caption.category.as_deref().unwrap_or(DEFAULT_CAPTION_CATEGORY)),
        uses = caption.usage_count,
    )
}

fn message_card_html(caption: &Caption) -> String {
    let usage = if caption.usage_count > 0 {
        format!(
            r#"<span class="usage-badge" title="Used {n} time(s)">{n}x</span>"#,
            n = caption.usage_count
        )
    } else {
        String::new()
    };
    let source = caption
        .source
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| format!(r#"<span class="source-label" title="Source: {}">📄</span>"#, escape_html(s)))
        .unwrap_or_default();
    let date = format_short_date(caption.created_at.as_deref());
    let date = if date.is_empty() {
        String::new()
    } else {
        format!(r#"<span class="date-label">{}</span>"#, date)
    };

    format!(
        r#"<div class="message-card" data-caption-id="{id}"><div class="card-header"><div class="message-category">{category}</div>{usage}</div><p class="message-text">{text}</p><div class="card-footer"><button class="copy-btn" data-id="{id}">Copy</button>{source}{date}</div></div>"#,
        id = escape_html(&caption.id),
        category = escape_html(caption.category.as_deref().unwrap_or(DEFAULT_CAPTION_CATEGORY)),
        text = escape_html(&caption.text),
    )
}

const EMPTY_STATE_HTML: &str = r#"<div class="empty-state"><p>No captions found</p><p class="empty-subtext">Try adjusting your filters or search term</p></div>"#;

fn show_status(status: UploadStatus, message: &str) {
    let Some(banner) = dom_utils::by_id("uploadStatus") else {
        return;
    };
    dom_utils::set_display(&banner, "block");
    banner.set_class_name(&format!("upload-status {}", status.class()));
    if let Ok(Some(icon)) = banner.query_selector(".status-icon") {
        icon.set_text_content(Some(status.icon()));
    }
    if let Ok(Some(text)) = banner.query_selector(".status-message") {
        text.set_text_content(Some(message));
    }
    if !matches!(status, UploadStatus::Loading) {
        Timeout::new(UPLOAD_STATUS_HIDE_MS, move || dom_utils::set_display(&banner, "none")).forget();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(usage: u32, source: Option<&str>) -> Caption {
        Caption {
            id: "c<1>".into(),
            text: "Sun & sand".into(),
            category: None,
            usage_count: usage,
            created_at: None,
            source: source.map(str::to_string),
        }
    }

    #[test]
    fn compact_card_escapes_and_defaults_category() {
        let html = compact_card_html(&caption(3, None));
        assert!(html.contains(r#"data-id="c&lt;1&gt;""#));
        assert!(html.contains("Sun &amp; sand"));
        assert!(html.contains(">General<"));
        assert!(html.contains("3 uses"));
    }

    #[test]
    fn message_card_shows_usage_badge_only_when_used() {
        let unused = message_card_html(&caption(0, None));
        assert!(!unused.contains("usage-badge"));
        assert!(!unused.contains("source-label"));

        let used = message_card_html(&caption(4, Some("import.xlsx")));
        assert!(used.contains(">4x<"));
        assert!(used.contains(r#"title="Source: import.xlsx""#));
        assert!(used.contains(r#"class="copy-btn" data-id="c&lt;1&gt;""#));
    }
}
