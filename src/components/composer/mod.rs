//! Post composer on the dashboard page (`#postForm`).
//!
//! Server-rendered markup calls a handful of the functions below from inline
//! handlers, so the mounted view is kept in a thread-local.

mod media;
mod queue;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Interval;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlTextAreaElement};

use crate::components::system_status;
use crate::constants::{STATUS_POLL_MS, SUGGESTION_PILL_CHARS};
use crate::dom_utils;
use crate::error::ApiError;
use crate::models::Caption;
use crate::network::ApiClient;
use crate::state::composer::{insert_at_cursor, model_matches, Composer, SubmitAction};
use crate::toast;
use crate::utils::{escape_html, truncate_chars};

pub use queue::{cancel_post, close_edit_modal, delete_post, edit_post, switch_tab};
pub use media::{
    add_selected_to_post, close_library_modal, open_file_upload, open_library_for_post,
    remove_library_media, remove_uploaded_file, toggle_library_item,
};

thread_local! {
    static MOUNTED: RefCell<Option<ComposerView>> = RefCell::new(None);
}

#[derive(Clone)]
pub(crate) struct ComposerView {
    composer: Composer,
    suggestions: Rc<RefCell<Vec<Caption>>>,
    // Bumped on every preview render; late FileReader results from an older
    // render are discarded.
    preview_generation: Rc<Cell<u32>>,
    pending_action: Rc<Cell<Option<SubmitAction>>>,
}

pub(crate) fn with_view(f: impl FnOnce(&ComposerView)) {
    if let Some(view) = MOUNTED.with(|m| m.borrow().clone()) {
        f(&view);
    }
}

pub fn mount(api: Rc<ApiClient>) -> Result<(), JsValue> {
    let view = ComposerView {
        composer: Composer::new(api),
        suggestions: Rc::new(RefCell::new(Vec::new())),
        preview_generation: Rc::new(Cell::new(0)),
        pending_action: Rc::new(Cell::new(None)),
    };

    view.wire_model_selector()?;
    view.wire_form()?;
    view.wire_media()?;
    view.wire_picker()?;
    view.wire_suggestions()?;
    queue::wire(&view)?;

    MOUNTED.with(|m| *m.borrow_mut() = Some(view.clone()));

    view.load_suggestions();
    view.refresh_status();
    let poller = view.clone();
    Interval::new(STATUS_POLL_MS, move || poller.refresh_status()).forget();
    Ok(())
}

// ---------------------------------------------------------------------------
// Exports for inline handlers
// ---------------------------------------------------------------------------

#[wasm_bindgen(js_name = submitPost)]
pub fn submit_post(event: Event, action: &str) {
    event.prevent_default();
    let action = SubmitAction::parse(action);
    with_view(|view| view.submit(Some(action)));
}

#[wasm_bindgen(js_name = selectAllModels)]
pub fn select_all_models() {
    with_view(|view| view.select_all_models());
}

#[wasm_bindgen(js_name = deselectAllModels)]
pub fn deselect_all_models() {
    with_view(|view| view.deselect_all_models());
}

#[wasm_bindgen(js_name = removeModel)]
pub fn remove_model(name: &str) {
    with_view(|view| view.remove_model(name));
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

fn model_checkboxes() -> Vec<HtmlInputElement> {
    dom_utils::query_all(".model-checkbox")
        .into_iter()
        .filter_map(|el| el.dyn_into::<HtmlInputElement>().ok())
        .collect()
}

impl ComposerView {
    fn wire_model_selector(&self) -> Result<(), JsValue> {
        let (Some(search), Some(dropdown)) =
            (dom_utils::by_id("modelSearch"), dom_utils::by_id("modelDropdown"))
        else {
            return Ok(());
        };

        let target = dropdown.clone();
        dom_utils::on(&search, "click", move |event| {
            event.stop_propagation();
            let open = target
                .dyn_ref::<HtmlElement>()
                .and_then(|el| el.style().get_property_value("display").ok())
                .map(|d| d == "block")
                .unwrap_or(false);
            dom_utils::set_display(&target, if open { "none" } else { "block" });
        })?;

        dom_utils::on(&search, "input", |_| {
            let term = dom_utils::value_of("modelSearch");
            let Some(list) = dom_utils::by_id("modelList") else {
                return;
            };
            for item in dom_utils::query_all_in(&list, ".model-item") {
                let name = item.get_attribute("data-model-name").unwrap_or_default();
                dom_utils::set_display(&item, if model_matches(&name, &term) { "flex" } else { "none" });
            }
        })?;

        for checkbox in model_checkboxes() {
            let view = self.clone();
            let input = checkbox.clone();
            dom_utils::on(&checkbox, "change", move |_| {
                view.composer
                    .state()
                    .borrow_mut()
                    .set_model(&input.value(), input.checked());
                view.render_models();
            })?;
        }

        let document = dom_utils::document()?;
        dom_utils::on(&document, "click", move |event| {
            if dom_utils::closest_target(&event, ".model-selector").is_none() {
                dom_utils::set_display(&dropdown, "none");
            }
        })?;

        let view = self.clone();
        dom_utils::on_id("selectedModels", "click", move |event| {
            if let Some(name) = dom_utils::closest_target(&event, ".remove-model")
                .and_then(|el| el.get_attribute("data-model"))
            {
                view.remove_model(&name);
            }
        })
    }

    fn render_models(&self) {
        let Some(container) = dom_utils::by_id("selectedModels") else {
            return;
        };
        let state = self.composer.state().borrow();
        let html: String = state
            .models()
            .iter()
            .map(|m| {
                let name = escape_html(m);
                format!(
                    r#"<span class="model-pill">{name}<span class="remove-model" data-model="{name}">×</span></span>"#
                )
            })
            .collect();
        container.set_inner_html(&html);
    }

    fn remove_model(&self, name: &str) {
        self.composer.state().borrow_mut().remove_model(name);
        for checkbox in model_checkboxes() {
            if checkbox.value() == name {
                checkbox.set_checked(false);
            }
        }
        self.render_models();
    }

    fn select_all_models(&self) {
        let checkboxes = model_checkboxes();
        let names: Vec<String> = checkboxes.iter().map(|c| c.value()).collect();
        for checkbox in &checkboxes {
            checkbox.set_checked(true);
        }
        self.composer.state().borrow_mut().select_all(&names);
        self.render_models();
    }

    fn deselect_all_models(&self) {
        for checkbox in model_checkboxes() {
            checkbox.set_checked(false);
        }
        self.composer.state().borrow_mut().deselect_all();
        self.render_models();
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    fn wire_form(&self) -> Result<(), JsValue> {
        let Some(form) = dom_utils::by_id("postForm") else {
            return Ok(());
        };

        // Buttons carrying `data-action="now|schedule"` decide how the next
        // submit is treated.
        for button in dom_utils::query_all_in(&form, "[data-action]") {
            let pending = self.pending_action.clone();
            let action = SubmitAction::parse(&button.get_attribute("data-action").unwrap_or_default());
            dom_utils::on(&button, "click", move |_| pending.set(Some(action)))?;
        }

        let view = self.clone();
        dom_utils::on(&form, "submit", move |event| {
            event.prevent_default();
            view.submit(view.pending_action.take());
        })
    }

    /// Without an explicit action the schedule field decides: empty posts
    /// now, filled schedules.
    fn submit(&self, action: Option<SubmitAction>) {
        let schedule_time = dom_utils::value_of("schedule_time");
        let action = action.unwrap_or(if schedule_time.trim().is_empty() {
            SubmitAction::Now
        } else {
            SubmitAction::Schedule
        });
        if action == SubmitAction::Now {
            dom_utils::set_value_of("schedule_time", "");
        }
        let content = dom_utils::value_of("content");

        let view = self.clone();
        spawn_local(async move {
            match view.composer.submit(&content, &schedule_time, action).await {
                Ok(message) => {
                    toast::success(&message);
                    view.reset_form();
                    view.refresh_status();
                }
                Err(ApiError::Validation(message)) => {
                    toast::error(&message);
                    dom_utils::focus("schedule_time");
                }
                Err(ApiError::Rejected(message)) => toast::error(&message),
                Err(e) => {
                    error_log!("Error scheduling post: {}", e);
                    toast::error(&format!("Error: {}", e));
                }
            }
        });
    }

    fn reset_form(&self) {
        if let Some(form) = dom_utils::by_id_as::<HtmlFormElement>("postForm") {
            form.reset();
        }
        for checkbox in model_checkboxes() {
            checkbox.set_checked(false);
        }
        self.render_models();
        self.render_preview();
    }

    // -----------------------------------------------------------------------
    // Caption suggestions
    // -----------------------------------------------------------------------

    fn wire_suggestions(&self) -> Result<(), JsValue> {
        let view = self.clone();
        dom_utils::on_id("suggestionPills", "click", move |event| {
            let Some(id) = dom_utils::closest_target(&event, ".caption-pill")
                .and_then(|el| el.get_attribute("data-caption-id"))
            else {
                return;
            };
            let caption = view.suggestions.borrow().iter().find(|c| c.id == id).cloned();
            if let Some(caption) = caption {
                view.insert_caption(&caption);
            }
        })
    }

    fn load_suggestions(&self) {
        if dom_utils::by_id("suggestionPills").is_none() {
            return;
        }
        let view = self.clone();
        spawn_local(async move {
            match view.composer.caption_suggestions().await {
                Ok(captions) => {
                    debug_log!("Loaded {} caption suggestions", captions.len());
                    *view.suggestions.borrow_mut() = captions;
                    view.render_suggestions();
                }
                Err(e) => error_log!("Error loading caption suggestions: {}", e),
            }
        });
    }

    fn render_suggestions(&self) {
        let Some(container) = dom_utils::by_id("suggestionPills") else {
            return;
        };
        ensure_suggestion_styles();
        let captions = self.suggestions.borrow();
        if captions.is_empty() {
            container.set_inner_html(
                r#"<small class="no-suggestions">No captions yet. <a href="/captions-compact">Add some!</a></small>"#,
            );
            return;
        }
        let html: String = captions
            .iter()
            .map(|c| {
                format!(
                    r#"<span class="caption-pill" data-caption-id="{}" title="{}">{}</span>"#,
                    escape_html(&c.id),
                    escape_html(&c.text),
                    escape_html(&truncate_chars(&c.text, SUGGESTION_PILL_CHARS)),
                )
            })
            .collect();
        container.set_inner_html(&html);
    }

    fn insert_caption(&self, caption: &Caption) {
        let Some(area) = dom_utils::by_id_as::<HtmlTextAreaElement>("content") else {
            return;
        };
        let value = area.value();
        let start = area.selection_start().ok().flatten();
        let end = area.selection_end().ok().flatten();
        match (start, end) {
            (Some(start), Some(end)) => {
                let (next, caret) = insert_at_cursor(&value, start, end, &caption.text);
                area.set_value(&next);
                let _ = area.set_selection_range(caret, caret);
            }
            _ => {
                let sep = if value.is_empty() { "" } else { " " };
                area.set_value(&format!("{}{}{}", value, sep, caption.text));
            }
        }
        let _ = area.focus();

        let composer = self.composer.clone();
        let id = caption.id.clone();
        spawn_local(async move { composer.track_caption_use(&id).await });
        toast::success("Caption added to post");
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    fn refresh_status(&self) {
        let composer = self.composer.clone();
        spawn_local(async move {
            match composer.status().await {
                Ok(status) => {
                    dom_utils::set_text_by_id("queueCount", &format!("{} scheduled posts", status.queue_count));
                    dom_utils::set_text_by_id(
                        "historyCount",
                        &format!("{} completed posts", status.completed_count),
                    );
                    system_status::render(status.online);
                }
                Err(e) => error_log!("Error updating stats: {}", e),
            }
        });
    }
}

fn ensure_suggestion_styles() {
    let Ok(document) = dom_utils::document() else {
        return;
    };
    if document.get_element_by_id("caption-suggestion-styles").is_some() {
        return;
    }
    let Ok(style) = document.create_element("style") else {
        return;
    };
    style.set_id("caption-suggestion-styles");
    style.set_text_content(Some(
        "
.suggestion-pills-container{display:flex;flex-wrap:wrap;gap:6px}
.caption-pill{background:var(--accent-gradient,linear-gradient(135deg,#FFDEE2 0%,#FFE8EC 100%));color:#0a0a0f;padding:4px 10px;border-radius:12px;font-size:.75rem;font-weight:600;cursor:pointer;white-space:nowrap;max-width:200px;overflow:hidden;text-overflow:ellipsis;transition:all .2s ease}
.caption-pill:hover{transform:translateY(-1px);background:#FFC4CC}
.no-suggestions{color:#999;font-size:.7rem}
",
    ));
    if let Some(head) = document.head() {
        let _ = head.append_child(&style);
    }
}
