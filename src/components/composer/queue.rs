//! Queue and history panel: cancel, delete, edit and tab switching.
//! Every successful mutation reloads the page, which re-renders the queue
//! server-side.

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use super::{with_view, ComposerView};
use crate::components::modal;
use crate::dom_utils;
use crate::error::ApiError;
use crate::state::composer::QueueTab;
use crate::toast;

const EDIT_MODAL_ID: &str = "editModal";

#[wasm_bindgen(js_name = cancelPost)]
pub fn cancel_post(post_id: String) {
    with_view(|view| {
        let composer = view.composer.clone();
        spawn_local(async move {
            let confirm = |message: &str| dom_utils::confirm(message);
            report(
                composer.cancel_post(&post_id, &confirm).await,
                "Post cancelled successfully",
                "Failed to cancel post",
            );
        });
    });
}

#[wasm_bindgen(js_name = deletePost)]
pub fn delete_post(post_id: String) {
    with_view(|view| {
        let composer = view.composer.clone();
        spawn_local(async move {
            let confirm = |message: &str| dom_utils::confirm(message);
            report(
                composer.delete_post(&post_id, &confirm).await,
                "Post deleted successfully",
                "Failed to delete post",
            );
        });
    });
}

fn report(result: Result<bool, ApiError>, success: &str, failure: &str) {
    match result {
        Ok(true) => {
            toast::success(success);
            dom_utils::reload();
        }
        Ok(false) => {}
        Err(e @ ApiError::Http { .. }) => {
            error_log!("{}: {}", failure, e);
            toast::error(failure);
        }
        Err(e) => toast::error(&format!("Error: {}", e)),
    }
}

/// Open the edit dialog pre-filled from the post card's `.post-text`.
#[wasm_bindgen(js_name = editPost)]
pub fn edit_post(post_id: &str) {
    let text = dom_utils::query_all("[data-post-id]")
        .into_iter()
        .find(|card| card.get_attribute("data-post-id").as_deref() == Some(post_id))
        .and_then(|card| card.query_selector(".post-text").ok().flatten())
        .and_then(|el| el.text_content())
        .unwrap_or_default();

    if modal::open_by_id(EDIT_MODAL_ID).is_none() {
        return;
    }
    dom_utils::set_value_of("editPostId", post_id);
    dom_utils::set_value_of("editContent", text.trim());
}

#[wasm_bindgen(js_name = closeEditModal)]
pub fn close_edit_modal() {
    modal::close_by_id(EDIT_MODAL_ID);
}

#[wasm_bindgen(js_name = switchTab)]
pub fn switch_tab(tab: &str) {
    show_tab(if tab == "history" {
        QueueTab::History
    } else {
        QueueTab::Queue
    });
}

fn show_tab(tab: QueueTab) {
    let (Some(queue), Some(history)) = (dom_utils::by_id("queueTab"), dom_utils::by_id("historyTab")) else {
        return;
    };
    let on_history = tab == QueueTab::History;
    dom_utils::toggle_class(&queue, "active", !on_history);
    dom_utils::toggle_class(&history, "active", on_history);

    let buttons = dom_utils::query_all(".tab-btn");
    if let Some(first) = buttons.first() {
        dom_utils::toggle_class(first, "active", !on_history);
    }
    if let Some(second) = buttons.get(1) {
        dom_utils::toggle_class(second, "active", on_history);
    }
}

pub(super) fn wire(view: &ComposerView) -> Result<(), JsValue> {
    let composer = view.composer.clone();
    dom_utils::on_id("editForm", "submit", move |event| {
        event.prevent_default();
        let post_id = dom_utils::value_of("editPostId");
        let content = dom_utils::value_of("editContent");
        let schedule_time = dom_utils::value_of("editScheduleTime");
        let composer = composer.clone();
        spawn_local(async move {
            match composer.edit_post(&post_id, &content, &schedule_time).await {
                Ok(()) => {
                    toast::success("Post updated successfully");
                    dom_utils::reload();
                }
                Err(e @ ApiError::Http { .. }) => {
                    error_log!("Failed to update post: {}", e);
                    toast::error("Failed to update post");
                }
                Err(e) => toast::error(&format!("Error: {}", e)),
            }
        });
    })?;

    for (index, button) in dom_utils::query_all(".tab-btn").into_iter().enumerate() {
        let tab = if index == 0 { QueueTab::Queue } else { QueueTab::History };
        dom_utils::on(&button, "click", move |_| show_tab(tab))?;
    }

    let initial = QueueTab::from_hash(&dom_utils::hash());
    if initial == QueueTab::History {
        show_tab(initial);
    }
    Ok(())
}
