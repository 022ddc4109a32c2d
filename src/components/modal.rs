//! Shared modal helper used by the library preview/upload dialogs and the
//! composer's edit and library-picker modals.

use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use crate::dom_utils;

/// Ensure a `<div id="{id}" class="{class}">` backdrop exists and return it
/// together with its `.modal-content` child (created if missing).
///
/// Returns `(backdrop, content)`.
pub fn ensure_modal(document: &Document, id: &str, class: &str) -> Result<(Element, Element), JsValue> {
    let backdrop = if let Some(el) = document.get_element_by_id(id) {
        el
    } else {
        let el = document.create_element("div")?;
        el.set_id(id);
        el.set_class_name(class);
        dom_utils::hide(&el);
        document
            .body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&el)?;
        el
    };

    let content = if let Some(el) = backdrop.query_selector(".modal-content")? {
        el
    } else {
        let el = document.create_element("div")?;
        el.set_class_name("modal-content");
        backdrop.append_child(&el)?;
        el
    };

    Ok((backdrop, content))
}

pub fn show(modal_backdrop: &Element) {
    dom_utils::show(modal_backdrop);
}

pub fn hide(modal_backdrop: &Element) {
    dom_utils::hide(modal_backdrop);
}

/// Open a modal that ships with the page markup (inline `display` styling).
pub fn open_by_id(id: &str) -> Option<Element> {
    let el = dom_utils::by_id(id)?;
    dom_utils::set_display(&el, "block");
    Some(el)
}

pub fn close_by_id(id: &str) {
    if let Some(el) = dom_utils::by_id(id) {
        dom_utils::set_display(&el, "none");
    }
}

/// Remove a generated modal when its `.modal-close` button or the backdrop
/// itself is clicked.
pub fn dismiss_on_close(backdrop: &Element) -> Result<(), JsValue> {
    let target = backdrop.clone();
    dom_utils::on(backdrop, "click", move |event| {
        let on_backdrop = event
            .target()
            .map(|t| JsValue::from(t) == JsValue::from(target.clone()))
            .unwrap_or(false);
        if on_backdrop || dom_utils::closest_target(&event, ".modal-close").is_some() {
            target.remove();
        }
    })
}
