//! dom_utils.rs – thin helper layer for repetitive DOM operations.
//!
//! The dashboard pages are server-rendered; components look their elements up
//! by id and bail out quietly when a page does not carry them.  These
//! wrappers keep the `Option`/`JsCast` noise out of component code.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, EventTarget, HtmlElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement, Window,
};

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global `window` exists"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("should have a document on window"))
}

pub fn by_id(id: &str) -> Option<Element> {
    web_sys::window()?.document()?.get_element_by_id(id)
}

/// Element by id, cast to a concrete type.  `None` when missing or of a
/// different type.
pub fn by_id_as<T: JsCast>(id: &str) -> Option<T> {
    by_id(id)?.dyn_into::<T>().ok()
}

pub fn query(selector: &str) -> Option<Element> {
    web_sys::window()?
        .document()?
        .query_selector(selector)
        .ok()
        .flatten()
}

/// All elements under `root` matching `selector`, in document order.
pub fn query_all_in(root: &Element, selector: &str) -> Vec<Element> {
    let mut out = Vec::new();
    if let Ok(list) = root.query_selector_all(selector) {
        for i in 0..list.length() {
            if let Some(el) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                out.push(el);
            }
        }
    }
    out
}

pub fn query_all(selector: &str) -> Vec<Element> {
    match document().ok().and_then(|d| d.document_element()) {
        Some(root) => query_all_in(&root, selector),
        None => Vec::new(),
    }
}

/// Remove the `hidden` class so the element becomes visible.
pub fn show(el: &Element) {
    let _ = el.class_list().remove_1("hidden");
    let _ = el.class_list().add_1("visible");
}

/// Hide the element by toggling CSS classes.
pub fn hide(el: &Element) {
    let _ = el.class_list().remove_1("visible");
    let _ = el.class_list().add_1("hidden");
}

/// Inline `display` for page-provided elements styled without the
/// hidden/visible classes.
pub fn set_display(el: &Element, display: &str) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let _ = html.style().set_property("display", display);
    }
}

pub fn set_opacity(el: &Element, opacity: &str) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let _ = html.style().set_property("opacity", opacity);
    }
}

pub fn toggle_class(el: &Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}

pub fn set_text_by_id(id: &str, text: &str) {
    if let Some(el) = by_id(id) {
        el.set_text_content(Some(text));
    }
}

/// Current value of an `<input>`, `<textarea>` or `<select>`; empty when the
/// element is missing.
pub fn value_of(id: &str) -> String {
    let Some(el) = by_id(id) else {
        return String::new();
    };
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        area.value()
    } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
        select.value()
    } else {
        String::new()
    }
}

pub fn set_value_of(id: &str, value: &str) {
    let Some(el) = by_id(id) else {
        return;
    };
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        area.set_value(value);
    } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
    }
}

pub fn focus(id: &str) {
    if let Some(el) = by_id_as::<HtmlElement>(id) {
        let _ = el.focus();
    }
}

/// Attach a long-lived event listener.  The closure is leaked, matching the
/// lifetime of the page.
pub fn on<F>(target: &EventTarget, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(web_sys::Event) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// `on` for an element looked up by id; a missing element is not an error.
pub fn on_id<F>(id: &str, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(web_sys::Event) + 'static,
{
    match by_id(id) {
        Some(el) => on(&el, event, handler),
        None => Ok(()),
    }
}

/// Nearest ancestor-or-self of the event target matching `selector`.
pub fn closest_target(event: &web_sys::Event, selector: &str) -> Option<Element> {
    event
        .target()?
        .dyn_into::<Element>()
        .ok()?
        .closest(selector)
        .ok()
        .flatten()
}

/// Blocking browser confirmation dialog.  `false` when unavailable.
pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

pub fn alert(message: &str) {
    if let Some(w) = web_sys::window() {
        let _ = w.alert_with_message(message);
    }
}

pub fn pathname() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_default()
}

pub fn hash() -> String {
    web_sys::window()
        .and_then(|w| w.location().hash().ok())
        .unwrap_or_default()
}

pub fn redirect(path: &str) {
    if let Some(w) = web_sys::window() {
        let _ = w.location().set_href(path);
    }
}

pub fn reload() {
    if let Some(w) = web_sys::window() {
        let _ = w.location().reload();
    }
}

pub fn viewport_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

/// Copy `text` to the clipboard.  Uses the async Clipboard API when present
/// and falls back to a hidden textarea plus `execCommand("copy")`.
pub async fn copy_text(text: &str) -> Result<(), JsValue> {
    let window = window()?;
    let navigator = window.navigator();
    let clipboard = js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard"))?;
    if !clipboard.is_undefined() && !clipboard.is_null() {
        let write = js_sys::Reflect::get(&clipboard, &JsValue::from_str("writeText"))?;
        if let Some(write) = write.dyn_ref::<js_sys::Function>() {
            if let Ok(promise) = write.call1(&clipboard, &JsValue::from_str(text)) {
                if JsFuture::from(js_sys::Promise::from(promise)).await.is_ok() {
                    return Ok(());
                }
            }
        }
    }
    copy_text_fallback(text)
}

fn copy_text_fallback(text: &str) -> Result<(), JsValue> {
    let document = document()?;
    let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;
    let area: HtmlTextAreaElement = document.create_element("textarea")?.dyn_into()?;
    area.set_value(text);
    area.style().set_property("position", "fixed")?;
    area.style().set_property("opacity", "0")?;
    body.append_child(&area)?;
    area.select();
    let copied = document
        .dyn_ref::<web_sys::HtmlDocument>()
        .map(|d| d.exec_command("copy").unwrap_or(false))
        .unwrap_or(false);
    body.remove_child(&area)?;
    if copied {
        Ok(())
    } else {
        Err(JsValue::from_str("copy command rejected"))
    }
}
