//! Transient notifications.
//! Appends `.notification` divs to the page's `#notifications` container
//! (created on demand) and fades them out after a few seconds.

use gloo_timers::callback::Timeout;
use web_sys::{Document, Element};

use crate::constants::{TOAST_FADE_MS, TOAST_LIFETIME_MS};
use crate::dom_utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    fn class(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        }
    }
}

pub fn success(msg: &str) {
    show(msg, ToastKind::Success);
}

pub fn error(msg: &str) {
    show(msg, ToastKind::Error);
}

pub fn info(msg: &str) {
    show(msg, ToastKind::Info);
}

pub fn show(message: &str, kind: ToastKind) {
    let Ok(document) = dom_utils::document() else {
        return;
    };
    let Some(root) = ensure_root(&document) else {
        return;
    };
    let Ok(note) = document.create_element("div") else {
        return;
    };
    note.set_class_name(&format!("notification {}", kind.class()));
    note.set_text_content(Some(message));
    if root.append_child(&note).is_err() {
        return;
    }

    Timeout::new(TOAST_LIFETIME_MS, move || {
        let _ = note.class_list().add_1("fade-out");
        Timeout::new(TOAST_FADE_MS, move || note.remove()).forget();
    })
    .forget();
}

/// Briefly add `show` to a page-provided toast such as `#copyToast`.
pub fn flash(id: &str, duration_ms: u32) {
    if let Some(el) = dom_utils::by_id(id) {
        let _ = el.class_list().add_1("show");
        Timeout::new(duration_ms, move || {
            let _ = el.class_list().remove_1("show");
        })
        .forget();
    }
}

fn ensure_root(document: &Document) -> Option<Element> {
    if let Some(el) = document.get_element_by_id("notifications") {
        return Some(el);
    }
    let root = document.create_element("div").ok()?;
    root.set_id("notifications");
    root.set_class_name("notifications");
    document.body()?.append_child(&root).ok()?;
    ensure_styles(document);
    Some(root)
}

// Only injected when the page did not ship its own container.
fn ensure_styles(document: &Document) {
    if document.get_element_by_id("notification-styles").is_some() {
        return;
    }

    let css = "
.notifications{position:fixed;top:16px;right:16px;display:flex;flex-direction:column;gap:8px;z-index:9999}
.notification{padding:10px 16px;border-radius:6px;color:#fff;box-shadow:0 2px 4px rgba(0,0,0,.1);transition:opacity .3s}
.notification.success{background:#16a34a}
.notification.error{background:#dc2626}
.notification.info{background:#2563eb}
.notification.fade-out{opacity:0}
";

    let Ok(style) = document.create_element("style") else {
        return;
    };
    style.set_id("notification-styles");
    style.set_text_content(Some(css));
    let parent = document.head().map(Element::from).or_else(|| document.body().map(Element::from));
    if let Some(parent) = parent {
        let _ = parent.append_child(&style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn notification_lands_in_container() {
        error("Upload failed");
        let root = dom_utils::by_id("notifications").expect("container created");
        let last = root.last_element_child().unwrap();
        assert_eq!(last.class_name(), "notification error");
        assert_eq!(last.text_content().as_deref(), Some("Upload failed"));
    }
}
