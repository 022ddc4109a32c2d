use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Node};

use crate::constants::RESIZE_DEBOUNCE_MS;
use crate::debounce::Debouncer;
use crate::dom_utils;
use crate::state::sidebar::{is_mobile, SidebarState};
use crate::storage::{load_sidebar_collapsed, save_sidebar_collapsed, KeyValueStore};

const TOGGLE_ICONS: &str = r#"<svg class="toggle-icon close" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><polyline points="15 18 9 12 15 6"></polyline></svg><svg class="toggle-icon open" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><polyline points="9 18 15 12 9 6"></polyline></svg>"#;
const MENU_ICON: &str = r#"<svg width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><line x1="3" y1="12" x2="21" y2="12"></line><line x1="3" y1="6" x2="21" y2="6"></line><line x1="3" y1="18" x2="21" y2="18"></line></svg>"#;

#[derive(Clone)]
struct SidebarView {
    sidebar: Element,
    container: Option<Element>,
    toggle: Element,
    mobile_toggle: Option<Element>,
    state: Rc<RefCell<SidebarState>>,
    store: Rc<dyn KeyValueStore>,
}

/// Wire `.sidebar-nav`: collapse toggle (persisted), the mobile drawer and
/// its outside-click / resize handling.  No-op on pages without a sidebar.
pub fn mount(store: Rc<dyn KeyValueStore>) -> Result<(), JsValue> {
    let Some(sidebar) = dom_utils::query(".sidebar-nav") else {
        return Ok(());
    };
    let document = dom_utils::document()?;

    let toggle = match dom_utils::by_id("sidebarToggle") {
        Some(el) => el,
        None => create_button(&document, "sidebarToggle", "sidebar-toggle-btn", TOGGLE_ICONS)?,
    };
    let mobile_toggle = match dom_utils::by_id("mobileMenuToggle") {
        Some(el) => Some(el),
        None if is_mobile(dom_utils::viewport_width()) => Some(create_button(
            &document,
            "mobileMenuToggle",
            "mobile-menu-toggle",
            MENU_ICON,
        )?),
        None => None,
    };

    let view = SidebarView {
        sidebar,
        container: dom_utils::query(".container.with-sidebar"),
        toggle,
        mobile_toggle,
        state: Rc::new(RefCell::new(SidebarState::new(load_sidebar_collapsed(store.as_ref())))),
        store,
    };
    view.apply();
    view.wire(&document)
}

fn create_button(document: &Document, id: &str, class: &str, icon: &str) -> Result<Element, JsValue> {
    let button = document.create_element("button")?;
    button.set_id(id);
    button.set_class_name(class);
    button.set_inner_html(icon);
    document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .append_child(&button)?;
    Ok(button)
}

impl SidebarView {
    fn apply(&self) {
        let state = *self.state.borrow();
        dom_utils::toggle_class(&self.sidebar, "collapsed", state.collapsed());
        dom_utils::toggle_class(&self.toggle, "collapsed", state.collapsed());
        if let Some(container) = &self.container {
            dom_utils::toggle_class(container, "sidebar-collapsed", state.collapsed());
        }
        dom_utils::toggle_class(&self.sidebar, "mobile-open", state.mobile_open());
        if let Some(mobile) = &self.mobile_toggle {
            dom_utils::toggle_class(mobile, "active", state.mobile_open());
        }
    }

    fn wire(&self, document: &Document) -> Result<(), JsValue> {
        let view = self.clone();
        dom_utils::on(&self.toggle, "click", move |_| {
            let collapsed = view.state.borrow_mut().toggle_collapsed();
            save_sidebar_collapsed(view.store.as_ref(), collapsed);
            view.apply();
        })?;

        if let Some(mobile) = &self.mobile_toggle {
            let view = self.clone();
            dom_utils::on(mobile, "click", move |_| {
                view.state.borrow_mut().toggle_mobile(dom_utils::viewport_width());
                view.apply();
            })?;
        }

        let view = self.clone();
        dom_utils::on(document, "click", move |event| {
            let target = event.target().and_then(|t| t.dyn_into::<Node>().ok());
            let inside = |el: &Element| el.contains(target.as_ref());
            let on_sidebar = inside(&view.sidebar) || view.mobile_toggle.as_ref().map_or(false, inside);
            if !on_sidebar {
                view.state.borrow_mut().click_outside(dom_utils::viewport_width());
                view.apply();
            }
        })?;

        let debouncer = Debouncer::new(RESIZE_DEBOUNCE_MS);
        let view = self.clone();
        let window = dom_utils::window()?;
        dom_utils::on(&window, "resize", move |_| {
            let view = view.clone();
            debouncer.call(move || {
                view.state.borrow_mut().resized(dom_utils::viewport_width());
                view.apply();
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STORAGE_SIDEBAR_KEY;
    use crate::storage::MemoryStore;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn restores_collapsed_state_and_persists_toggle() {
        let document = dom_utils::document().unwrap();
        let body = document.body().unwrap();
        let nav = document.create_element("nav").unwrap();
        nav.set_class_name("sidebar-nav");
        body.append_child(&nav).unwrap();

        let store = Rc::new(MemoryStore::with_entries([(STORAGE_SIDEBAR_KEY, "collapsed")]));
        mount(store.clone()).unwrap();
        assert!(nav.class_list().contains("collapsed"));

        let toggle = dom_utils::by_id_as::<web_sys::HtmlElement>("sidebarToggle").unwrap();
        toggle.click();
        assert!(!nav.class_list().contains("collapsed"));
        assert_eq!(store.get(STORAGE_SIDEBAR_KEY).as_deref(), Some("expanded"));

        toggle.remove();
        nav.remove();
        if let Some(mobile) = dom_utils::by_id("mobileMenuToggle") {
            mobile.remove();
        }
    }
}
