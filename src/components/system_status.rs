use std::rc::Rc;

use gloo_timers::callback::Interval;
use wasm_bindgen_futures::spawn_local;

use crate::constants::STATUS_POLL_MS;
use crate::dom_utils;
use crate::network::ApiClient;

/// Flip the header's `.status-dot` / `.status-text` pair.
pub fn render(online: bool) {
    let (Some(dot), Some(text)) = (dom_utils::query(".status-dot"), dom_utils::query(".status-text")) else {
        return;
    };
    if online {
        dot.set_class_name("status-dot online");
        text.set_text_content(Some("System Online"));
    } else {
        dot.set_class_name("status-dot offline");
        text.set_text_content(Some("System Offline"));
    }
}

/// Poll `/api/status` for pages that only show the indicator.
pub fn start_polling(api: Rc<ApiClient>) {
    let check = move || {
        let api = api.clone();
        spawn_local(async move {
            match api.get_status().await {
                Ok(status) => render(status.online),
                Err(e) => error_log!("Error checking status: {}", e),
            }
        });
    };
    check();
    Interval::new(STATUS_POLL_MS, check).forget();
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn indicator_reflects_status() {
        let document = dom_utils::document().unwrap();
        let body = document.body().unwrap();
        let wrap = document.create_element("div").unwrap();
        wrap.set_inner_html(r#"<span class="status-dot"></span><span class="status-text"></span>"#);
        body.append_child(&wrap).unwrap();

        render(false);
        assert_eq!(dom_utils::query(".status-dot").unwrap().class_name(), "status-dot offline");
        render(true);
        assert_eq!(
            dom_utils::query(".status-text").unwrap().text_content().as_deref(),
            Some("System Online")
        );

        wrap.remove();
    }
}
