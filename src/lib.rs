use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

#[macro_use]
mod macros;

pub mod auth;
pub mod components;
pub mod constants;
pub mod debounce;
pub mod dom_utils;
pub mod error;
pub mod models;
pub mod network;
pub mod state;
pub mod storage;
pub mod toast;
pub mod utils;

pub use auth::{AuthManager, LoginOutcome, SessionHandle};
pub use error::ApiError;
pub use network::{ApiClient, ApiConfig, HttpRequest, HttpResponse, Transport};
pub use storage::{KeyValueStore, LocalStorage, MemoryStore};

use components::CaptionLayout;
use constants::{LOGIN_PATH, METRICS_PATH};

// Main entry point for the WASM application
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Initialize better panic messages
    console_error_panic_hook::set_once();

    let store: Rc<dyn KeyValueStore> = Rc::new(LocalStorage);
    let session = SessionHandle::load(store.clone());
    let api = Rc::new(ApiClient::browser(session));
    let auth = Rc::new(AuthManager::new(api.clone()));

    components::sidebar::mount(store)?;

    if dom_utils::pathname() == LOGIN_PATH {
        return components::auth::mount_login_page(auth);
    }

    spawn_local(async move {
        if !components::auth::guard_page(&auth).await {
            return;
        }
        components::auth::redirect_when_signed_out(auth.session());
        if let Err(e) = mount_page(api, auth) {
            error_log!("Failed to set up page: {:?}", e);
        }
    });

    Ok(())
}

/// Mount every component whose root element the current page carries.
fn mount_page(api: Rc<ApiClient>, auth: Rc<AuthManager>) -> Result<(), JsValue> {
    components::auth::render_user_ui(auth.clone())?;

    if dom_utils::by_id("captionGrid").is_some() {
        components::caption_library::mount(api.clone(), CaptionLayout::Compact)?;
    }
    if dom_utils::by_id("messagesGrid").is_some() {
        components::caption_library::mount(api.clone(), CaptionLayout::Expanded)?;
        components::system_status::start_polling(api.clone());
    }
    if dom_utils::by_id("libraryGrid").is_some() {
        components::content_library::mount(api.clone())?;
    }
    if dom_utils::by_id("postForm").is_some() {
        components::composer::mount(api.clone())?;
    }
    if dom_utils::by_id("animatedGreeting").is_some() {
        components::greeting::mount(api.clone(), auth.user());
    }
    if dom_utils::pathname() == METRICS_PATH {
        components::metrics_panel::mount(api);
    }

    debug_log!("Page mounted for {}", dom_utils::pathname());
    Ok(())
}
