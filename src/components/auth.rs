//! Login page, page gate and the signed-in user badge.

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::Element;

use crate::auth::{AuthManager, LoginOutcome, SessionHandle};
use crate::constants::{HOME_PATH, LOGIN_PATH};
use crate::dom_utils;
use crate::error::ApiError;
use crate::utils::escape_html;

/// Wire `#loginForm`.  Only a session the backend still accepts is sent on
/// to the dashboard; an unverifiable one stays on the form.
pub fn mount_login_page(auth: Rc<AuthManager>) -> Result<(), JsValue> {
    if auth.is_authenticated() {
        let auth = auth.clone();
        spawn_local(async move {
            if auth.has_verified_session().await {
                dom_utils::redirect(HOME_PATH);
            }
        });
    }

    let Some(form) = dom_utils::by_id("loginForm") else {
        return Ok(());
    };

    dom_utils::on(&form, "submit", move |event| {
        event.prevent_default();
        let username = dom_utils::value_of("username");
        let password = dom_utils::value_of("password");
        let auth = auth.clone();
        spawn_local(async move {
            set_login_busy(true);
            match auth.login(username.trim(), &password).await {
                LoginOutcome::Success(_) => dom_utils::redirect(HOME_PATH),
                LoginOutcome::Failed(reason) => {
                    show_login_error(&reason);
                    set_login_busy(false);
                }
            }
        });
    })
}

fn show_login_error(reason: &str) {
    if let Some(el) = dom_utils::by_id("loginError") {
        el.set_text_content(Some(reason));
        dom_utils::set_display(&el, "block");
    }
}

fn set_login_busy(busy: bool) {
    if let Some(form) = dom_utils::by_id("loginForm") {
        if let Ok(Some(button)) = form.query_selector("button[type='submit']") {
            let _ = if busy {
                button.set_attribute("disabled", "")
            } else {
                button.remove_attribute("disabled")
            };
        }
    }
}

/// Every page except `/login` needs a session the backend still accepts.
/// Returns `false` after scheduling the redirect.
pub async fn guard_page(auth: &AuthManager) -> bool {
    if !auth.has_verified_session().await {
        dom_utils::redirect(LOGIN_PATH);
        return false;
    }
    true
}

/// Any session teardown (logout or a 401 anywhere) sends the user to the
/// login page.
pub fn redirect_when_signed_out(session: &SessionHandle) {
    session.on_change(|authenticated| {
        if !authenticated {
            dom_utils::redirect(LOGIN_PATH);
        }
    });
}

/// Fill `.user-info` badges, add one to `.dashboard-header` when missing and
/// hide every `[data-permission]` element the user lacks.
pub fn render_user_ui(auth: Rc<AuthManager>) -> Result<(), JsValue> {
    let Some(user) = auth.user() else {
        return Ok(());
    };
    let markup = format!(
        r#"<span class="user-name">👤 {}</span><span class="user-role">({})</span><button class="logout-btn">Logout</button>"#,
        escape_html(user.display_name()),
        escape_html(&user.role),
    );

    for badge in dom_utils::query_all(".user-info") {
        badge.set_inner_html(&markup);
        wire_logout(&badge, auth.clone())?;
    }

    if let Some(header) = dom_utils::query(".dashboard-header") {
        if header.query_selector(".user-info")?.is_none() {
            let document = dom_utils::document()?;
            let badge = document.create_element("div")?;
            badge.set_class_name("user-info");
            badge.set_inner_html(&markup);
            header.append_child(&badge)?;
            wire_logout(&badge, auth.clone())?;
        }
    }

    apply_permissions(&auth);
    Ok(())
}

fn wire_logout(badge: &Element, auth: Rc<AuthManager>) -> Result<(), JsValue> {
    if let Some(button) = badge.query_selector(".logout-btn")? {
        dom_utils::on(&button, "click", move |_| {
            let auth = auth.clone();
            spawn_local(async move {
                auth.logout().await;
            });
        })?;
    }
    Ok(())
}

pub fn apply_permissions(auth: &AuthManager) {
    for el in dom_utils::query_all("[data-permission]") {
        let permission = el.get_attribute("data-permission").unwrap_or_default();
        if !auth.has_permission(&permission) {
            dom_utils::set_display(&el, "none");
        }
    }
}

/// Gate a feature on a permission.  Unauthenticated users are redirected,
/// authenticated ones without the permission get an alert.
pub fn require_permission(auth: &AuthManager, permission: &str) -> bool {
    match auth.require_permission(permission) {
        Ok(()) => true,
        Err(ApiError::NotAuthenticated) => {
            dom_utils::redirect(LOGIN_PATH);
            false
        }
        Err(e) => {
            dom_utils::alert(&e.to_string());
            false
        }
    }
}
