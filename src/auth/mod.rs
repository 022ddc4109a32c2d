//! Authentication: login, token verification, logout and permission checks.
//!
//! [`AuthManager`] is a thin service over the shared [`ApiClient`]; the
//! token/user pair itself lives in [`SessionHandle`] so the client can read it
//! for header injection.  DOM wiring (login form, user badge, redirects) is
//! in `components::auth`.

pub mod session;

use std::rc::Rc;

pub use session::{permits, SessionHandle};

use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, User};
use crate::network::{ApiClient, HttpResponse, Method, RequestBody};

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success(User),
    Failed(String),
}

pub struct AuthManager {
    api: Rc<ApiClient>,
}

impl AuthManager {
    pub fn new(api: Rc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn session(&self) -> &SessionHandle {
        self.api.session()
    }

    pub fn user(&self) -> Option<User> {
        self.session().user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.session().has_permission(permission)
    }

    pub async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        let body = match serde_json::to_string(&LoginRequest { username, password }) {
            Ok(body) => body,
            Err(_) => return LoginOutcome::Failed("Login failed".to_string()),
        };

        let response = match self
            .api
            .send_raw(Method::Post, "/api/auth/login", RequestBody::Json(body))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error_log!("Login error: {}", e);
                return LoginOutcome::Failed("Connection error".to_string());
            }
        };

        let data: LoginResponse = serde_json::from_str(&response.body).unwrap_or_default();
        if response.is_ok() && data.success {
            if let (Some(token), Some(user)) = (data.access_token, data.user) {
                self.session().establish(token, user.clone());
                return LoginOutcome::Success(user);
            }
        }
        LoginOutcome::Failed(data.detail.unwrap_or_else(|| "Login failed".to_string()))
    }

    /// Ask the backend whether the stored token is still good.  A rejected
    /// token tears the session down; an unreachable backend leaves it alone.
    pub async fn verify_token(&self) -> bool {
        if self.session().token().is_none() {
            return false;
        }

        match self
            .api
            .send_raw(Method::Get, "/api/auth/me", RequestBody::Empty)
            .await
        {
            Ok(response) if response.is_ok() => match serde_json::from_str::<User>(&response.body) {
                Ok(user) => {
                    self.session().refresh_user(user);
                    true
                }
                Err(e) => {
                    error_log!("Token verification failed: {}", e);
                    false
                }
            },
            Ok(_) => {
                self.session().clear();
                false
            }
            Err(e) => {
                error_log!("Token verification failed: {}", e);
                false
            }
        }
    }

    /// Signed in locally and accepted by the backend.  An unreachable backend
    /// answers `false` while the local session survives, so callers must not
    /// read `is_authenticated()` alone as "may enter the dashboard".
    pub async fn has_verified_session(&self) -> bool {
        self.is_authenticated() && self.verify_token().await
    }

    /// Best-effort server logout; the local session is always cleared.
    pub async fn logout(&self) {
        if self.session().token().is_some() {
            if let Err(e) = self
                .api
                .send_raw(Method::Post, "/api/auth/logout", RequestBody::Empty)
                .await
            {
                error_log!("Logout error: {}", e);
            }
        }
        self.session().clear();
    }

    pub async fn auth_fetch(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<HttpResponse, ApiError> {
        self.api.auth_fetch(method, path, body).await
    }

    pub fn require_auth(&self) -> Result<(), ApiError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::NotAuthenticated)
        }
    }

    pub fn require_permission(&self, permission: &str) -> Result<(), ApiError> {
        self.require_auth()?;
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied(permission.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::mock::MockTransport;
    use crate::network::ApiConfig;
    use crate::storage::MemoryStore;
    use futures::executor::block_on;
    use std::cell::RefCell;

    fn manager() -> (AuthManager, Rc<MockTransport>) {
        let session = SessionHandle::load(Rc::new(MemoryStore::new()));
        let transport = Rc::new(MockTransport::new());
        let api = ApiClient::new(ApiConfig::default(), session, transport.clone());
        (AuthManager::new(Rc::new(api)), transport)
    }

    const LOGIN_OK: &str = r#"{"success":true,"access_token":"jwt","user":{"username":"amy","role":"admin","permissions":["captions"]}}"#;

    #[test]
    fn login_success_establishes_session_and_notifies() {
        let (auth, transport) = manager();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        auth.session().on_change(move |v| sink.borrow_mut().push(v));
        transport.respond(200, LOGIN_OK);

        let outcome = block_on(auth.login("amy", "pw"));
        assert!(matches!(outcome, LoginOutcome::Success(ref u) if u.username == "amy"));
        assert!(auth.is_authenticated());
        assert_eq!(*events.borrow(), vec![true]);

        let req = &transport.requests()[0];
        assert_eq!(req.url, "/api/auth/login");
        assert_eq!(req.json_body(), Some(r#"{"username":"amy","password":"pw"}"#));
    }

    #[test]
    fn login_failure_reports_detail_or_default() {
        let (auth, transport) = manager();
        transport.respond(401, r#"{"detail":"Invalid credentials"}"#);
        transport.respond(500, "oops");
        transport.fail("offline");

        assert_eq!(
            block_on(auth.login("a", "b")),
            LoginOutcome::Failed("Invalid credentials".into())
        );
        assert_eq!(block_on(auth.login("a", "b")), LoginOutcome::Failed("Login failed".into()));
        assert_eq!(block_on(auth.login("a", "b")), LoginOutcome::Failed("Connection error".into()));
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn verify_without_token_makes_no_request() {
        let (auth, transport) = manager();
        assert!(!block_on(auth.verify_token()));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn verify_with_401_clears_session() {
        let (auth, transport) = manager();
        transport.respond(200, LOGIN_OK);
        block_on(auth.login("amy", "pw"));
        assert!(auth.is_authenticated());

        transport.respond(401, r#"{"detail":"Token expired"}"#);
        assert!(!block_on(auth.verify_token()));
        assert!(!auth.is_authenticated());
        assert_eq!(transport.requests()[1].header("Authorization"), Some("Bearer jwt"));
    }

    #[test]
    fn verify_refreshes_user_and_survives_network_errors() {
        let (auth, transport) = manager();
        transport.respond(200, LOGIN_OK);
        block_on(auth.login("amy", "pw"));

        transport.respond(200, r#"{"username":"amy","full_name":"Amy Pond","role":"admin","permissions":["all"]}"#);
        assert!(block_on(auth.verify_token()));
        assert!(auth.has_permission("anything"));

        transport.fail("offline");
        assert!(!block_on(auth.verify_token()));
        assert!(auth.is_authenticated());
    }

    #[test]
    fn offline_backend_never_counts_as_verified() {
        let (auth, transport) = manager();
        assert!(!block_on(auth.has_verified_session()));
        assert!(transport.requests().is_empty());

        transport.respond(200, LOGIN_OK);
        block_on(auth.login("amy", "pw"));
        transport.fail("offline");
        assert!(!block_on(auth.has_verified_session()));
        assert!(auth.is_authenticated());

        transport.respond(200, "not a user");
        assert!(!block_on(auth.has_verified_session()));

        transport.respond(200, r#"{"username":"amy","role":"admin","permissions":[]}"#);
        assert!(block_on(auth.has_verified_session()));
    }

    #[test]
    fn logout_always_clears() {
        let (auth, transport) = manager();
        transport.respond(200, LOGIN_OK);
        block_on(auth.login("amy", "pw"));
        transport.fail("offline");

        block_on(auth.logout());
        assert!(!auth.is_authenticated());
        assert_eq!(transport.urls()[1], "/api/auth/logout");
    }

    #[test]
    fn permission_gates() {
        let (auth, transport) = manager();
        assert_eq!(auth.require_auth(), Err(ApiError::NotAuthenticated));

        transport.respond(200, LOGIN_OK);
        block_on(auth.login("amy", "pw"));
        assert_eq!(auth.require_permission("captions"), Ok(()));
        assert_eq!(
            auth.require_permission("admin"),
            Err(ApiError::PermissionDenied("admin".into()))
        );
    }
}
