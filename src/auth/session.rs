//! Token + user pair and its lifecycle.
//!
//! The session is the only client-owned entity with an explicit lifecycle:
//! created on login, refreshed on verify, destroyed on logout or on any 401.
//! It is shared (`Rc`) between the [`ApiClient`](crate::network::ApiClient),
//! which reads the token, and the auth manager, which mutates it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::constants::{STORAGE_TOKEN_KEY, STORAGE_USER_KEY};
use crate::models::User;
use crate::storage::KeyValueStore;

type AuthListener = Rc<dyn Fn(bool)>;

struct SessionInner {
    token: Option<String>,
    user: Option<User>,
    store: Rc<dyn KeyValueStore>,
    listeners: Vec<AuthListener>,
}

/// Cheap-to-clone handle; all clones observe the same session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Rc<RefCell<SessionInner>>,
}

impl SessionHandle {
    /// Restore whatever the store holds.  A corrupt user blob is treated as
    /// "no user" so the auth gate sends the visitor back to the login page.
    pub fn load(store: Rc<dyn KeyValueStore>) -> Self {
        let token = store.get(STORAGE_TOKEN_KEY).filter(|t| !t.is_empty());
        let user = store
            .get(STORAGE_USER_KEY)
            .and_then(|raw| serde_json::from_str::<User>(&raw).ok());

        Self {
            inner: Rc::new(RefCell::new(SessionInner {
                token,
                user,
                store,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.inner.borrow().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        let inner = self.inner.borrow();
        inner.token.is_some() && inner.user.is_some()
    }

    /// True iff the user's permission set contains `"all"` or `permission`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.inner
            .borrow()
            .user
            .as_ref()
            .map(|u| permits(&u.permissions, permission))
            .unwrap_or(false)
    }

    /// Register a callback fired after every login (`true`) and every
    /// session teardown (`false`).
    pub fn on_change(&self, listener: impl Fn(bool) + 'static) {
        self.inner.borrow_mut().listeners.push(Rc::new(listener));
    }

    pub fn establish(&self, token: String, user: User) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.store.set(STORAGE_TOKEN_KEY, &token);
            if let Ok(raw) = serde_json::to_string(&user) {
                inner.store.set(STORAGE_USER_KEY, &raw);
            }
            inner.token = Some(token);
            inner.user = Some(user);
        }
        self.notify(true);
    }

    /// Replace the cached user after a successful `/api/auth/me`.
    pub fn refresh_user(&self, user: User) {
        let mut inner = self.inner.borrow_mut();
        if let Ok(raw) = serde_json::to_string(&user) {
            inner.store.set(STORAGE_USER_KEY, &raw);
        }
        inner.user = Some(user);
    }

    /// Drop token and user from memory and storage.  Listeners only fire when
    /// there was something to clear, so repeated 401s redirect once.
    pub fn clear(&self) {
        let had_session = {
            let mut inner = self.inner.borrow_mut();
            let had = inner.token.is_some() || inner.user.is_some();
            inner.token = None;
            inner.user = None;
            inner.store.remove(STORAGE_TOKEN_KEY);
            inner.store.remove(STORAGE_USER_KEY);
            had
        };
        if had_session {
            self.notify(false);
        }
    }

    // Listeners run outside the borrow so they may read the session.
    fn notify(&self, authenticated: bool) {
        let listeners: Vec<AuthListener> = self.inner.borrow().listeners.clone();
        for listener in listeners {
            listener(authenticated);
        }
    }
}

pub fn permits(permissions: &[String], permission: &str) -> bool {
    permissions.iter().any(|p| p == "all" || p == permission)
}
