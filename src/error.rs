//! Error type shared by the network layer and the component controllers.

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// A request that needs a session was attempted without a token.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The backend answered 401; the local session has been cleared.
    #[error("Session expired")]
    SessionExpired,

    #[error("API request failed: {status} {message}")]
    Http { status: u16, message: String },

    #[error("Connection error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The backend answered 2xx with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Permission denied. You need \"{0}\" permission to access this feature.")]
    PermissionDenied(String),

    /// Rejected client-side before any request was made.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated | ApiError::SessionExpired)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<JsValue> for ApiError {
    fn from(value: JsValue) -> Self {
        ApiError::Network(
            value
                .as_string()
                .unwrap_or_else(|| format!("{:?}", value)),
        )
    }
}

impl From<ApiError> for JsValue {
    fn from(e: ApiError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
