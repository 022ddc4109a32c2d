use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::form_urlencoded;

use super::config::ApiConfig;
use super::transport::{FetchTransport, FormValue, HttpRequest, HttpResponse, Method, RequestBody, Transport};
use crate::auth::SessionHandle;
use crate::constants::API_PREFIX;
use crate::error::ApiError;
use crate::models::{
    ActionResult, AddCaptionResult, Caption, CaptionStats, LibraryStats, MediaItem, MediaType,
    MetricsReport, PostEdit, Quote, ReplaceAllResult, SystemStatus,
};

// REST client shared by every component.  Owns the session handle so the
// bearer token and the 401 teardown live in one place.
pub struct ApiClient {
    config: ApiConfig,
    session: SessionHandle,
    transport: Rc<dyn Transport>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: SessionHandle, transport: Rc<dyn Transport>) -> Self {
        Self {
            config,
            session,
            transport,
        }
    }

    /// Client wired to `window.fetch` and the compile-time base URL.
    pub fn browser(session: SessionHandle) -> Self {
        Self::new(ApiConfig::from_env(), session, Rc::new(FetchTransport))
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn build_request(&self, method: Method, path: &str, body: RequestBody) -> HttpRequest {
        let mut headers = Vec::new();
        if path.starts_with(API_PREFIX) {
            if let Some(token) = self.session.token() {
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }
        HttpRequest {
            method,
            url: self.config.url(path),
            headers,
            body,
        }
    }

    /// Send a request with the bearer token attached but without any status
    /// handling.  Login and token verification interpret statuses themselves.
    pub async fn send_raw(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(method, path, body);
        debug_log!("{} {}", method.as_str(), request.url);
        self.transport.send(request).await
    }

    /// Send and map the status: 401 on an API path tears the session down,
    /// any other non-2xx becomes [`ApiError::Http`].
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<HttpResponse, ApiError> {
        let response = self.send_raw(method, path, body).await?;
        if response.status == 401 && path.starts_with(API_PREFIX) {
            self.session.clear();
            return Err(ApiError::SessionExpired);
        }
        if !response.is_ok() {
            return Err(ApiError::Http {
                status: response.status,
                message: error_message(&response.body),
            });
        }
        Ok(response)
    }

    /// Like [`send`](Self::send) but refuses to go out without a token.
    pub async fn auth_fetch(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<HttpResponse, ApiError> {
        if self.session.token().is_none() {
            return Err(ApiError::NotAuthenticated);
        }
        self.send(method, path, body).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::Get, path, RequestBody::Empty).await?;
        decode(&response)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned + Default>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let json = serde_json::to_string(body)?;
        let response = self.send(Method::Post, path, RequestBody::Json(json)).await?;
        decode_or_default(&response)
    }

    pub async fn post_form<T: DeserializeOwned + Default>(
        &self,
        path: &str,
        parts: Vec<(String, FormValue)>,
    ) -> Result<T, ApiError> {
        let response = self.send(Method::Post, path, RequestBody::Form(parts)).await?;
        decode_or_default(&response)
    }

    pub async fn post_empty<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::Post, path, RequestBody::Empty).await?;
        decode_or_default(&response)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::Delete, path, RequestBody::Empty).await?;
        Ok(())
    }

    // ---------------- Captions ----------------

    pub async fn get_captions(&self) -> Result<Vec<Caption>, ApiError> {
        self.get_json("/api/captions").await
    }

    pub async fn get_caption_stats(&self) -> Result<CaptionStats, ApiError> {
        self.get_json("/api/captions/stats").await
    }

    pub async fn get_popular_captions(&self, limit: u32) -> Result<Vec<Caption>, ApiError> {
        self.get_json(&format!("/api/captions/popular?limit={}", limit))
            .await
    }

    pub async fn add_caption(&self, text: &str, category: &str) -> Result<AddCaptionResult, ApiError> {
        let parts = vec![
            ("text".to_string(), FormValue::Text(text.to_string())),
            ("category".to_string(), FormValue::Text(category.to_string())),
        ];
        self.post_form("/api/captions/add-single", parts).await
    }

    pub async fn replace_all_captions(&self, file: FormValue) -> Result<ReplaceAllResult, ApiError> {
        self.post_form("/api/captions/replace-all", vec![("file".to_string(), file)])
            .await
    }

    pub async fn track_caption_use(&self, caption_id: &str) -> Result<ActionResult, ApiError> {
        self.post_empty(&format!("/api/captions/{}/use", caption_id))
            .await
    }

    // ---------------- Content library ----------------

    pub async fn get_library(&self, media_type: Option<MediaType>) -> Result<Vec<MediaItem>, ApiError> {
        match media_type {
            Some(kind) => {
                let path = format!("/api/library?{}", query(&[("media_type", kind.as_str())]));
                self.get_json(&path).await
            }
            None => self.get_json("/api/library").await,
        }
    }

    pub async fn search_library(&self, q: &str) -> Result<Vec<MediaItem>, ApiError> {
        let path = format!("/api/library/search?{}", query(&[("q", q)]));
        self.get_json(&path).await
    }

    pub async fn get_library_stats(&self) -> Result<LibraryStats, ApiError> {
        self.get_json("/api/library/stats").await
    }

    pub async fn upload_media(&self, parts: Vec<(String, FormValue)>) -> Result<ActionResult, ApiError> {
        self.post_form("/api/library/upload", parts).await
    }

    pub async fn use_media(&self, media_id: &str) -> Result<ActionResult, ApiError> {
        self.post_empty(&format!("/api/library/{}/use", media_id))
            .await
    }

    pub async fn delete_media(&self, media_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/library/{}", media_id)).await
    }

    // ---------------- Posts & queue ----------------

    pub async fn schedule_post(&self, parts: Vec<(String, FormValue)>) -> Result<ActionResult, ApiError> {
        self.post_form("/schedule-post", parts).await
    }

    pub async fn cancel_post(&self, post_id: &str) -> Result<ActionResult, ApiError> {
        self.post_empty(&format!("/api/queue/{}/cancel", post_id))
            .await
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/queue/{}", post_id)).await
    }

    pub async fn edit_post(&self, post_id: &str, edit: &PostEdit) -> Result<ActionResult, ApiError> {
        self.post_json(&format!("/api/queue/{}/edit", post_id), edit)
            .await
    }

    // ---------------- Status, metrics, quotes ----------------

    pub async fn get_status(&self) -> Result<SystemStatus, ApiError> {
        self.get_json("/api/status").await
    }

    pub async fn get_metrics(&self) -> Result<MetricsReport, ApiError> {
        self.get_json("/api/metrics").await
    }

    pub async fn get_quotes(&self) -> Result<Vec<Quote>, ApiError> {
        self.get_json("/api/motivational-quotes").await
    }
}

fn query(pairs: &[(&str, &str)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k, v);
    }
    serializer.finish()
}

pub(crate) fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    Ok(serde_json::from_str(&response.body)?)
}

// Mutating endpoints sometimes answer 200 with an empty body.
fn decode_or_default<T: DeserializeOwned + Default>(response: &HttpResponse) -> Result<T, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(T::default());
    }
    decode(response)
}

/// Best human-readable message from an error body: FastAPI's `detail`, the
/// `{success, message}` envelope, or the raw text.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    body.trim().chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::mock::MockTransport;
    use crate::storage::MemoryStore;
    use futures::executor::block_on;

    fn client_with(token: Option<&str>) -> (ApiClient, Rc<MockTransport>) {
        let store = Rc::new(MemoryStore::new());
        let session = SessionHandle::load(store);
        if let Some(t) = token {
            session.establish(
                t.to_string(),
                crate::models::User {
                    username: "amy".into(),
                    ..Default::default()
                },
            );
        }
        let transport = Rc::new(MockTransport::new());
        let client = ApiClient::new(ApiConfig::default(), session, transport.clone());
        (client, transport)
    }

    #[test]
    fn bearer_only_on_api_paths() {
        let (client, transport) = client_with(Some("tok"));
        transport.respond(200, "[]");
        transport.respond(200, r#"{"success":true,"message":"ok"}"#);

        block_on(client.get_captions()).unwrap();
        block_on(client.schedule_post(vec![])).unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].header("Authorization"), Some("Bearer tok"));
        assert_eq!(requests[1].url, "/schedule-post");
        assert_eq!(requests[1].header("Authorization"), None);
    }

    #[test]
    fn unauthorized_clears_session() {
        let (client, transport) = client_with(Some("tok"));
        transport.respond(401, r#"{"detail":"expired"}"#);

        let err = block_on(client.get_status()).unwrap_err();
        assert_eq!(err, ApiError::SessionExpired);
        assert!(!client.session().is_authenticated());
    }

    #[test]
    fn auth_fetch_without_token_sends_nothing() {
        let (client, transport) = client_with(None);
        let err = block_on(client.auth_fetch(Method::Get, "/api/status", RequestBody::Empty)).unwrap_err();
        assert_eq!(err, ApiError::NotAuthenticated);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn http_error_carries_backend_message() {
        let (client, transport) = client_with(Some("tok"));
        transport.respond(400, r#"{"success":false,"message":"Bad spreadsheet"}"#);
        let err = block_on(client.replace_all_captions(FormValue::Text("x".into()))).unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: 400,
                message: "Bad spreadsheet".into()
            }
        );
    }

    #[test]
    fn search_query_is_encoded() {
        let (client, transport) = client_with(Some("tok"));
        transport.respond(200, "[]");
        block_on(client.search_library("beach & sun")).unwrap();
        assert_eq!(transport.requests()[0].url, "/api/library/search?q=beach+%26+sun");
    }

    #[test]
    fn empty_body_on_action_is_default() {
        let (client, transport) = client_with(Some("tok"));
        transport.respond(200, "");
        let result = block_on(client.use_media("7")).unwrap();
        assert!(!result.success);
        assert_eq!(transport.requests()[0].url, "/api/library/7/use");
    }

    #[test]
    fn error_message_fallbacks() {
        assert_eq!(error_message(r#"{"detail":"nope"}"#), "nope");
        assert_eq!(error_message("Internal Server Error"), "Internal Server Error");
    }
}
