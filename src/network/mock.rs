//! Recording transport for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use futures::future::LocalBoxFuture;

use super::transport::{HttpRequest, HttpResponse, Transport};
use crate::error::ApiError;

/// Replays queued responses in order and keeps every request it saw.  With
/// the queue empty it answers `200 {}`.
#[derive(Default)]
pub struct MockTransport {
    requests: RefCell<Vec<HttpRequest>>,
    responses: RefCell<VecDeque<Result<HttpResponse, ApiError>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.responses.borrow_mut().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn fail(&self, message: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(ApiError::Network(message.to_string())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|r| r.url.clone()).collect()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, ApiError>> {
        self.requests.borrow_mut().push(request);
        let next = self.responses.borrow_mut().pop_front().unwrap_or_else(|| {
            Ok(HttpResponse {
                status: 200,
                body: "{}".to_string(),
            })
        });
        Box::pin(async move { next })
    }
}
