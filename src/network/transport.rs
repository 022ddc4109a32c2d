//! HTTP transport seam.
//!
//! [`ApiClient`](super::ApiClient) builds plain [`HttpRequest`] values and
//! hands them to a [`Transport`].  In the browser that is [`FetchTransport`];
//! tests substitute a recording mock so request shapes (and the absence of a
//! request) can be asserted without a network.

use futures::future::LocalBoxFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// One multipart field.
#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    /// A file picked through an `<input type="file">` or dropped on the page.
    File(web_sys::File),
    /// In-memory file contents (generated exports, tests).
    Bytes {
        filename: String,
        mime: String,
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(String),
    Form(Vec<(String, FormValue)>),
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Text value of a multipart field, if the body is a form.
    pub fn form_text(&self, name: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(parts) => parts.iter().find_map(|(k, v)| match v {
                FormValue::Text(t) if k == name => Some(t.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn form_field_names(&self) -> Vec<&str> {
        match &self.body {
            RequestBody::Form(parts) => parts.iter().map(|(k, _)| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn json_body(&self) -> Option<&str> {
        match &self.body {
            RequestBody::Json(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, ApiError>>;
}

/// `window.fetch` backed transport.
#[derive(Default, Clone, Copy)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, ApiError>> {
        Box::pin(async move { fetch(request).await.map_err(ApiError::from) })
    }
}

async fn fetch(request: HttpRequest) -> Result<HttpResponse, JsValue> {
    use web_sys::{FormData, Headers, Request, RequestInit, RequestMode, Response};

    let opts = RequestInit::new();
    opts.set_method(request.method.as_str());
    opts.set_mode(RequestMode::Cors);

    let headers = Headers::new()?;
    for (name, value) in &request.headers {
        headers.append(name, value)?;
    }

    match &request.body {
        RequestBody::Empty => {}
        RequestBody::Json(data) => {
            headers.append("Content-Type", "application/json")?;
            opts.set_body(&JsValue::from_str(data));
        }
        RequestBody::Form(parts) => {
            // The browser sets the multipart boundary header itself.
            let form = FormData::new()?;
            for (name, value) in parts {
                match value {
                    FormValue::Text(text) => form.append_with_str(name, text)?,
                    FormValue::File(file) => {
                        form.append_with_blob_and_filename(name, file, &file.name())?
                    }
                    FormValue::Bytes {
                        filename,
                        mime,
                        data,
                    } => {
                        let blob = bytes_to_blob(data, mime)?;
                        form.append_with_blob_and_filename(name, &blob, filename)?
                    }
                }
            }
            opts.set_body(&form);
        }
    }

    opts.set_headers(&headers);

    let req = Request::new_with_str_and_init(&request.url, &opts)?;
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window exists"))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&req)).await?;
    let resp: Response = resp_value.dyn_into()?;

    let status = resp.status();
    let text = JsFuture::from(resp.text()?).await?;
    Ok(HttpResponse {
        status,
        body: text.as_string().unwrap_or_default(),
    })
}

fn bytes_to_blob(data: &[u8], mime: &str) -> Result<web_sys::Blob, JsValue> {
    let array = js_sys::Uint8Array::from(data);
    let parts = js_sys::Array::of1(&array);
    let bag = web_sys::BlobPropertyBag::new();
    bag.set_type(mime);
    web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &bag)
}
