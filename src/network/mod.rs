// Network layer: configuration, the transport seam and the REST client.
pub mod api_client;
pub mod config;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

// Re-export commonly used items
pub use api_client::ApiClient;
pub use config::ApiConfig;
pub use transport::{FetchTransport, FormValue, HttpRequest, HttpResponse, Method, RequestBody, Transport};
