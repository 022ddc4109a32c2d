/// API route configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ApiConfig {
    base_url: String,
}

impl Default for ApiConfig {
    /// Same-origin: every path is requested relative to the page, which is
    /// how the dashboard is normally served (backend and static files from
    /// one host).
    fn default() -> Self {
        Self {
            base_url: String::new(),
        }
    }
}

impl ApiConfig {
    /// Build from the `API_BASE_URL` variable captured at compile time,
    /// falling back to same-origin when it is not set.
    pub fn from_env() -> Self {
        match option_env!("API_BASE_URL") {
            Some(url) if !url.trim().is_empty() => Self::from_url(url),
            _ => Self::default(),
        }
    }

    /// Create a new ApiConfig from a URL string
    pub fn from_url(url: &str) -> Self {
        Self {
            base_url: url.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL for all API calls (empty for same-origin)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an absolute path such as `/api/captions`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
