use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// Backend payloads are loosely typed: sizes and ids arrive either as strings
// or numbers depending on the endpoint, so accept both.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

/// Authenticated user as returned by `/api/auth/login` and `/api/auth/me`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize, Debug, Default)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Generic `{success, message}` envelope most mutating endpoints answer with.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct ActionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Captions
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Caption {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub usage_count: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ReplaceAllResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub captions: Vec<Caption>,
    #[serde(default)]
    pub summary: Option<ReplaceSummary>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ReplaceSummary {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub by_category: BTreeMap<String, u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct AddCaptionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub caption: Option<Caption>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct CaptionStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub categories: BTreeMap<String, u32>,
    #[serde(default)]
    pub most_used: Vec<Caption>,
    #[serde(default)]
    pub recent: Vec<Caption>,
}

// ---------------------------------------------------------------------------
// Content library
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub filename: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub file_size: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub used_count: u32,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MediaItem {
    pub fn preview_url(&self) -> &str {
        self.thumbnail_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.url)
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct LibraryStats {
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub total_images: u32,
    #[serde(default)]
    pub total_videos: u32,
    #[serde(default)]
    pub total_size: Option<String>,
    #[serde(default)]
    pub unique_tags: u32,
}

// ---------------------------------------------------------------------------
// Status, metrics, quotes
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, Default, Clone)]
pub struct SystemStatus {
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub queue_count: u32,
    #[serde(default)]
    pub completed_count: u32,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct MetricsReport {
    #[serde(default)]
    pub system: Option<SystemMetrics>,
    #[serde(default)]
    pub api: Option<ApiMetrics>,
    #[serde(default)]
    pub posts: Option<PostMetrics>,
    #[serde(default)]
    pub recent_activity: Option<Vec<ActivityEntry>>,
    #[serde(default)]
    pub errors: Option<ErrorLog>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct SystemMetrics {
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub scheduled_posts: u32,
    #[serde(default)]
    pub completed_posts: u32,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ApiMetrics {
    #[serde(default, alias = "total_calls")]
    pub total_requests: Option<f64>,
    #[serde(default)]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub avg_response_time: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct PostMetrics {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub successful: u32,
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub pending: u32,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ActivityEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ErrorEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// `/api/metrics` has shipped errors both as a bare list and as
/// `{summary, recent}`; only the entries matter here.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ErrorLog {
    List(Vec<ErrorEntry>),
    Grouped {
        #[serde(default)]
        recent: Vec<ErrorEntry>,
    },
}

impl ErrorLog {
    pub fn entries(&self) -> &[ErrorEntry] {
        match self {
            ErrorLog::List(entries) => entries,
            ErrorLog::Grouped { recent } => recent,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
}

// ---------------------------------------------------------------------------
// Scheduled posts
// ---------------------------------------------------------------------------

/// JSON body for `POST /api/queue/{id}/edit` – a full replacement.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PostEdit {
    pub content: String,
    pub models: Vec<String>,
    pub schedule_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_item_accepts_numeric_size_and_missing_fields() {
        let item: MediaItem = serde_json::from_str(
            r#"{"id": 42, "filename": "a.png", "type": "image", "url": "/m/a.png", "file_size": 1024}"#,
        )
        .unwrap();
        assert_eq!(item.id, "42");
        assert_eq!(item.file_size, "1024");
        assert_eq!(item.used_count, 0);
        assert!(item.tags.is_empty());
        assert_eq!(item.preview_url(), "/m/a.png");
    }

    #[test]
    fn caption_null_usage_count_is_zero() {
        let c: Caption =
            serde_json::from_str(r#"{"id":"c1","text":"hi","usage_count":null}"#).unwrap();
        assert_eq!(c.usage_count, 0);
        assert_eq!(c.category, None);
    }

    #[test]
    fn error_log_accepts_both_shapes() {
        let list: ErrorLog =
            serde_json::from_str(r#"[{"type":"API","message":"boom"}]"#).unwrap();
        assert_eq!(list.entries().len(), 1);

        let grouped: ErrorLog = serde_json::from_str(
            r#"{"summary":{"API":3},"recent":[{"type":"API","message":"a"},{"type":"DB","message":"b"}]}"#,
        )
        .unwrap();
        assert_eq!(grouped.entries()[1].kind, "DB");
    }

    #[test]
    fn user_display_name_falls_back_to_username() {
        let mut user = User {
            username: "jdoe".into(),
            ..Default::default()
        };
        assert_eq!(user.display_name(), "jdoe");
        user.full_name = Some("Jane Doe".into());
        assert_eq!(user.display_name(), "Jane Doe");
    }
}
