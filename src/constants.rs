// Local storage keys
pub const STORAGE_TOKEN_KEY: &str = "promura_token";
pub const STORAGE_USER_KEY: &str = "promura_user";
pub const STORAGE_SIDEBAR_KEY: &str = "sidebarState";

// Routes
pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";
pub const METRICS_PATH: &str = "/metrics";

// Only requests under this prefix carry the bearer token.
pub const API_PREFIX: &str = "/api/";

// Timing (milliseconds)
pub const SEARCH_DEBOUNCE_MS: u32 = 300;
pub const RESIZE_DEBOUNCE_MS: u32 = 250;
pub const STATUS_POLL_MS: u32 = 30_000;
pub const METRICS_POLL_MS: u32 = 5_000;
pub const QUOTE_ROTATION_MS: u32 = 180_000;
pub const GREETING_REFRESH_MS: u32 = 3_600_000;
pub const GREETING_TYPING_DELAY_MS: u32 = 50;
pub const QUOTE_TYPING_DELAY_MS: u32 = 30;
pub const TYPING_CURSOR_LINGER_MS: u32 = 500;
pub const NAME_FADE_IN_MS: u32 = 400;
pub const QUOTE_FADE_OUT_MS: u32 = 200;
pub const TOAST_LIFETIME_MS: u32 = 5_000;
pub const TOAST_FADE_MS: u32 = 300;
pub const COPY_TOAST_MS: u32 = 2_000;
pub const UPLOAD_STATUS_HIDE_MS: u32 = 5_000;

// Layout
pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;

// Limits
pub const METRICS_LIST_LIMIT: usize = 10;
pub const CAPTION_SUGGESTION_LIMIT: u32 = 5;
pub const SUGGESTION_PILL_CHARS: usize = 30;
pub const MEDIA_NAME_MAX_CHARS: usize = 20;

// Category sentinel shared by both caption layouts
pub const ALL_CATEGORIES: &str = "All";
pub const ALL_CATEGORIES_LABEL: &str = "All Categories";
pub const DEFAULT_CAPTION_CATEGORY: &str = "General";

// Shown when the quote endpoint is unreachable or empty
pub const FALLBACK_QUOTE_TEXT: &str =
    "Success doesn't come from what you do occasionally. It comes from what you do consistently.";
pub const FALLBACK_QUOTE_AUTHOR: &str = "Marie Forleo";
pub const EMERGENCY_QUOTE_TEXT: &str = "Great things never come from comfort zones.";

pub const GUEST_NAME: &str = "Guest";

// Confirmation prompts for destructive actions
pub const CONFIRM_REPLACE_CAPTIONS: &str =
    "⚠️ This will DELETE all existing captions and replace with new ones. Continue?";
pub const CONFIRM_DELETE_MEDIA: &str = "Are you sure you want to delete this media from library?";
pub const CONFIRM_CANCEL_POST: &str = "Are you sure you want to cancel this post?";
pub const CONFIRM_DELETE_POST: &str =
    "Are you sure you want to delete this post? This action cannot be undone.";

// Spreadsheet uploads accepted by the caption replace flow
pub const SPREADSHEET_MIME_TYPES: [&str; 2] = [
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];
pub const SPREADSHEET_EXTENSIONS: [&str; 2] = [".xls", ".xlsx"];
