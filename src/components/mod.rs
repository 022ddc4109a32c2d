pub mod auth;
pub mod caption_library;
pub mod composer;
pub mod content_library;
pub mod greeting;
pub mod metrics_panel;
pub mod modal;
pub mod sidebar;
pub mod system_status;

// Re-export commonly used items
pub use caption_library::CaptionLayout;
