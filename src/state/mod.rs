//! Rendering-free state for every dashboard component.
//!
//! Nothing in here touches the DOM, so the filtering, sorting and validation
//! rules run under plain `cargo test`.  The `components` modules own an
//! instance of these types and re-render from them.

pub mod captions;
pub mod composer;
pub mod greeting;
pub mod library;
pub mod metrics;
pub mod sidebar;

pub use captions::{CaptionLibrary, CaptionLibraryState, ReplaceOutcome};
pub use composer::{Composer, ComposerState, PendingUpload, QueueTab, SubmitAction};
pub use greeting::{QuoteDeck, RotationTickets, Ticket};
pub use library::{ContentLibrary, LibraryState, LibraryUpload, MediaFilter, SortKey};
pub use metrics::{MetricsRefresher, MetricsView, RefreshGuard};
pub use sidebar::SidebarState;
