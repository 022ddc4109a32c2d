//! Metrics page view model and refresh guard.

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;

use crate::constants::METRICS_LIST_LIMIT;
use crate::error::ApiError;
use crate::models::MetricsReport;
use crate::network::ApiClient;
use crate::utils::{format_ms, format_number, format_percentage, time_ago_since};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemView {
    pub status: &'static str,
    pub scheduled_posts: u32,
    pub completed_posts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiView {
    pub total_requests: String,
    pub success_rate: String,
    pub avg_response_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostsView {
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
    pub pending: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRow {
    pub time_ago: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRow {
    pub time_ago: String,
    pub kind: String,
    pub message: String,
}

/// Display-ready snapshot of one `/api/metrics` response.  Sections the
/// backend omitted stay `None` so the page keeps its previous values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsView {
    pub system: Option<SystemView>,
    pub api: Option<ApiView>,
    pub posts: Option<PostsView>,
    pub activity: Option<Vec<ActivityRow>>,
    pub errors: Option<Vec<ErrorRow>>,
}

impl MetricsView {
    pub fn from_report(report: &MetricsReport, now_ms: f64) -> Self {
        let system = report.system.as_ref().map(|s| SystemView {
            status: if s.online { "Online" } else { "Offline" },
            scheduled_posts: s.scheduled_posts,
            completed_posts: s.completed_posts,
        });

        // A report without traffic leaves the API tiles untouched.
        let api = report
            .api
            .as_ref()
            .filter(|a| a.total_requests.map_or(false, |n| n != 0.0))
            .map(|a| ApiView {
                total_requests: format_number(a.total_requests.unwrap_or_default()),
                success_rate: a
                    .success_rate
                    .map(format_percentage)
                    .unwrap_or_else(|| "0%".to_string()),
                avg_response_time: a
                    .avg_response_time
                    .map(format_ms)
                    .unwrap_or_else(|| "0ms".to_string()),
            });

        let posts = report.posts.as_ref().map(|p| PostsView {
            total: p.total,
            successful: p.successful,
            failed: p.failed,
            pending: p.pending,
        });

        let activity = report.recent_activity.as_ref().map(|entries| {
            entries
                .iter()
                .take(METRICS_LIST_LIMIT)
                .map(|a| ActivityRow {
                    time_ago: time_ago_since(a.timestamp.as_deref(), now_ms),
                    message: a.message.clone(),
                })
                .collect()
        });

        let errors = report.errors.as_ref().map(|log| {
            log.entries()
                .iter()
                .take(METRICS_LIST_LIMIT)
                .map(|e| ErrorRow {
                    time_ago: time_ago_since(e.timestamp.as_deref(), now_ms),
                    kind: e.kind.clone(),
                    message: e.message.clone(),
                })
                .collect()
        });

        Self {
            system,
            api,
            posts,
            activity,
            errors,
        }
    }
}

/// Drops a refresh tick while the previous one is still in flight.
#[derive(Debug, Clone, Default)]
pub struct RefreshGuard {
    busy: Rc<Cell<bool>>,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// `None` when a refresh is already running.  The guard is released when
    /// the returned permit is dropped, whatever the outcome.
    pub fn try_begin(&self) -> Option<RefreshPermit> {
        if self.busy.replace(true) {
            return None;
        }
        Some(RefreshPermit {
            busy: self.busy.clone(),
        })
    }
}

pub struct RefreshPermit {
    busy: Rc<Cell<bool>>,
}

impl Drop for RefreshPermit {
    fn drop(&mut self) {
        self.busy.set(false);
    }
}

#[derive(Clone)]
pub struct MetricsRefresher {
    api: Rc<ApiClient>,
    guard: RefreshGuard,
}

impl MetricsRefresher {
    pub fn new(api: Rc<ApiClient>) -> Self {
        Self {
            api,
            guard: RefreshGuard::new(),
        }
    }

    pub fn guard(&self) -> &RefreshGuard {
        &self.guard
    }

    /// Fetch and build a view.  `Ok(None)` means the tick was dropped.
    pub async fn refresh(&self, now_ms: f64) -> Result<Option<MetricsView>, ApiError> {
        let Some(_permit) = self.guard.try_begin() else {
            return Ok(None);
        };
        let report = self.api.get_metrics().await?;
        Ok(Some(MetricsView::from_report(&report, now_ms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionHandle;
    use crate::network::mock::MockTransport;
    use crate::network::ApiConfig;
    use crate::storage::MemoryStore;
    use futures::executor::block_on;

    fn refresher() -> (MetricsRefresher, Rc<MockTransport>) {
        let session = SessionHandle::load(Rc::new(MemoryStore::new()));
        let transport = Rc::new(MockTransport::new());
        let api = ApiClient::new(ApiConfig::default(), session, transport.clone());
        (MetricsRefresher::new(Rc::new(api)), transport)
    }

    fn report(json: &str) -> MetricsReport {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn lists_are_capped() {
        let activity: Vec<String> = (0..25)
            .map(|i| format!(r#"{{"timestamp":"2025-01-01T00:00:00Z","message":"m{}"}}"#, i))
            .collect();
        let errors: Vec<String> = (0..12)
            .map(|i| format!(r#"{{"type":"API","message":"e{}"}}"#, i))
            .collect();
        let json = format!(
            r#"{{"recent_activity":[{}],"errors":[{}]}}"#,
            activity.join(","),
            errors.join(",")
        );
        let view = MetricsView::from_report(&report(&json), 1_735_689_660_000.0);
        let activity = view.activity.unwrap();
        assert_eq!(activity.len(), 10);
        assert_eq!(activity[0].message, "m0");
        assert_eq!(activity[0].time_ago, "1m ago");
        assert_eq!(view.errors.unwrap().len(), 10);
    }

    #[test]
    fn formats_api_tiles() {
        let view = MetricsView::from_report(
            &report(r#"{"api":{"total_requests":12345,"success_rate":0.987,"avg_response_time":87.6},"system":{"online":true,"scheduled_posts":3}}"#),
            0.0,
        );
        assert_eq!(
            view.api,
            Some(ApiView {
                total_requests: "12,345".into(),
                success_rate: "98.7%".into(),
                avg_response_time: "88ms".into(),
            })
        );
        assert_eq!(view.system.unwrap().status, "Online");
        assert!(view.posts.is_none());
    }

    #[test]
    fn zero_traffic_leaves_api_tiles_alone() {
        let view = MetricsView::from_report(&report(r#"{"api":{"total_requests":0}}"#), 0.0);
        assert!(view.api.is_none());
    }

    #[test]
    fn guard_releases_on_drop() {
        let guard = RefreshGuard::new();
        let permit = guard.try_begin();
        assert!(permit.is_some());
        assert!(guard.try_begin().is_none());
        drop(permit);
        assert!(guard.try_begin().is_some());
    }

    #[test]
    fn overlapping_tick_is_dropped_without_request() {
        let (refresher, transport) = refresher();
        let _held = refresher.guard().try_begin();
        assert_eq!(block_on(refresher.refresh(0.0)), Ok(None));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn failed_refresh_releases_guard() {
        let (refresher, transport) = refresher();
        transport.fail("offline");
        assert!(block_on(refresher.refresh(0.0)).is_err());
        assert!(!refresher.guard().is_busy());
        transport.respond(200, "{}");
        assert_eq!(block_on(refresher.refresh(0.0)), Ok(Some(MetricsView::default())));
    }
}
