//! `/metrics` page auto-refresh.
//!
//! One 5 s polling loop.  Ticks that arrive while a request is in flight are
//! dropped by the refresher's guard; pausing drops the interval and leaves
//! the last rendered numbers on screen.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Local;
use gloo_timers::callback::Interval;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::constants::METRICS_POLL_MS;
use crate::dom_utils;
use crate::network::ApiClient;
use crate::state::metrics::{ActivityRow, ErrorRow, MetricsRefresher, MetricsView};
use crate::utils::{escape_html, now_ms};

thread_local! {
    static PANEL: RefCell<Option<MetricsPanel>> = RefCell::new(None);
}

#[derive(Clone)]
struct MetricsPanel {
    refresher: MetricsRefresher,
    interval: Rc<RefCell<Option<Interval>>>,
}

pub fn mount(api: Rc<ApiClient>) {
    let panel = MetricsPanel {
        refresher: MetricsRefresher::new(api),
        interval: Rc::new(RefCell::new(None)),
    };
    PANEL.with(|p| *p.borrow_mut() = Some(panel.clone()));
    panel.start();
    debug_log!("Metrics auto-refresh initialized");
}

fn with_panel(f: impl FnOnce(&MetricsPanel)) {
    if let Some(panel) = PANEL.with(|p| p.borrow().clone()) {
        f(&panel);
    }
}

#[wasm_bindgen(js_name = startMetricsAutoRefresh)]
pub fn start_metrics_auto_refresh() {
    with_panel(MetricsPanel::start);
}

#[wasm_bindgen(js_name = stopMetricsAutoRefresh)]
pub fn stop_metrics_auto_refresh() {
    with_panel(MetricsPanel::stop);
}

#[wasm_bindgen(js_name = pauseMetricsRefresh)]
pub fn pause_metrics_refresh() {
    with_panel(MetricsPanel::stop);
    debug_log!("Metrics auto-refresh paused");
}

#[wasm_bindgen(js_name = resumeMetricsRefresh)]
pub fn resume_metrics_refresh() {
    with_panel(MetricsPanel::start);
    debug_log!("Metrics auto-refresh resumed");
}

/// Refresh once and resolve to the rendered view, or `null` when a refresh
/// was already running.
#[wasm_bindgen(js_name = refreshMetrics)]
pub async fn refresh_metrics() -> Result<JsValue, JsValue> {
    let Some(panel) = PANEL.with(|p| p.borrow().clone()) else {
        return Ok(JsValue::NULL);
    };
    match panel.refresh().await {
        Some(view) => Ok(serde_wasm_bindgen::to_value(&view)?),
        None => Ok(JsValue::NULL),
    }
}

impl MetricsPanel {
    fn start(&self) {
        self.tick();
        let panel = self.clone();
        let interval = Interval::new(METRICS_POLL_MS, move || panel.tick());
        // Replacing drops (and so clears) any interval already running.
        *self.interval.borrow_mut() = Some(interval);
    }

    fn stop(&self) {
        self.interval.borrow_mut().take();
    }

    fn tick(&self) {
        let panel = self.clone();
        spawn_local(async move {
            panel.refresh().await;
        });
    }

    async fn refresh(&self) -> Option<MetricsView> {
        match self.refresher.refresh(now_ms()).await {
            Ok(Some(view)) => {
                render(&view);
                render_last_refresh();
                Some(view)
            }
            Ok(None) => None,
            Err(e) => {
                error_log!("Error refreshing metrics: {}", e);
                None
            }
        }
    }
}

fn render(view: &MetricsView) {
    if let Some(system) = &view.system {
        dom_utils::set_text_by_id("systemStatus", system.status);
        dom_utils::set_text_by_id("scheduledPosts", &system.scheduled_posts.to_string());
        dom_utils::set_text_by_id("completedPosts", &system.completed_posts.to_string());
    }
    if let Some(api) = &view.api {
        dom_utils::set_text_by_id("totalRequests", &api.total_requests);
        dom_utils::set_text_by_id("successRate", &api.success_rate);
        dom_utils::set_text_by_id("avgResponseTime", &api.avg_response_time);
    }
    if let Some(posts) = &view.posts {
        dom_utils::set_text_by_id("totalPosts", &posts.total.to_string());
        dom_utils::set_text_by_id("successfulPosts", &posts.successful.to_string());
        dom_utils::set_text_by_id("failedPosts", &posts.failed.to_string());
        dom_utils::set_text_by_id("pendingPosts", &posts.pending.to_string());
    }
    if let Some(rows) = &view.activity {
        set_list("recentActivityList", &activity_html(rows));
    }
    if let Some(rows) = &view.errors {
        set_list("errorLogsList", &errors_html(rows));
    }
}

fn set_list(id: &str, html: &str) {
    if let Some(el) = dom_utils::by_id(id) {
        el.set_inner_html(html);
    }
}

fn activity_html(rows: &[ActivityRow]) -> String {
    if rows.is_empty() {
        return r#"<p class="empty-message">No recent activity</p>"#.to_string();
    }
    rows.iter()
        .map(|r| {
            format!(
                r#"<div class="activity-item"><span class="activity-time">{}</span><span class="activity-message">{}</span></div>"#,
                escape_html(&r.time_ago),
                escape_html(&r.message)
            )
        })
        .collect()
}

fn errors_html(rows: &[ErrorRow]) -> String {
    if rows.is_empty() {
        return r#"<p class="empty-message">No errors logged</p>"#.to_string();
    }
    rows.iter()
        .map(|r| {
            format!(
                r#"<div class="error-item"><span class="error-time">{}</span><span class="error-type">{}</span><span class="error-message">{}</span></div>"#,
                escape_html(&r.time_ago),
                escape_html(&r.kind),
                escape_html(&r.message)
            )
        })
        .collect()
}

fn render_last_refresh() {
    let label = format!("Last updated: {}", Local::now().format("%H:%M:%S"));
    dom_utils::set_text_by_id("lastRefresh", &label);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_render_placeholders() {
        assert!(activity_html(&[]).contains("No recent activity"));
        assert!(errors_html(&[]).contains("No errors logged"));
    }

    #[test]
    fn error_rows_are_escaped() {
        let html = errors_html(&[ErrorRow {
            time_ago: "5s ago".into(),
            kind: "API".into(),
            message: "<script>".into(),
        }]);
        assert!(html.contains(r#"<span class="error-type">API</span>"#));
        assert!(html.contains("&lt;script&gt;"));
    }
}
