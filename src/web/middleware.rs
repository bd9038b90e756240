//! Shared state and middleware
//!
//! - Request statistics (shown on the home page)
//! - Error page rendering for `WebError` responses

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tera::Context as TeraContext;

use super::error::ErrorPage;
use super::page::nav_lookups;
use crate::config::{PagingConfig, UploadConfig};
use crate::services::Services;
use crate::views::ViewEngine;

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    /// Sum of response times in microseconds
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> StatsView {
        StatsView {
            total_requests: self.total_requests(),
            avg_response_ms: self.avg_response_time_us() / 1000.0,
            uptime_seconds: self.uptime_seconds(),
        }
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub total_requests: u64,
    pub avg_response_ms: f64,
    pub uptime_seconds: u64,
}

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub views: Arc<ViewEngine>,
    pub paging: Arc<PagingConfig>,
    pub upload_config: Arc<UploadConfig>,
    pub request_stats: Arc<RequestStats>,
}

/// Request statistics middleware
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state
        .request_stats
        .record(start.elapsed().as_micros() as u64);
    response
}

/// Replace the plain body of a `WebError` response with `error.html`
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    let mut context = TeraContext::new();
    context.insert("title", "Greška");
    context.insert("status", &page.status.as_u16());
    context.insert("reason", page.status.canonical_reason().unwrap_or(""));
    context.insert("message", &page.message);
    context.insert("nav_lookups", &nav_lookups());

    let html = state
        .views
        .render_with_fallback("error.html", &context, &page.message);
    (page.status, Html(html)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_stats() {
        let stats = RequestStats::new();
        assert_eq!(stats.avg_response_time_us(), 0.0);

        stats.record(1000);
        stats.record(3000);
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.avg_response_time_us(), 2000.0);

        let view = stats.snapshot();
        assert_eq!(view.total_requests, 2);
        assert_eq!(view.avg_response_ms, 2.0);
    }
}
