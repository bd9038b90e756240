//! Web layer - HTML pages and routing
//!
//! Every entity gets the same set of routes under its base path:
//! list, create, edit, delete, Excel/PDF export and Excel import.
//! Projects, cards and requests also have a detail page.

pub mod autocomplete;
pub mod common;
pub mod crud;
pub mod dokumentacija;
pub mod error;
pub mod flash;
pub mod form;
pub mod home;
pub mod kartice;
pub mod lookups;
pub mod middleware;
pub mod osobe;
pub mod page;
pub mod partneri;
pub mod poslovi;
pub mod projekti;
pub mod static_files;
pub mod transakcije;
pub mod zadaci;
pub mod zahtjevi;

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::models::LookupKind;
use error::WebError;

pub use middleware::{AppState, RequestStats};

/// Room for multipart framing around the largest accepted file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

async fn not_found() -> WebError {
    WebError::NotFound("Stranica ne postoji".to_string())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.upload_config.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let mut router = Router::new()
        .route("/", get(home::home))
        .route("/autocomplete/{source}", get(autocomplete::suggest))
        .route("/static/{*path}", get(static_files::serve))
        .nest("/projekti", projekti::router())
        .nest("/osobe", osobe::router())
        .nest("/partneri", partneri::router())
        .nest("/poslovi", poslovi::router())
        .nest("/dokumentacija", dokumentacija::router())
        .nest("/kartice", kartice::router())
        .nest("/transakcije", transakcije::router())
        .nest("/zahtjevi", zahtjevi::router())
        .nest("/zadaci", zadaci::router());

    for kind in LookupKind::ALL {
        router = router.nest(kind.path(), lookups::router(kind));
    }

    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::render_error_pages,
        ))
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
