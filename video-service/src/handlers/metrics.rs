use axum::{http::header, response::IntoResponse};

use crate::services::metrics::get_metrics;

/// Prometheus scrape endpoint. Counters include `media_uploads_total`,
/// `media_orphaned_assets_total` and the auth counters.
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
