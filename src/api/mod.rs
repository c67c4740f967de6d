//! API layer
//!
//! HTTP handlers for:
//! - Visita status updates, creation and listing
//! - Attachment uploads
//! - Weather proxy
//! - Page shells and the offline fallback
//! - Metrics (Prometheus)

pub mod metrics;
mod pages;
mod upload;
mod visitas;
mod weather;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use crate::AppState;

pub use metrics::metrics_router;
pub use pages::{not_found, pages_router};
pub use upload::MAX_UPLOAD_BYTES;

/// Multipart framing on top of the file itself
const UPLOAD_BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the JSON API router
///
/// Routes:
/// - GET /visitas - Caller's visitas
/// - POST /visitas - Create visita
/// - POST /visitas/estado - Update visita estado
/// - POST /upload - Upload firma/foto
/// - GET /weather - Current weather at lat/lng
pub fn api_router() -> Router<AppState> {
    let upload_routes = Router::new()
        .route("/upload", post(upload::upload_file))
        .layer(DefaultBodyLimit::max(
            MAX_UPLOAD_BYTES + UPLOAD_BODY_OVERHEAD_BYTES,
        ));

    Router::new()
        .route(
            "/visitas",
            get(visitas::list_visitas).post(visitas::create_visita),
        )
        .route("/visitas/estado", post(visitas::update_estado))
        .route("/weather", get(weather::current_weather))
        .merge(upload_routes)
}
