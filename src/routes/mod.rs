mod certificates;
mod files;
#[cfg(test)]
mod tests;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::state::AppState;
use crate::storage::validate_file_name;

/// Headroom above the batch limit for multipart boundaries and part headers.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = (state.config.max_batch_size + MULTIPART_OVERHEAD) as usize;

    Router::new()
        .route("/", get(index))
        .route("/generate", post(certificates::generate))
        .route("/templates", get(certificates::list_templates))
        .route("/certificates/", get(missing_filename))
        .route("/certificates/:filename", get(certificates::serve_template))
        .route(
            "/upload",
            post(files::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files", get(files::list_files))
        .route("/files/", get(missing_filename))
        .route("/files/:filename", get(files::serve_file))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> &'static str {
    "Certificate service is running"
}

async fn missing_filename() -> AppError {
    AppError::bad_request("Filename is required")
}

/// Turns a path parameter into a safe name or a 400.
fn checked_file_name(filename: &str) -> Result<&str, AppError> {
    validate_file_name(filename).map_err(|e| AppError::bad_request(e.to_string()))
}

/// `scheme://host` of the incoming request, or empty when there is no Host
/// header (URLs then stay relative).
fn base_url(headers: &HeaderMap) -> String {
    let Some(host) = headers.get(header::HOST).and_then(|v| v.to_str().ok()) else {
        return String::new();
    };
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{}://{}", scheme, host)
}

/// Quoted-string form of a file name for `Content-Disposition`.
fn quoted_file_name(filename: &str) -> String {
    filename.replace('\\', "\\\\").replace('"', "\\\"")
}

fn file_response(bytes: Vec<u8>, mime: &str, filename: &str, inline: bool) -> Response {
    let disposition = if inline { "inline" } else { "attachment" };
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{}; filename=\"{}\"", disposition, quoted_file_name(filename)),
            ),
        ],
        bytes,
    )
        .into_response()
}
