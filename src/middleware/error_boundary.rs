//! # Error Boundary
//!
//! Terminal stage for failures. Any response carrying an [`ErrorReport`]
//! (from an `AppError`, the 404 fallback, or a caught panic) is replaced by
//! the rendered error page with the report's status. Bare 4xx/5xx responses
//! from the framework or a layer get a report built from their status and
//! body, then render the same way.
//!
//! Headers set further in, such as a refreshed session cookie, are kept.

use crate::breadcrumbs::Breadcrumbs;
use crate::error::{is_error_response, ErrorReport};
use crate::state::AppState;
use crate::views::ViewContext;
use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};

/// Upper bound on an unreported error body kept as the report detail.
const MAX_DETAIL_BYTES: usize = 16 * 1024;

pub async fn render(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if !is_error_response(&response) {
        return response;
    }

    let reported = response.extensions().get::<ErrorReport>().cloned();
    let context = response.extensions().get::<ViewContext>().cloned().unwrap_or_default();
    let trail = response.extensions().get::<Breadcrumbs>().cloned().unwrap_or_default();

    let (mut parts, body) = response.into_parts();
    let (report, body) = match reported {
        Some(report) => (report, body),
        None => {
            let detail = match body::to_bytes(body, MAX_DETAIL_BYTES).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    tracing::warn!(error = ?e, "could not read error response body");
                    String::new()
                }
            };
            let report = unreported(parts.status, detail.clone());
            (report, Body::from(detail))
        }
    };
    parts.status = report.status;

    match state
        .views
        .render_error(&report, &context, &trail, state.config.mode)
    {
        Ok(html) => {
            parts.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(html))
        }
        Err(e) => {
            // Fall back to the plain-text body the report already carries
            tracing::error!(error = ?e, "failed to render error page");
            Response::from_parts(parts, body)
        }
    }
}

fn unreported(status: StatusCode, detail: String) -> ErrorReport {
    tracing::debug!(%status, "rendering error response without a report");
    let message = status.canonical_reason().unwrap_or("Error");
    ErrorReport::new(status, message, detail)
}
