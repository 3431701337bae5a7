//! # Health Check Handler
//!
//! Simple endpoint to check if the server is running.
//! Used by load balancers and monitoring systems.

use axum::Json;
use serde_json::{json, Value};

/// Health check endpoint
///
/// ## Route
/// GET /health
///
/// ## Response
/// ```json
/// {
///   "status": "healthy",
///   "service": "storefront"
/// }
/// ```
///
/// Note this still passes through the session and context stages like any
/// other dynamic route, so it also fails if the category query fails.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "storefront"
    }))
}
