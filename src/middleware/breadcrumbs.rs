use crate::breadcrumbs::{self, Breadcrumbs};
use crate::error::is_error_response;
use axum::{extract::Request, middleware::Next, response::Response};

/// Attach the navigation trail for the request path.
///
/// Built from the full path, before nested routers strip their prefix.
pub async fn attach(mut request: Request, next: Next) -> Response {
    let trail = Breadcrumbs(breadcrumbs::build(request.uri().path()));
    request.extensions_mut().insert(trail.clone());

    let mut response = next.run(request).await;
    if is_error_response(&response) {
        response.extensions_mut().insert(trail);
    }
    response
}
