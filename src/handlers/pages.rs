//! # Static Content Pages
//!
//! Mounted at `/pages`. Each page is a template under `views/pages/`.

use crate::error::{AppError, AppResult};
use crate::extract::Path;
use crate::state::AppState;
use crate::views::Page;
use axum::{response::Html, routing::get, Router};

/// Pages that exist; anything else is a 404
const PAGES: &[&str] = &["about-us", "shipping-policy", "careers"];

pub fn router() -> Router<AppState> {
    Router::new().route("/{page}", get(show))
}

async fn show(page: Page, Path(name): Path<String>) -> AppResult<Html<String>> {
    if !PAGES.contains(&name.as_str()) {
        return Err(AppError::NotFound(format!("Page '{}' not found", name)));
    }

    page.render_plain(&format!("pages/{}.html", name))
}
