//! # Admin Handlers
//!
//! Mounted at `/admin`. Every route requires an admin user: anonymous
//! visitors are sent to sign in, other users get a 403.
//!
//! ## Routes
//! - `GET /admin`: dashboard with record counts
//! - `GET /admin/categories`: category list
//! - `POST /admin/categories`: create a category

use crate::db::{categories, products, users};
use crate::error::{AppError, AppResult};
use crate::extract::Form;
use crate::middleware::auth::require_admin;
use crate::state::AppState;
use crate::views::{take_flash, FlashMessage, Page};
use axum::{
    extract::State,
    middleware::from_fn,
    response::{Html, Redirect},
    routing::get,
    Router,
};
use axum_messages::Messages;
use serde::{Deserialize, Serialize};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/categories", get(list_categories).post(create_category))
        .route_layer(from_fn(require_admin))
}

#[derive(Serialize)]
struct DashboardPage {
    category_count: i64,
    product_count: i64,
    user_count: i64,
}

async fn dashboard(State(state): State<AppState>, page: Page) -> AppResult<Html<String>> {
    let (category_count, product_count, user_count) = tokio::try_join!(
        categories::count(&state.db),
        products::count(&state.db),
        users::count(&state.db),
    )?;

    page.render(
        "admin/dashboard.html",
        DashboardPage {
            category_count,
            product_count,
            user_count,
        },
    )
}

#[derive(Serialize)]
struct CategoriesPage {
    messages: Vec<FlashMessage>,
}

/// The categories themselves come from the shared view context.
async fn list_categories(page: Page, messages: Messages) -> AppResult<Html<String>> {
    page.render(
        "admin/categories.html",
        CategoriesPage {
            messages: take_flash(messages),
        },
    )
}

#[derive(Debug, Deserialize)]
pub struct NewCategoryForm {
    pub title: String,
}

async fn create_category(
    State(state): State<AppState>,
    messages: Messages,
    Form(form): Form<NewCategoryForm>,
) -> AppResult<Redirect> {
    match categories::create(&state.db, &form.title).await {
        Ok(category) => {
            tracing::info!(category = %category.title, "category created");
            messages.info(format!("Created category {}", category.title));
        }
        Err(AppError::BadRequest(problem)) => {
            messages.error(problem);
        }
        Err(e) => return Err(e),
    }

    Ok(Redirect::to("/admin/categories"))
}
