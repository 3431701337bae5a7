//! # Product Routes
//!
//! Mounted at `/products`.
//!
//! ## Routes
//! - `GET /products`: every product
//! - `GET /products/{slug}`: products of one category
//! - `GET /products/{slug}/{id}`: one product; it must belong to that category

use crate::db::models::{Category, Product};
use crate::db::{categories, products};
use crate::error::{AppError, AppResult};
use crate::extract::Path;
use crate::state::AppState;
use crate::views::Page;
use axum::{
    extract::State,
    response::Html,
    routing::get,
    Router,
};
use serde::Serialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(all_products))
        .route("/{slug}", get(by_category))
        .route("/{slug}/{id}", get(product_detail))
}

#[derive(Serialize)]
struct ProductsPage {
    #[serde(rename = "pageName")]
    page_name: String,
    products: Vec<Product>,
}

async fn all_products(State(state): State<AppState>, page: Page) -> AppResult<Html<String>> {
    let products = products::list_all(&state.db).await?;

    page.render(
        "products.html",
        ProductsPage {
            page_name: "All Products".to_string(),
            products,
        },
    )
}

async fn by_category(
    State(state): State<AppState>,
    page: Page,
    Path(slug): Path<String>,
) -> AppResult<Html<String>> {
    let category = categories::find_by_slug(&state.db, &slug).await?;
    let products = products::list_by_category(&state.db, &category.id).await?;

    page.render(
        "products.html",
        ProductsPage {
            page_name: category.title,
            products,
        },
    )
}

#[derive(Serialize)]
struct ProductPage {
    product: Product,
    category: Category,
}

async fn product_detail(
    State(state): State<AppState>,
    page: Page,
    Path((slug, id)): Path<(String, String)>,
) -> AppResult<Html<String>> {
    let category = categories::find_by_slug(&state.db, &slug).await?;
    let product = products::find_by_id(&state.db, &id).await?;

    // Don't serve /products/briefcases/<a backpack>
    if product.category_id != category.id {
        return Err(AppError::NotFound(format!(
            "Product '{}' not found in '{}'",
            id, category.title
        )));
    }

    page.render("product.html", ProductPage { product, category })
}
