//! # Index Routes
//!
//! Mounted at `/`, after every other group.
//!
//! - `GET /`: home page with the newest products
//! - `GET /health`: liveness check
//! - `GET /add-to-cart/{id}`, `/reduce/{id}`, `/remove-all/{id}`: cart edits
//! - `GET /shopping-cart`: cart contents

use crate::cart::{Cart, CART_KEY};
use crate::db::models::Product;
use crate::db::products;
use crate::error::AppResult;
use crate::extract::Path;
use crate::handlers::health::health_check;
use crate::state::AppState;
use crate::views::{take_flash, FlashMessage, Page};
use axum::{
    extract::State,
    response::{Html, Redirect},
    routing::get,
    Router,
};
use axum_messages::Messages;
use serde::Serialize;
use tower_sessions::Session;

/// How many products the home page shows
const HOME_PRODUCT_COUNT: i64 = 8;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/add-to-cart/{id}", get(add_to_cart))
        .route("/reduce/{id}", get(reduce))
        .route("/remove-all/{id}", get(remove_all))
        .route("/shopping-cart", get(shopping_cart))
}

#[derive(Serialize)]
struct HomePage {
    products: Vec<Product>,
    messages: Vec<FlashMessage>,
}

async fn home(
    State(state): State<AppState>,
    page: Page,
    messages: Messages,
) -> AppResult<Html<String>> {
    let products = products::latest(&state.db, HOME_PRODUCT_COUNT).await?;

    page.render(
        "index.html",
        HomePage {
            products,
            messages: take_flash(messages),
        },
    )
}

async fn load_cart(session: &Session) -> AppResult<Cart> {
    Ok(session.get::<Cart>(CART_KEY).await?.unwrap_or_default())
}

/// Store the cart, or drop it from the session once it is empty.
async fn save_cart(session: &Session, cart: &Cart) -> AppResult<()> {
    if cart.is_empty() {
        session.remove::<Cart>(CART_KEY).await?;
    } else {
        session.insert(CART_KEY, cart).await?;
    }
    Ok(())
}

async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    messages: Messages,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let product = products::find_by_id(&state.db, &id).await?;

    let mut cart = load_cart(&session).await?;
    cart.add(&product);
    save_cart(&session, &cart).await?;

    messages.info(format!("Added {} to your cart", product.title));
    Ok(Redirect::to("/shopping-cart"))
}

async fn reduce(session: Session, Path(id): Path<String>) -> AppResult<Redirect> {
    let mut cart = load_cart(&session).await?;
    if cart.reduce(&id) {
        save_cart(&session, &cart).await?;
    }
    Ok(Redirect::to("/shopping-cart"))
}

async fn remove_all(session: Session, Path(id): Path<String>) -> AppResult<Redirect> {
    let mut cart = load_cart(&session).await?;
    if cart.remove_all(&id) {
        save_cart(&session, &cart).await?;
    }
    Ok(Redirect::to("/shopping-cart"))
}

#[derive(Serialize)]
struct CartPage {
    cart: Cart,
    messages: Vec<FlashMessage>,
}

async fn shopping_cart(page: Page, messages: Messages) -> AppResult<Html<String>> {
    let cart = page.context().session.cart.clone().unwrap_or_default();

    page.render(
        "cart.html",
        CartPage {
            cart,
            messages: take_flash(messages),
        },
    )
}
