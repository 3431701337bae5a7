//! # HTTP Request Handlers
//!
//! One module per mounted route group (see `routes::mount_table`), plus the
//! health check.
//!
//! ## Handler Pattern
//! Handlers are async functions that:
//! 1. Extract data from the request (path params, form body, session, view context)
//! 2. Call business logic (database operations, cart updates)
//! 3. Return a rendered page or a redirect
//!
//! ## Example Handler
//! ```rust,ignore
//! pub async fn my_handler(
//!     State(state): State<AppState>,   // Shared app state
//!     page: Page,                      // Per-request view context
//! ) -> AppResult<Html<String>> {
//!     page.render("my_page.html", MyData { ... })
//! }
//! ```

pub mod admin;
pub mod health;
pub mod index;
pub mod pages;
pub mod products;
pub mod user;
