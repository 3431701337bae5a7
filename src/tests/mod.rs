//! Test helpers and in-process tests for the assembled application.
//!
//! Every test gets its own in-memory SQLite database with the seed data and
//! drives the full pipeline with `oneshot()`, no network involved.
//!
//! ## Available Helpers
//!
//! - Configuration: `test_config()`
//! - State: `test_state()`, `test_app()`, `test_app_with()`
//! - Requests: `get()`, `post_form()`, `TestClient` (keeps cookies between requests)
//! - Responses: `body_string()`, `session_cookie()`, `location()`

use crate::config::{Config, RuntimeMode};
use crate::db::users;
use crate::routes;
use crate::state::AppState;
use crate::{auth, pipeline, session};
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::BTreeMap;
use std::path::Path;
use tower::ServiceExt;
use tower_sessions_sqlx_store::SqliteStore;

#[cfg(test)]
pub(crate) mod pipeline_order;

// ============================================================================
// Configuration and State
// ============================================================================

const TEST_SECRET: &str =
    "test-secret-test-secret-test-secret-test-secret-test-secret-test-secret";

/// Development config pointing at the crate's own views and public files,
/// with the cheapest bcrypt cost.
pub(crate) fn test_config() -> Config {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut config = Config::from_lookup(|key| match key {
        "SESSION_SECRET" => Some(TEST_SECRET.to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .expect("test config");

    config.public_dir = root.join("public");
    config.views_dir = root.join("views");
    config
}

/// Fresh migrated in-memory database plus its session store.
///
/// A single connection that never idles out keeps the in-memory database
/// alive for the whole test.
pub(crate) async fn test_state_with(config: Config) -> (AppState, SqliteStore) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");

    let state = AppState::with_pool(config, pool).await.expect("app state");
    let store = session::store(&state.db).await.expect("session store");
    (state, store)
}

pub(crate) async fn test_state() -> (AppState, SqliteStore) {
    test_state_with(test_config()).await
}

/// The full application over a fresh database.
pub(crate) async fn test_app() -> (Router, AppState) {
    test_app_with(test_config(), routes::mount_table()).await
}

pub(crate) async fn test_app_with(config: Config, mounts: Vec<routes::Mount>) -> (Router, AppState) {
    let (state, store) = test_state_with(config).await;
    let app = pipeline::assemble(state.clone(), store, mounts).expect("assemble pipeline");
    (app, state)
}

pub(crate) fn production_config() -> Config {
    let mut config = test_config();
    config.mode = RuntimeMode::Production;
    config
}

/// Insert a user with a known password.
pub(crate) async fn seed_user(state: &AppState, username: &str, password: &str, is_admin: bool) {
    let hash = auth::hash_password(password.to_string(), 4)
        .await
        .expect("hash password");
    users::create_user(
        &state.db,
        username,
        &format!("{}@example.com", username),
        &hash,
        is_admin,
    )
    .await
    .expect("create user");
}

/// Make the category query fail for every following request.
pub(crate) async fn break_categories(state: &AppState) {
    sqlx::query("ALTER TABLE categories RENAME TO categories_gone")
        .execute(&state.db)
        .await
        .expect("rename categories");
}

// ============================================================================
// Request and Response Helpers
// ============================================================================

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub(crate) fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("request")
}

pub(crate) async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// `name=value` of the first cookie the response sets.
pub(crate) fn session_cookie(response: &Response) -> Option<String> {
    let set_cookie = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    set_cookie.split(';').next().map(|pair| pair.trim().to_string())
}

pub(crate) fn location(response: &Response) -> Option<&str> {
    response.headers().get(header::LOCATION)?.to_str().ok()
}

/// Drives an app like a browser would with respect to cookies: every cookie
/// the server sets is sent back on later requests.
pub(crate) struct TestClient {
    app: Router,
    cookies: BTreeMap<String, String>,
}

impl TestClient {
    pub(crate) fn new(app: Router) -> Self {
        Self {
            app,
            cookies: BTreeMap::new(),
        }
    }

    pub(crate) async fn send(&mut self, mut request: Request<Body>) -> Response {
        if !self.cookies.is_empty() {
            let header_value = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            request
                .headers_mut()
                .insert(header::COOKIE, header_value.parse().expect("cookie header"));
        }

        let response = self.app.clone().oneshot(request).await.expect("infallible");

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let Ok(set_cookie) = set_cookie.to_str() else {
                continue;
            };
            let Some((name, value)) = set_cookie
                .split(';')
                .next()
                .and_then(|pair| pair.trim().split_once('='))
            else {
                continue;
            };
            let removed = set_cookie.contains("Max-Age=0") || value.is_empty();
            if removed {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        response
    }

    pub(crate) async fn get(&mut self, uri: &str) -> Response {
        self.send(get(uri)).await
    }

    pub(crate) async fn post_form(&mut self, uri: &str, form: &str) -> Response {
        self.send(post_form(uri, form)).await
    }

    pub(crate) fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub(crate) async fn sign_in(&mut self, username: &str, password: &str) -> Response {
        self.post_form(
            "/user/signin",
            &format!("username={}&password={}", username, password),
        )
        .await
    }
}
