//! # Sessions
//!
//! Sessions are stored in SQLite through `tower-sessions-sqlx-store`, so they
//! survive restarts. The cookie is signed with `SESSION_SECRET`.
//!
//! ## Absolute Expiry
//! A session expires a fixed time after it was first written, no matter how
//! active the visitor is:
//! 1. On the first request that leaves data in the session, we stamp it with
//!    [`ISSUED_AT_KEY`] and set the cookie/store expiry to `issued + ttl`.
//! 2. On later requests the expiry is pinned to that same instant.
//! 3. A session presented after its deadline is flushed before any handler
//!    sees it, so the visitor starts over as a new, anonymous session.

use crate::config::Config;
use crate::error::AppError;
use crate::state::AppState;
use anyhow::{anyhow, Result};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;
use time::{Duration, OffsetDateTime};
use tokio::task::JoinHandle;
use tower_sessions::{cookie::Key, session_store::ExpiredDeletion, Expiry, Session};
use tower_sessions_sqlx_store::SqliteStore;

/// Name of the session cookie
pub const COOKIE_NAME: &str = "storefront.sid";

/// Session key holding the unix timestamp the session was issued at
pub const ISSUED_AT_KEY: &str = "issued_at";

/// How often expired session rows are purged
const CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(600);

/// Create the session store and its table.
pub async fn store(db: &SqlitePool) -> Result<SqliteStore> {
    let store = SqliteStore::new(db.clone());
    // Run migrations to create the session table
    store.migrate().await?;
    Ok(store)
}

/// Cookie signing key derived from the configured secret.
pub fn signing_key(config: &Config) -> Result<Key> {
    Key::try_from(config.session_secret.as_bytes())
        .map_err(|e| anyhow!("SESSION_SECRET cannot be used as a signing key: {}", e))
}

/// Whether a session issued at `issued_at` is dead at `now`.
pub fn is_expired(issued_at: OffsetDateTime, now: OffsetDateTime, ttl: Duration) -> bool {
    now >= issued_at + ttl
}

/// Middleware pinning every session to an absolute deadline.
///
/// Must run inside the session manager layer. A session whose stamp cannot be
/// read as a timestamp is treated as expired.
pub async fn enforce_absolute_expiry(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ttl = state.config.session_ttl;
    let now = OffsetDateTime::now_utc();

    if let Some(stamp) = session.get::<i64>(ISSUED_AT_KEY).await? {
        match OffsetDateTime::from_unix_timestamp(stamp) {
            Ok(issued_at) if !is_expired(issued_at, now, ttl) => {
                session.set_expiry(Some(Expiry::AtDateTime(issued_at + ttl)));
            }
            _ => {
                tracing::debug!(issued_at = stamp, "session past its lifetime, starting over");
                session.flush().await?;
            }
        }
    }

    let response = next.run(request).await;

    // Stamp sessions that just received their first data
    if session.get::<i64>(ISSUED_AT_KEY).await?.is_none() && !session.is_empty().await {
        session.insert(ISSUED_AT_KEY, now.unix_timestamp()).await?;
        session.set_expiry(Some(Expiry::AtDateTime(now + ttl)));
    }

    Ok(response)
}

/// Start the background task that deletes expired session rows.
///
/// Expired sessions are already rejected on load; this only keeps the table
/// from growing without bound.
pub fn spawn_cleanup(store: SqliteStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            tracing::debug!("Running expired session cleanup");
            if let Err(e) = store.delete_expired().await {
                tracing::error!("Session cleanup failed: {:?}", e);
            }
        }
    })
}
