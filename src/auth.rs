//! # Authentication
//!
//! Session-based authentication:
//! - Signing in stores the user's id in the session under [`USER_ID_KEY`]
//! - Every request restores the user from that id (see `middleware::auth`)
//! - Signing out removes the id and rotates the session id
//!
//! Passwords are stored as bcrypt hashes. Hashing is CPU-bound, so it runs on
//! the blocking thread pool.

use crate::db::models::User;
use crate::error::{AppError, AppResult};
use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

/// Session key holding the signed-in user's id
pub const USER_ID_KEY: &str = "user_id";

/// Session key holding the URL to return to after signing in
pub const RETURN_TO_KEY: &str = "return_to";

/// Authentication handle for the current request.
///
/// Attached by the auth initialization stage; the restore stage fills in the
/// user. Handlers extract it to check or change the sign-in state.
#[derive(Clone)]
pub struct AuthSession {
    session: Session,
    user: Option<User>,
}

impl AuthSession {
    pub fn new(session: Session) -> Self {
        Self { session, user: None }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// User id remembered in the session, if any.
    pub async fn stored_user_id(&self) -> AppResult<Option<String>> {
        Ok(self.session.get::<String>(USER_ID_KEY).await?)
    }

    /// Attach an already-loaded user to this request.
    pub fn restore(&mut self, user: User) {
        self.user = Some(user);
    }

    /// Sign `user` in.
    ///
    /// The session id is rotated first so a session fixed before sign-in
    /// cannot be reused afterwards.
    pub async fn login(&mut self, user: User) -> AppResult<()> {
        self.session.cycle_id().await?;
        self.session.insert(USER_ID_KEY, &user.id).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user signed in");
        self.user = Some(user);
        Ok(())
    }

    /// Sign out, keeping the rest of the session (e.g. the cart).
    pub async fn logout(&mut self) -> AppResult<()> {
        if let Some(user) = self.user.take() {
            tracing::info!(user_id = %user.id, "user signed out");
        }
        self.session.remove::<String>(USER_ID_KEY).await?;
        self.session.cycle_id().await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(|| AppError::Internal("authentication is not initialized".to_string()))
    }
}

/// Hash a password with bcrypt at the given cost.
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

/// Check a password against a stored bcrypt hash.
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))?
        .map_err(AppError::from)
}
