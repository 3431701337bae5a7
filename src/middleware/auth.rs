use crate::auth::{AuthSession, RETURN_TO_KEY};
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Where anonymous visitors are sent when a page requires sign-in
pub const SIGN_IN_PATH: &str = "/user/signin";

/// Attach an anonymous [`AuthSession`] to the request.
///
/// Must run inside the session layer and before [`restore_user`].
pub async fn initialize(session: Session, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(AuthSession::new(session));
    next.run(request).await
}

/// Load the user whose id is stored in the session.
///
/// A stored id that no longer matches a user (account deleted) signs the
/// session out instead of failing the request.
pub async fn restore_user(
    State(state): State<AppState>,
    mut auth: AuthSession,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    if let Some(user_id) = auth.stored_user_id().await? {
        match users::find_by_id(&state.db, &user_id).await {
            Ok(user) => auth.restore(user),
            Err(AppError::NotFound(_)) => {
                tracing::warn!(user_id = %user_id, "session refers to a missing user, signing out");
                auth.logout().await?;
            }
            Err(e) => return Err(e),
        }
    }

    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

/// Only let signed-in users through.
///
/// Anonymous visitors are redirected to the sign-in page; the URL they asked
/// for is remembered so sign-in can send them back.
pub async fn require_auth(
    auth: AuthSession,
    OriginalUri(uri): OriginalUri,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    if auth.is_authenticated() {
        return Ok(next.run(request).await);
    }

    auth.session().insert(RETURN_TO_KEY, uri.to_string()).await?;
    Ok(Redirect::to(SIGN_IN_PATH).into_response())
}

/// Only let admins through.
pub async fn require_admin(
    auth: AuthSession,
    OriginalUri(uri): OriginalUri,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    match auth.user() {
        Some(user) if user.is_admin => Ok(next.run(request).await),
        Some(user) => Err(AppError::Forbidden(format!(
            "'{}' is not an administrator",
            user.username
        ))),
        None => {
            auth.session().insert(RETURN_TO_KEY, uri.to_string()).await?;
            Ok(Redirect::to(SIGN_IN_PATH).into_response())
        }
    }
}
