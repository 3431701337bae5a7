//! # Global View Context
//!
//! Builds the values every page needs (see `views::ViewContext`) once per
//! request, before routing.
//!
//! The category list is read from the database on every request. If that
//! read fails, the configured [`ContextFailurePolicy`] decides what happens.
//! With the default policy the visitor is redirected to `/` and the error only
//! appears in the logs.

use crate::auth::AuthSession;
use crate::cart::{Cart, CART_KEY};
use crate::config::ContextFailurePolicy;
use crate::db::categories;
use crate::error::{is_error_response, AppError, AppResult};
use crate::state::AppState;
use crate::views::{SessionView, ViewContext};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Populate the [`ViewContext`] for this request.
///
/// Requires the auth stages to have run. Error responses coming back from
/// later stages get a copy of the context so the error page can render the
/// site layout.
pub async fn populate(
    State(state): State<AppState>,
    auth: AuthSession,
    mut request: Request,
    next: Next,
) -> Response {
    let context = match build(&state, &auth).await {
        Ok(context) => context,
        Err(e) => return state.config.context_failure_policy.recover(e),
    };

    request.extensions_mut().insert(context.clone());
    let mut response = next.run(request).await;

    if is_error_response(&response) {
        response.extensions_mut().insert(context);
    }
    response
}

async fn build(state: &AppState, auth: &AuthSession) -> AppResult<ViewContext> {
    let session = auth.session();
    let cart = session.get::<Cart>(CART_KEY).await?;
    let categories = categories::list_by_title(&state.db).await?;

    Ok(ViewContext {
        login: auth.is_authenticated(),
        session: SessionView {
            id: session.id().map(|id| id.to_string()),
            cart,
        },
        current_user: auth.user().cloned(),
        categories,
    })
}

impl ContextFailurePolicy {
    /// Turn a context failure into the response this policy prescribes.
    pub fn recover(self, err: AppError) -> Response {
        match self {
            ContextFailurePolicy::RedirectHome => {
                tracing::error!(error = ?err, "failed to build view context, redirecting to /");
                Redirect::to("/").into_response()
            }
            ContextFailurePolicy::Propagate => err.into_response(),
        }
    }
}
