//! # Request Pipeline
//!
//! Every request runs through the stages in [`PIPELINE`], outermost first.
//! A stage may answer the request itself (short-circuit), in which case no
//! later stage runs; responses always travel back out through the earlier
//! stages.
//!
//! ```text
//! Logging → BodyParsing → StaticFiles ─┬─ file found: done
//!                                      └─ ErrorBoundary → Session → Flash
//!                                         → AuthInit → AuthRestore
//!                                         → GlobalContext → Breadcrumbs → Routes
//! ```

use crate::error::panic_response;
use crate::middleware::{auth, breadcrumbs, context, error_boundary};
use crate::routes::{self, Mount};
use crate::session;
use crate::state::AppState;
use anyhow::{anyhow, bail, Result};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use axum_messages::MessagesManagerLayer;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, services::ServeDir,
    trace::TraceLayer,
};
use tower_sessions::{cookie::SameSite, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

/// One named stage of the request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request/response tracing. Never short-circuits.
    Logging,
    /// Body size limit and cookie parsing. Rejects oversized bodies with 413.
    BodyParsing,
    /// Serves files from the public directory. Short-circuits when a file
    /// matches; otherwise hands the request to the dynamic chain.
    StaticFiles,
    /// Loads the session and pins it to its absolute expiry. Fails the
    /// request only when the store is unreachable.
    Session,
    /// Flash messages stored in the session. Never short-circuits.
    Flash,
    /// Attaches an anonymous auth handle to the request.
    AuthInit,
    /// Loads the signed-in user from the session.
    AuthRestore,
    /// Builds the view context. Short-circuits with a redirect to `/` (or
    /// an error, depending on policy) when the categories cannot be read.
    GlobalContext,
    /// Builds the breadcrumb trail from the path. Never short-circuits.
    Breadcrumbs,
    /// Route groups in mount order, then the 404 fallback.
    Routes,
    /// Renders any error produced by the stages it wraps through the error
    /// view.
    ErrorBoundary,
}

/// Stages in the order a request meets them.
///
/// The error boundary is entered right after static files and wraps every
/// later stage, so it is listed there.
pub const PIPELINE: [Stage; 11] = [
    Stage::Logging,
    Stage::BodyParsing,
    Stage::StaticFiles,
    Stage::ErrorBoundary,
    Stage::Session,
    Stage::Flash,
    Stage::AuthInit,
    Stage::AuthRestore,
    Stage::GlobalContext,
    Stage::Breadcrumbs,
    Stage::Routes,
];

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Logging => "logging",
            Stage::BodyParsing => "body-parsing",
            Stage::StaticFiles => "static-files",
            Stage::Session => "session",
            Stage::Flash => "flash",
            Stage::AuthInit => "auth-init",
            Stage::AuthRestore => "auth-restore",
            Stage::GlobalContext => "global-context",
            Stage::Breadcrumbs => "breadcrumbs",
            Stage::Routes => "routes",
            Stage::ErrorBoundary => "error-boundary",
        }
    }

    /// Whether this stage can answer a request without running later stages.
    pub fn short_circuits(self) -> bool {
        matches!(
            self,
            Stage::BodyParsing
                | Stage::StaticFiles
                | Stage::Session
                | Stage::GlobalContext
                | Stage::Routes
        )
    }
}

/// Build the full application from its state, session store and route
/// groups, layering the stages in [`PIPELINE`] order.
///
/// Fails if the mount table is invalid or the session secret cannot be used
/// as a signing key.
pub fn assemble(state: AppState, store: SqliteStore, mounts: Vec<Mount>) -> Result<Router> {
    assemble_stages(&PIPELINE, state, store, mounts)
}

/// Split a stage list around [`Stage::StaticFiles`] into the stages that
/// run before it and the stages of the dynamic chain behind it (without the
/// final [`Stage::Routes`]).
fn sections(stages: &[Stage]) -> Result<(&[Stage], &[Stage])> {
    for (i, stage) in stages.iter().enumerate() {
        if stages[..i].contains(stage) {
            bail!("stage '{}' is listed more than once", stage.name());
        }
    }
    if let Some(missing) = PIPELINE.iter().find(|stage| !stages.contains(stage)) {
        bail!("stage '{}' is missing", missing.name());
    }

    let Some((Stage::Routes, rest)) = stages.split_last() else {
        bail!("the routes stage must be last");
    };
    let split = rest
        .iter()
        .position(|stage| *stage == Stage::StaticFiles)
        .ok_or_else(|| anyhow!("stage 'static-files' is missing"))?;

    Ok((&rest[..split], &rest[split + 1..]))
}

fn assemble_stages(
    stages: &[Stage],
    state: AppState,
    store: SqliteStore,
    mounts: Vec<Mount>,
) -> Result<Router> {
    let config = state.config.clone();
    let (outer, inner) = sections(stages)?;

    tracing::debug!(
        stages = ?stages.iter().map(|stage| stage.name()).collect::<Vec<_>>(),
        "assembling request pipeline"
    );

    let session_layer = SessionManagerLayer::new(store)
        .with_name(session::COOKIE_NAME)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(config.mode.is_production())
        .with_signed(session::signing_key(&config)?);

    // Layers wrap what is already there, so the innermost stage goes first
    let mut dynamic = routes::compose(mounts)?.layer(CatchPanicLayer::custom(panic_response));
    for stage in inner.iter().rev() {
        dynamic = match stage {
            Stage::ErrorBoundary => {
                dynamic.layer(from_fn_with_state(state.clone(), error_boundary::render))
            }
            Stage::Session => dynamic
                .layer(from_fn_with_state(state.clone(), session::enforce_absolute_expiry))
                .layer(session_layer.clone()),
            Stage::Flash => dynamic.layer(MessagesManagerLayer),
            Stage::AuthInit => dynamic.layer(from_fn(auth::initialize)),
            Stage::AuthRestore => {
                dynamic.layer(from_fn_with_state(state.clone(), auth::restore_user))
            }
            Stage::GlobalContext => {
                dynamic.layer(from_fn_with_state(state.clone(), context::populate))
            }
            Stage::Breadcrumbs => dynamic.layer(from_fn(breadcrumbs::attach)),
            Stage::Logging | Stage::BodyParsing | Stage::StaticFiles | Stage::Routes => {
                bail!("stage '{}' must run before static files", stage.name())
            }
        };
    }

    let static_files = ServeDir::new(&config.public_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(dynamic.with_state(state));

    let mut app = Router::new().fallback_service(static_files);
    for stage in outer.iter().rev() {
        app = match stage {
            Stage::Logging => app.layer(TraceLayer::new_for_http()),
            Stage::BodyParsing => app
                .layer(CookieManagerLayer::new())
                .layer(RequestBodyLimitLayer::new(config.max_body_bytes)),
            _ => bail!("stage '{}' must run after static files", stage.name()),
        };
    }

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(stage: Stage) -> usize {
        PIPELINE.iter().position(|s| *s == stage).unwrap()
    }

    #[test]
    fn every_stage_appears_once() {
        let mut names: Vec<_> = PIPELINE.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PIPELINE.len());
    }

    #[test]
    fn static_files_come_before_session_work() {
        assert!(position(Stage::StaticFiles) < position(Stage::Session));
        assert!(position(Stage::StaticFiles) < position(Stage::AuthRestore));
        assert!(position(Stage::StaticFiles) < position(Stage::GlobalContext));
    }

    #[test]
    fn auth_and_context_order() {
        assert!(position(Stage::Session) < position(Stage::Flash));
        assert!(position(Stage::Flash) < position(Stage::AuthInit));
        assert!(position(Stage::AuthInit) < position(Stage::AuthRestore));
        assert!(position(Stage::AuthRestore) < position(Stage::GlobalContext));
        assert!(position(Stage::GlobalContext) < position(Stage::Breadcrumbs));
        assert!(position(Stage::Breadcrumbs) < position(Stage::Routes));
    }

    #[test]
    fn pipeline_splits_around_static_files() {
        let (outer, inner) = sections(&PIPELINE).unwrap();
        assert_eq!(outer, &[Stage::Logging, Stage::BodyParsing]);
        assert_eq!(inner.first(), Some(&Stage::ErrorBoundary));
        assert_eq!(inner.last(), Some(&Stage::Breadcrumbs));
    }

    #[test]
    fn routes_must_be_last() {
        let mut stages = PIPELINE;
        stages.swap(9, 10);
        let err = sections(&stages).unwrap_err();
        assert!(err.to_string().contains("last"));
    }

    #[test]
    fn stages_are_listed_once() {
        let mut stages = PIPELINE;
        stages[5] = Stage::Session;
        let err = sections(&stages).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[tokio::test]
    async fn session_work_cannot_move_before_static_files() {
        let mut stages = PIPELINE;
        // Session ahead of static files
        stages.swap(2, 4);
        let (state, store) = crate::tests::test_state().await;

        match assemble_stages(&stages, state, store, routes::mount_table()) {
            Err(err) => assert!(err.to_string().contains("must run after static files")),
            Ok(_) => panic!("misplaced session stage was accepted"),
        }
    }

    #[test]
    fn error_boundary_wraps_the_dynamic_chain() {
        assert!(position(Stage::ErrorBoundary) > position(Stage::StaticFiles));
        assert!(position(Stage::ErrorBoundary) < position(Stage::Session));
        assert!(!Stage::ErrorBoundary.short_circuits());
    }
}
