//! # Views
//!
//! Server-side rendering with minijinja templates loaded from `VIEWS_DIR`.
//!
//! ## View Contract
//! Every rendered page receives:
//! - `login`: whether the visitor is signed in
//! - `session`: the visitor's session id and cart
//! - `currentUser`: the signed-in user, or nothing
//! - `categories`: all categories ordered by title
//! - `breadcrumbs`: the navigation trail for the current path
//!
//! Error pages additionally receive `message` and `error`.

use crate::breadcrumbs::Breadcrumbs;
use crate::cart::Cart;
use crate::config::RuntimeMode;
use crate::db::models::{Category, User};
use crate::error::{AppError, AppResult, ErrorReport};
use crate::state::AppState;
use axum::{extract::FromRequestParts, http::request::Parts, response::Html};
use axum_messages::Messages;
use minijinja::Environment;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Loaded template environment. Cheap to clone.
#[derive(Clone)]
pub struct Views {
    env: Arc<Environment<'static>>,
}

impl Views {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir.as_ref()));
        env.add_filter("money", money);

        Self { env: Arc::new(env) }
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> AppResult<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }

    /// Render `error.html` for a report.
    ///
    /// `error` carries the status and the full detail in development and is
    /// an empty object in production.
    pub fn render_error(
        &self,
        report: &ErrorReport,
        context: &ViewContext,
        breadcrumbs: &Breadcrumbs,
        mode: RuntimeMode,
    ) -> AppResult<String> {
        let error = if mode.is_development() {
            ErrorDetail {
                status: Some(report.status.as_u16()),
                stack: Some(report.detail.clone()),
            }
        } else {
            ErrorDetail::default()
        };

        self.render(
            "error.html",
            ErrorPage {
                context,
                breadcrumbs,
                message: &report.message,
                error,
            },
        )
    }
}

/// Format cents as dollars: `5900` → `$59.00`.
fn money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}

/// Per-request values shared by every page.
///
/// Built by the global context stage and stored in request extensions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewContext {
    pub login: bool,
    pub session: SessionView,
    #[serde(rename = "currentUser")]
    pub current_user: Option<User>,
    pub categories: Vec<Category>,
}

/// What templates may see of the session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionView {
    pub id: Option<String>,
    pub cart: Option<Cart>,
}

#[derive(Serialize)]
struct PageData<'a, T> {
    #[serde(flatten)]
    context: &'a ViewContext,
    breadcrumbs: &'a Breadcrumbs,
    #[serde(flatten)]
    data: T,
}

#[derive(Serialize)]
struct ErrorPage<'a> {
    #[serde(flatten)]
    context: &'a ViewContext,
    breadcrumbs: &'a Breadcrumbs,
    message: &'a str,
    error: ErrorDetail,
}

#[derive(Debug, Default, Serialize)]
struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

#[derive(Serialize)]
struct NoData {}

/// Extractor that renders templates with the request's view context.
///
/// ```rust,ignore
/// async fn about(page: Page) -> AppResult<Html<String>> {
///     page.render_plain("pages/about-us.html")
/// }
/// ```
pub struct Page {
    views: Views,
    context: ViewContext,
    breadcrumbs: Breadcrumbs,
}

impl Page {
    pub fn context(&self) -> &ViewContext {
        &self.context
    }

    /// Render `template` with the shared context plus the fields of `data`.
    pub fn render<T: Serialize>(&self, template: &str, data: T) -> AppResult<Html<String>> {
        let html = self.views.render(
            template,
            PageData {
                context: &self.context,
                breadcrumbs: &self.breadcrumbs,
                data,
            },
        )?;
        Ok(Html(html))
    }

    pub fn render_plain(&self, template: &str) -> AppResult<Html<String>> {
        self.render(template, NoData {})
    }
}

impl FromRequestParts<AppState> for Page {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<ViewContext>()
            .cloned()
            .ok_or_else(|| AppError::Internal("view context missing from request".to_string()))?;
        let breadcrumbs = parts.extensions.get::<Breadcrumbs>().cloned().unwrap_or_default();

        Ok(Page {
            views: state.views.clone(),
            context,
            breadcrumbs,
        })
    }
}

/// Flash message as templates see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub level: String,
    pub text: String,
}

/// Take every pending flash message. Reading clears them.
pub fn take_flash(messages: Messages) -> Vec<FlashMessage> {
    messages
        .into_iter()
        .map(|message| FlashMessage {
            level: format!("{:?}", message.level).to_lowercase(),
            text: message.message,
        })
        .collect()
}
