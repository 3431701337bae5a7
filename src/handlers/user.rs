//! # User Handlers
//!
//! Mounted at `/user`. Sign-up, sign-in, profile and sign-out.
//!
//! ## Routes
//! - `GET/POST /user/signup`: create an account and sign in
//! - `GET/POST /user/signin`: sign in
//! - `GET /user/profile`: requires authentication
//! - `GET /user/logout`: requires authentication
//!
//! Form problems (taken username, bad password) are reported with a flash
//! message and a redirect back to the form, not an error page.

use crate::auth::{hash_password, verify_password, AuthSession, RETURN_TO_KEY};
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extract::Form;
use crate::middleware::auth::require_auth;
use crate::state::AppState;
use crate::views::{take_flash, FlashMessage, Page};
use axum::{
    extract::State,
    middleware::from_fn,
    response::{Html, Redirect},
    routing::get,
    Router,
};
use axum_messages::Messages;
use serde::{Deserialize, Serialize};
use tower_cookies::{cookie::SameSite, Cookie, Cookies};

const MIN_PASSWORD_LEN: usize = 8;
const DEFAULT_RETURN_TO: &str = "/user/profile";

/// Plain cookie remembering the last username that signed in, used to
/// prefill the sign-in form
pub const LAST_USER_COOKIE: &str = "last_user";

pub fn router() -> Router<AppState> {
    let protected = Router::new()
        .route("/profile", get(profile))
        .route("/logout", get(logout))
        .route_layer(from_fn(require_auth));

    Router::new()
        .route("/signup", get(signup_form).post(signup))
        .route("/signin", get(signin_form).post(signin))
        .merge(protected)
}

#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignUpForm {
    fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("Please choose a username".to_string());
        }
        if !self.email.contains('@') {
            return Err("Please enter a valid email address".to_string());
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct FormPage {
    messages: Vec<FlashMessage>,
}

async fn signup_form(page: Page, messages: Messages) -> AppResult<Html<String>> {
    page.render(
        "user/signup.html",
        FormPage {
            messages: take_flash(messages),
        },
    )
}

async fn signup(
    State(state): State<AppState>,
    mut auth: AuthSession,
    messages: Messages,
    Form(form): Form<SignUpForm>,
) -> AppResult<Redirect> {
    if let Err(problem) = form.validate() {
        messages.error(problem);
        return Ok(Redirect::to("/user/signup"));
    }

    let hash = hash_password(form.password, state.config.password_cost).await?;
    let created =
        users::create_user(&state.db, form.username.trim(), form.email.trim(), &hash, false).await;

    match created {
        Ok(user) => {
            auth.login(user).await?;
            Ok(Redirect::to(&return_target(&auth).await?))
        }
        Err(AppError::BadRequest(problem)) => {
            messages.error(problem);
            Ok(Redirect::to("/user/signup"))
        }
        Err(e) => Err(e),
    }
}

#[derive(Serialize)]
struct SignInPage {
    messages: Vec<FlashMessage>,
    username: Option<String>,
}

async fn signin_form(page: Page, cookies: Cookies, messages: Messages) -> AppResult<Html<String>> {
    let username = cookies
        .get(LAST_USER_COOKIE)
        .map(|cookie| cookie.value().to_string());

    page.render(
        "user/signin.html",
        SignInPage {
            messages: take_flash(messages),
            username,
        },
    )
}

async fn signin(
    State(state): State<AppState>,
    mut auth: AuthSession,
    cookies: Cookies,
    messages: Messages,
    Form(form): Form<SignInForm>,
) -> AppResult<Redirect> {
    let user = match users::find_by_username(&state.db, form.username.trim()).await {
        Ok(user) => Some(user),
        Err(AppError::NotFound(_)) => None,
        Err(e) => return Err(e),
    };

    let verified = match &user {
        Some(user) => verify_password(form.password, user.password_hash.clone()).await?,
        None => false,
    };

    match user {
        Some(user) if verified => {
            cookies.add(remembered_username(user.username.clone()));
            auth.login(user).await?;
            Ok(Redirect::to(&return_target(&auth).await?))
        }
        _ => {
            messages.error("Invalid username or password");
            Ok(Redirect::to("/user/signin"))
        }
    }
}

/// Where to go after signing in: the page that bounced the visitor to the
/// sign-in form, if it is a local path, else the profile.
async fn return_target(auth: &AuthSession) -> AppResult<String> {
    let target = auth.session().remove::<String>(RETURN_TO_KEY).await?;

    Ok(match target {
        Some(path) if is_local_path(&path) => path,
        _ => DEFAULT_RETURN_TO.to_string(),
    })
}

fn remembered_username(username: String) -> Cookie<'static> {
    Cookie::build((LAST_USER_COOKIE, username))
        .path("/user")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(30))
        .build()
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

async fn profile(page: Page) -> AppResult<Html<String>> {
    page.render_plain("user/profile.html")
}

async fn logout(mut auth: AuthSession, messages: Messages) -> AppResult<Redirect> {
    auth.logout().await?;
    messages.info("You have been signed out");
    Ok(Redirect::to("/"))
}
