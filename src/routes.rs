//! # Route Composition
//!
//! The dynamic part of the site is a fixed table of route groups, each
//! mounted under a path prefix. Groups are tried in table order; the root
//! group goes last so its catch-all patterns never shadow a more specific
//! group. Anything no group matches becomes a 404 handled by the error
//! boundary.

use crate::error::AppError;
use crate::handlers::{admin, index, pages, products, user};
use crate::state::AppState;
use anyhow::{bail, Result};
use axum::{extract::OriginalUri, Router};
use std::collections::HashSet;

/// A route group and the prefix it is mounted under.
pub struct Mount {
    pub prefix: &'static str,
    pub router: Router<AppState>,
}

impl Mount {
    pub fn new(prefix: &'static str, router: Router<AppState>) -> Self {
        Self { prefix, router }
    }
}

/// The site's route groups in mount order.
pub fn mount_table() -> Vec<Mount> {
    vec![
        Mount::new("/admin", admin::router()),
        Mount::new("/products", products::router()),
        Mount::new("/user", user::router()),
        Mount::new("/pages", pages::router()),
        Mount::new("/", index::router()),
    ]
}

/// Check a mount table before building a router from it.
///
/// Rejects prefixes that don't start with `/`, duplicates, non-root prefixes
/// with a trailing slash, and tables whose root group is missing or not last.
pub fn validate(mounts: &[Mount]) -> Result<()> {
    let mut seen = HashSet::new();

    for (position, mount) in mounts.iter().enumerate() {
        let prefix = mount.prefix;

        if !prefix.starts_with('/') {
            bail!("mount prefix '{}' must start with '/'", prefix);
        }
        if prefix != "/" && prefix.ends_with('/') {
            bail!("mount prefix '{}' must not end with '/'", prefix);
        }
        if !seen.insert(prefix) {
            bail!("mount prefix '{}' is used more than once", prefix);
        }
        if prefix == "/" && position + 1 != mounts.len() {
            bail!("the root group must be mounted last");
        }
    }

    if !seen.contains("/") {
        bail!("no route group is mounted at '/'");
    }

    Ok(())
}

/// Build the dynamic router from a mount table.
///
/// Paths matched by no group fall through to [`not_found`], and so do known
/// paths requested with a method their group does not serve.
pub fn compose(mounts: Vec<Mount>) -> Result<Router<AppState>> {
    validate(&mounts)?;

    let mut router = Router::new();
    for Mount { prefix, router: group } in mounts {
        tracing::debug!(prefix, "mounting route group");
        let group = group.method_not_allowed_fallback(not_found);
        router = if prefix == "/" {
            router.merge(group)
        } else {
            router.nest(prefix, group)
        };
    }

    Ok(router.fallback(not_found))
}

// Nested groups see the path with their prefix stripped.
async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
