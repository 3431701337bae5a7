//! # Breadcrumbs
//!
//! Turns a request path into the navigation trail shown above each page.
//!
//! `/products/shoes` becomes `Home (/) > Products (/products) > Shoes`.
//! The last entry is the current page and carries no link.

use serde::Serialize;

/// One step of the navigation trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    /// `None` for the current page
    pub url: Option<String>,
}

impl Breadcrumb {
    fn home() -> Self {
        Self {
            name: "Home".to_string(),
            url: Some("/".to_string()),
        }
    }
}

/// Trail built for the current request, stored in request extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Breadcrumbs(pub Vec<Breadcrumb>);

/// Build the trail for `path`.
///
/// Every segment but the last links to the cumulative path up to it. Empty
/// segments (the root path, a trailing slash) still produce an entry, with an
/// empty name.
pub fn build(path: &str) -> Vec<Breadcrumb> {
    let segments: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();
    let last = segments.len() - 1;

    let (trail, _) = segments.iter().enumerate().fold(
        (vec![Breadcrumb::home()], String::new()),
        |(mut trail, prefix), (i, segment)| {
            let prefix = format!("{}/{}", prefix, segment);
            let url = (i != last).then(|| prefix.clone());
            trail.push(Breadcrumb {
                name: capitalize(segment),
                url,
            });
            (trail, prefix)
        },
    );

    trail
}

/// Upper-case the first character only. Empty input stays empty.
fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
