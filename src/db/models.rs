//! # Database Models
//!
//! This module defines the data structures that map to database tables.
//! These structs represent rows in the database and serialize straight into
//! the template context.
//!
//! ## Why Strings for dates?
//! SQLite stores timestamps as text (RFC3339 format), and the templates only
//! ever display them, so we keep them as strings end to end.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product category
///
/// Every page shows the category list in its navigation, so the global
/// context stage loads all of them on each request, ordered by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique identifier
    pub id: String,

    /// Display title, e.g. "Backpacks"
    pub title: String,

    /// URL segment, e.g. "backpacks" in `/products/backpacks`
    pub slug: String,

    /// When the category was created (RFC3339 timestamp)
    pub created_at: String,
}

impl Category {
    /// Create a new category; the slug is derived from the title.
    pub fn new(title: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slugify(&title),
            title,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Item for sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: String,

    /// Foreign key to categories table
    pub category_id: String,

    pub title: String,

    pub description: String,

    /// Price in cents to avoid floating point money
    pub price_cents: i64,

    /// Path under the public directory, e.g. "/images/trail-pack.jpg"
    pub image_path: Option<String>,

    pub created_at: String,
}

/// User account information
///
/// ## Derive Macros Explained
/// - `Serialize`: the user is exposed to templates as `currentUser`
/// - `sqlx::FromRow`: Automatically maps database rows to this struct
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Unique username, used to sign in
    pub username: String,

    pub email: String,

    /// bcrypt hash of the password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Admins may use the `/admin` routes
    pub is_admin: bool,

    /// When the user account was created (RFC3339 timestamp)
    pub created_at: String,
}

impl User {
    /// Create a new user with generated ID and timestamp
    pub fn new(username: String, email: String, password_hash: String, is_admin: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            is_admin,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Lowercase ASCII letters and digits, everything else collapsed to single dashes.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_url_safe() {
        assert_eq!(slugify("Carry-on Luggage"), "carry-on-luggage");
        assert_eq!(slugify("  Bags & Totes!! "), "bags-totes");
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User::new("ana".into(), "ana@example.com".into(), "$2b$hash".into(), false);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "ana");
    }
}
