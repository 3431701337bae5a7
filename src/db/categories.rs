//! # Category Database Operations

use crate::db::models::Category;
use crate::error::{AppError, AppResult};
use sqlx::SqlitePool;

/// All categories ordered by title ascending.
///
/// Called by the global context stage on every request; nothing is cached.
pub async fn list_by_title(pool: &SqlitePool) -> AppResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY title ASC")
        .fetch_all(pool)
        .await?;

    Ok(categories)
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> AppResult<Category> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("Category '{}' not found", slug)),
            _ => AppError::Database(e),
        })?;

    Ok(category)
}

/// Insert a new category.
///
/// ## Errors
/// - BadRequest: empty title, or the title/slug is already taken
pub async fn create(pool: &SqlitePool, title: &str) -> AppResult<Category> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Category title is required".to_string()));
    }

    let category = Category::new(title.to_string());
    if category.slug.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Category title '{}' has no letters or digits",
            title
        )));
    }

    sqlx::query("INSERT INTO categories (id, title, slug, created_at) VALUES (?, ?, ?, ?)")
        .bind(&category.id)
        .bind(&category.title)
        .bind(&category.slug)
        .bind(&category.created_at)
        .execute(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::BadRequest(format!("Category '{}' already exists", title))
            }
            _ => AppError::Database(e),
        })?;

    Ok(category)
}

pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
