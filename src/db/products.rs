use crate::db::models::Product;
use crate::error::{AppError, AppResult};
use sqlx::SqlitePool;

/// Newest products first.
pub async fn latest(pool: &SqlitePool, limit: i64) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products ORDER BY created_at DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY title ASC")
        .fetch_all(pool)
        .await?;

    Ok(products)
}

pub async fn list_by_category(pool: &SqlitePool, category_id: &str) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE category_id = ? ORDER BY title ASC",
    )
    .bind(category_id)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

pub async fn find_by_id(pool: &SqlitePool, product_id: &str) -> AppResult<Product> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("Product '{}' not found", product_id)),
            _ => AppError::Database(e),
        })?;

    Ok(product)
}

pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
