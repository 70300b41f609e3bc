use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

const COLUMNS: &str = "id,product_id,user_id,rating,comment";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub comment: String,
}

pub async fn insert(
    db_pool: &SqlitePool,
    product_id: i64,
    user_id: i64,
    rating: i64,
    comment: &str,
) -> Result<Review, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO reviews (product_id,user_id,rating,comment) VALUES (?,?,?,?) RETURNING {COLUMNS}"
    ))
    .bind(product_id)
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .fetch_one(db_pool)
    .await
}

pub async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM reviews WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

pub async fn list(db_pool: &SqlitePool) -> Result<Vec<Review>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM reviews ORDER BY id"))
        .fetch_all(db_pool)
        .await
}

pub async fn update(
    db_pool: &SqlitePool,
    id: i64,
    product_id: i64,
    user_id: i64,
    rating: i64,
    comment: &str,
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE reviews SET product_id=?,user_id=?,rating=?,comment=? WHERE id=? RETURNING {COLUMNS}"
    ))
    .bind(product_id)
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .bind(id)
    .fetch_optional(db_pool)
    .await
}

pub async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE id=?")
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
