use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

pub const DEFAULT_STATUS: &str = "pending";

const COLUMNS: &str = "id,buyer_id,product_id,status";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub product_id: i64,
    pub status: String,
}

pub async fn insert(
    db_pool: &SqlitePool,
    buyer_id: i64,
    product_id: i64,
    status: &str,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO orders (buyer_id,product_id,status) VALUES (?,?,?) RETURNING {COLUMNS}"
    ))
    .bind(buyer_id)
    .bind(product_id)
    .bind(status)
    .fetch_one(db_pool)
    .await
}

pub async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM orders WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

pub async fn list(db_pool: &SqlitePool) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM orders ORDER BY id"))
        .fetch_all(db_pool)
        .await
}

pub async fn update(
    db_pool: &SqlitePool,
    id: i64,
    buyer_id: i64,
    product_id: i64,
    status: &str,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE orders SET buyer_id=?,product_id=?,status=? WHERE id=? RETURNING {COLUMNS}"
    ))
    .bind(buyer_id)
    .bind(product_id)
    .bind(status)
    .bind(id)
    .fetch_optional(db_pool)
    .await
}

pub async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM orders WHERE id=?")
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
