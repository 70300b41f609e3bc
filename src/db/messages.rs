use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

const COLUMNS: &str = "id,sender_id,receiver_id,content,timestamp";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

pub async fn insert(
    db_pool: &SqlitePool,
    sender_id: i64,
    receiver_id: i64,
    content: &str,
) -> Result<Message, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO messages (sender_id,receiver_id,content,timestamp) VALUES (?,?,?,?) \
         RETURNING {COLUMNS}"
    ))
    .bind(sender_id)
    .bind(receiver_id)
    .bind(content)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db_pool)
    .await
}

pub async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM messages WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

pub async fn list(db_pool: &SqlitePool) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM messages ORDER BY id"))
        .fetch_all(db_pool)
        .await
}

/// The timestamp is left as it was sent.
pub async fn update(
    db_pool: &SqlitePool,
    id: i64,
    sender_id: i64,
    receiver_id: i64,
    content: &str,
) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE messages SET sender_id=?,receiver_id=?,content=? WHERE id=? RETURNING {COLUMNS}"
    ))
    .bind(sender_id)
    .bind(receiver_id)
    .bind(content)
    .bind(id)
    .fetch_optional(db_pool)
    .await
}

pub async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM messages WHERE id=?")
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{is_constraint_violation, test_pool, users};

    #[tokio::test]
    async fn empty_content_is_refused_by_the_schema() {
        let db_pool = test_pool().await;
        let a = users::insert(&db_pool, "anna", "anna@example.com", "h", false, None).await.unwrap();
        let b = users::insert(&db_pool, "boris", "boris@example.com", "h", false, None).await.unwrap();

        let sent = insert(&db_pool, a.id, b.id, "hello").await.unwrap();
        assert_eq!(sent.receiver_id, b.id);

        let err = insert(&db_pool, a.id, b.id, "").await.unwrap_err();
        assert!(is_constraint_violation(&err));
    }
}
