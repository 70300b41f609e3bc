use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

pub const DEFAULT_AVATAR: &str = "default_avatar.jpg";

const COLUMNS: &str = "id,username,email,password,is_admin,avatar";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never the plaintext.
    #[serde(skip_serializing)]
    pub password: String,
    pub is_admin: bool,
    pub avatar: String,
}

pub async fn insert(
    db_pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
    is_admin: bool,
    avatar: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO users (username,email,password,is_admin,avatar) \
         VALUES (?,?,?,?,COALESCE(?,'{DEFAULT_AVATAR}')) RETURNING {COLUMNS}"
    ))
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(is_admin)
    .bind(avatar)
    .fetch_one(db_pool)
    .await
}

pub async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM users WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

pub async fn find_by_email(db_pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM users WHERE email=?"))
        .bind(email)
        .fetch_optional(db_pool)
        .await
}

pub async fn email_taken(db_pool: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
    Ok(sqlx::query("SELECT 1 FROM users WHERE email=?")
        .bind(email)
        .fetch_optional(db_pool)
        .await?
        .is_some())
}

pub async fn list(db_pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM users ORDER BY id"))
        .fetch_all(db_pool)
        .await
}

pub async fn set_avatar(db_pool: &SqlitePool, id: i64, avatar: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET avatar=? WHERE id=?")
        .bind(avatar)
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn avatar_in_use(db_pool: &SqlitePool, avatar: &str) -> Result<bool, sqlx::Error> {
    Ok(sqlx::query("SELECT 1 FROM users WHERE avatar=?")
        .bind(avatar)
        .fetch_optional(db_pool)
        .await?
        .is_some())
}

/// Returns whether a user with that email existed.
pub async fn grant_admin(db_pool: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET is_admin=1 WHERE email=?")
        .bind(email)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// `password_hash: None` keeps the current password.
pub async fn update(
    db_pool: &SqlitePool,
    id: i64,
    username: &str,
    email: &str,
    password_hash: Option<&str>,
    is_admin: bool,
    avatar: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE users SET username=?,email=?,password=COALESCE(?,password),is_admin=?,avatar=? \
         WHERE id=? RETURNING {COLUMNS}"
    ))
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(is_admin)
    .bind(avatar)
    .bind(id)
    .fetch_optional(db_pool)
    .await
}

pub async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id=?")
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{is_unique_violation, test_pool};

    #[tokio::test]
    async fn new_users_get_defaults() {
        let db_pool = test_pool().await;
        let user = insert(&db_pool, "alice", "alice@example.com", "hash", false, None).await.unwrap();
        assert_eq!(user.avatar, DEFAULT_AVATAR);
        assert!(!user.is_admin);

        let found = find_by_email(&db_pool, "alice@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn email_is_unique_regardless_of_case() {
        let db_pool = test_pool().await;
        insert(&db_pool, "alice", "alice@example.com", "hash", false, None).await.unwrap();
        let err = insert(&db_pool, "alice2", "ALICE@example.com", "hash", false, None)
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
        assert!(email_taken(&db_pool, "alice@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn update_keeps_password_when_not_given() {
        let db_pool = test_pool().await;
        let user = insert(&db_pool, "alice", "alice@example.com", "hash", false, None).await.unwrap();
        let updated = update(&db_pool, user.id, "alicia", "alice@example.com", None, true, "a.png")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.password, "hash");
        assert_eq!(updated.username, "alicia");
        assert!(updated.is_admin);
        assert!(update(&db_pool, 999, "x", "x@y.z", None, false, "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_takes_an_optional_avatar() {
        let db_pool = test_pool().await;
        let user = insert(&db_pool, "alice", "alice@example.com", "hash", false, Some("a.png")).await.unwrap();
        assert_eq!(user.avatar, "a.png");
        assert!(avatar_in_use(&db_pool, "a.png").await.unwrap());

        set_avatar(&db_pool, user.id, "b.png").await.unwrap();
        assert!(!avatar_in_use(&db_pool, "a.png").await.unwrap());
    }

    #[tokio::test]
    async fn grant_admin_reports_missing_users() {
        let db_pool = test_pool().await;
        insert(&db_pool, "root", "root@example.com", "hash", false, None).await.unwrap();
        assert!(grant_admin(&db_pool, "root@example.com").await.unwrap());
        assert!(!grant_admin(&db_pool, "nobody@example.com").await.unwrap());
        assert!(find_by_email(&db_pool, "root@example.com").await.unwrap().unwrap().is_admin);
    }
}
