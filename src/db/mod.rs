pub mod messages;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub use messages::Message;
pub use orders::Order;
pub use products::{Category, Product};
pub use reviews::Review;
pub use users::User;

// users
//   unique: email (case-insensitive)
// products
//   seller_id -> users
// orders
//   buyer_id -> users, product_id -> products
// messages
//   sender_id, receiver_id -> users; content non-empty
// reviews
//   product_id -> products, user_id -> users
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password TEXT NOT NULL,
        is_admin INTEGER NOT NULL DEFAULT 0,
        avatar TEXT NOT NULL DEFAULT 'default_avatar.jpg'
    )"#,
    r#"CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        category TEXT NOT NULL,
        description TEXT NOT NULL,
        price TEXT NOT NULL,
        seller_id INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        buyer_id INTEGER NOT NULL REFERENCES users(id),
        product_id INTEGER NOT NULL REFERENCES products(id),
        status TEXT NOT NULL DEFAULT 'pending'
    )"#,
    r#"CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sender_id INTEGER NOT NULL REFERENCES users(id),
        receiver_id INTEGER NOT NULL REFERENCES users(id),
        content TEXT NOT NULL CHECK (length(content) > 0),
        timestamp TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL REFERENCES products(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        rating INTEGER NOT NULL,
        comment TEXT NOT NULL DEFAULT ''
    )"#,
];

/// Opens the pool, creating the database file if needed. Foreign keys are
/// switched on for every connection.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(16)
        .connect_with(options)
        .await
}

pub async fn create_tables(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(db_pool).await?;
    }
    Ok(())
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub fn is_constraint_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation()
                || db_err.is_foreign_key_violation()
                || db_err.is_check_violation()
    )
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // one connection, otherwise every connection gets its own in-memory db
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    create_tables(&db_pool).await.unwrap();
    db_pool
}
