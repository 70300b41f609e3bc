use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, SqlitePool, sqlite::SqliteRow};
use thiserror::Error;
use time::OffsetDateTime;

const COLUMNS: &str = "id,title,category,description,price,seller_id,created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Games,
    Services,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Games, Category::Services];

    pub fn as_str(&self) -> &'static str {
        use Category::*;
        match self {
            Games => "Games",
            Services => "Services",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown category {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub price: Decimal,
    pub seller_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// price and category are stored as text
impl<'r> FromRow<'r, SqliteRow> for Product {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let category: String = row.try_get("category")?;
        let price: String = row.try_get("price")?;

        Ok(Product {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            category: category.parse::<Category>().map_err(|err| sqlx::Error::ColumnDecode {
                index: "category".to_owned(),
                source: Box::new(err),
            })?,
            description: row.try_get("description")?,
            price: price.parse::<Decimal>().map_err(|err| sqlx::Error::ColumnDecode {
                index: "price".to_owned(),
                source: Box::new(err),
            })?,
            seller_id: row.try_get("seller_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A product as shown in the catalog.
#[derive(Debug, Clone, FromRow)]
pub struct Listing {
    #[sqlx(flatten)]
    pub product: Product,
    pub seller_name: String,
}

pub struct NewProduct<'a> {
    pub title: &'a str,
    pub category: Category,
    pub description: &'a str,
    pub price: Decimal,
    pub seller_id: i64,
}

/// `created_at` is always stamped here, never taken from input.
pub async fn insert(db_pool: &SqlitePool, product: NewProduct<'_>) -> Result<Product, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO products (title,category,description,price,seller_id,created_at) \
         VALUES (?,?,?,?,?,?) RETURNING {COLUMNS}"
    ))
    .bind(product.title)
    .bind(product.category.as_str())
    .bind(product.description)
    .bind(product.price.to_string())
    .bind(product.seller_id)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db_pool)
    .await
}

pub async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM products WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

pub async fn list(db_pool: &SqlitePool) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM products ORDER BY id"))
        .fetch_all(db_pool)
        .await
}

/// Every product with its seller's name, oldest first.
pub async fn list_with_sellers(db_pool: &SqlitePool) -> Result<Vec<Listing>, sqlx::Error> {
    sqlx::query_as(
        "SELECT products.id,title,category,description,price,seller_id,created_at,\
         users.username AS seller_name FROM products \
         JOIN users ON users.id=products.seller_id ORDER BY products.id"
    )
    .fetch_all(db_pool)
    .await
}

pub async fn update(
    db_pool: &SqlitePool,
    id: i64,
    product: NewProduct<'_>,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE products SET title=?,category=?,description=?,price=?,seller_id=? \
         WHERE id=? RETURNING {COLUMNS}"
    ))
    .bind(product.title)
    .bind(product.category.as_str())
    .bind(product.description)
    .bind(product.price.to_string())
    .bind(product.seller_id)
    .bind(id)
    .fetch_optional(db_pool)
    .await
}

pub async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id=?")
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, users};

    #[test]
    fn categories_round_trip_through_text() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("games".parse::<Category>().is_err());
    }

    #[tokio::test]
    async fn products_keep_their_seller_and_price() {
        let db_pool = test_pool().await;
        let seller = users::insert(&db_pool, "sam", "sam@example.com", "hash", false, None).await.unwrap();

        let before = OffsetDateTime::now_utc();
        let product = insert(
            &db_pool,
            NewProduct {
                title: "Boosting",
                category: Category::Services,
                description: "Ranked help",
                price: "19.99".parse().unwrap(),
                seller_id: seller.id,
            },
        )
        .await
        .unwrap();

        assert_eq!(product.seller_id, seller.id);
        assert_eq!(product.price.to_string(), "19.99");
        assert!(product.created_at >= before - time::Duration::seconds(1));

        let listings = list_with_sellers(&db_pool).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].seller_name, "sam");
        assert_eq!(listings[0].product.category, Category::Services);
    }

    #[tokio::test]
    async fn seller_must_exist() {
        let db_pool = test_pool().await;
        let err = insert(
            &db_pool,
            NewProduct {
                title: "Orphan",
                category: Category::Games,
                description: "No seller",
                price: Decimal::ONE,
                seller_id: 42,
            },
        )
        .await
        .unwrap_err();
        assert!(crate::db::is_constraint_violation(&err));
    }
}
