use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    auth::hash_password,
    db::{
        Category, Message, Order, Product, Review, User, messages, orders,
        products::{self, NewProduct},
        reviews, users,
    },
    forms::{self, FieldErrors, REQUIRED},
    profiles::is_plain_file_name,
};

use super::{AdminError, AdminResource};

#[derive(Debug, Deserialize)]
pub struct UserInput {
    pub username: String,
    pub email: String,
    /// Required on create. Left out on update to keep the current one.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub avatar: Option<String>,
}

struct ValidUser {
    username: String,
    email: String,
    password_hash: Option<String>,
}

impl UserInput {
    fn validate(&self, password_required: bool) -> Result<ValidUser, AdminError> {
        let mut errors = FieldErrors::new();
        let username = forms::check_username(&mut errors, &self.username);
        let email = forms::check_email(&mut errors, &self.email);
        match &self.password {
            Some(password) => forms::check_password(&mut errors, password),
            None if password_required => errors.push("password", REQUIRED),
            None => {}
        }
        if let Some(avatar) = &self.avatar {
            let avatar = avatar.trim();
            if avatar.is_empty() {
                errors.push("avatar", REQUIRED);
            } else if !is_plain_file_name(avatar) {
                errors.push("avatar", "Must be a bare file name.");
            }
        }
        errors.into_result(())?;

        let password_hash = self.password.as_deref().map(hash_password).transpose()?;
        Ok(ValidUser { username, email, password_hash })
    }
}

#[async_trait]
impl AdminResource for User {
    const PATH: &'static str = "users";
    type Input = UserInput;

    async fn list(db_pool: &SqlitePool) -> Result<Vec<Self>, AdminError> {
        Ok(users::list(db_pool).await?)
    }

    async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<Self>, AdminError> {
        Ok(users::find(db_pool, id).await?)
    }

    async fn create(db_pool: &SqlitePool, input: UserInput) -> Result<Self, AdminError> {
        let valid = input.validate(true)?;
        let password_hash = valid.password_hash.unwrap_or_default();
        Ok(users::insert(
            db_pool,
            &valid.username,
            &valid.email,
            &password_hash,
            input.is_admin,
            input.avatar.as_deref().map(str::trim),
        )
        .await?)
    }

    async fn update(db_pool: &SqlitePool, id: i64, input: UserInput) -> Result<Option<Self>, AdminError> {
        let valid = input.validate(false)?;
        let Some(current) = users::find(db_pool, id).await? else {
            return Ok(None);
        };
        let avatar = input.avatar.as_deref().map(str::trim).unwrap_or(&current.avatar);

        Ok(users::update(
            db_pool,
            id,
            &valid.username,
            &valid.email,
            valid.password_hash.as_deref(),
            input.is_admin,
            avatar,
        )
        .await?)
    }

    async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, AdminError> {
        Ok(users::delete(db_pool, id).await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub title: String,
    pub category: Category,
    pub description: String,
    pub price: Decimal,
    pub seller_id: i64,
}

impl ProductInput {
    fn validate(&self) -> Result<NewProduct<'_>, AdminError> {
        let mut errors = FieldErrors::new();
        if self.title.trim().is_empty() {
            errors.push("title", REQUIRED);
        }
        if self.description.trim().is_empty() {
            errors.push("description", REQUIRED);
        }
        let price = forms::normalize_price(self.price).unwrap_or_else(|message| {
            errors.push("price", message);
            Decimal::ZERO
        });

        Ok(errors.into_result(NewProduct {
            title: self.title.trim(),
            category: self.category,
            description: self.description.trim(),
            price,
            seller_id: self.seller_id,
        })?)
    }
}

#[async_trait]
impl AdminResource for Product {
    const PATH: &'static str = "products";
    type Input = ProductInput;

    async fn list(db_pool: &SqlitePool) -> Result<Vec<Self>, AdminError> {
        Ok(products::list(db_pool).await?)
    }

    async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<Self>, AdminError> {
        Ok(products::find(db_pool, id).await?)
    }

    async fn create(db_pool: &SqlitePool, input: ProductInput) -> Result<Self, AdminError> {
        Ok(products::insert(db_pool, input.validate()?).await?)
    }

    async fn update(db_pool: &SqlitePool, id: i64, input: ProductInput) -> Result<Option<Self>, AdminError> {
        Ok(products::update(db_pool, id, input.validate()?).await?)
    }

    async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, AdminError> {
        Ok(products::delete(db_pool, id).await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderInput {
    pub buyer_id: i64,
    pub product_id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

impl OrderInput {
    fn status(&self) -> Result<&str, AdminError> {
        let status = self.status.as_deref().map_or(orders::DEFAULT_STATUS, str::trim);
        let mut errors = FieldErrors::new();
        if status.is_empty() {
            errors.push("status", REQUIRED);
        }
        Ok(errors.into_result(status)?)
    }
}

#[async_trait]
impl AdminResource for Order {
    const PATH: &'static str = "orders";
    type Input = OrderInput;

    async fn list(db_pool: &SqlitePool) -> Result<Vec<Self>, AdminError> {
        Ok(orders::list(db_pool).await?)
    }

    async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<Self>, AdminError> {
        Ok(orders::find(db_pool, id).await?)
    }

    async fn create(db_pool: &SqlitePool, input: OrderInput) -> Result<Self, AdminError> {
        Ok(orders::insert(db_pool, input.buyer_id, input.product_id, input.status()?).await?)
    }

    async fn update(db_pool: &SqlitePool, id: i64, input: OrderInput) -> Result<Option<Self>, AdminError> {
        Ok(orders::update(db_pool, id, input.buyer_id, input.product_id, input.status()?).await?)
    }

    async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, AdminError> {
        Ok(orders::delete(db_pool, id).await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageInput {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
}

impl MessageInput {
    fn content(&self) -> Result<&str, AdminError> {
        let mut errors = FieldErrors::new();
        if self.content.trim().is_empty() {
            errors.push("content", REQUIRED);
        }
        Ok(errors.into_result(self.content.as_str())?)
    }
}

#[async_trait]
impl AdminResource for Message {
    const PATH: &'static str = "messages";
    type Input = MessageInput;

    async fn list(db_pool: &SqlitePool) -> Result<Vec<Self>, AdminError> {
        Ok(messages::list(db_pool).await?)
    }

    async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<Self>, AdminError> {
        Ok(messages::find(db_pool, id).await?)
    }

    async fn create(db_pool: &SqlitePool, input: MessageInput) -> Result<Self, AdminError> {
        Ok(messages::insert(db_pool, input.sender_id, input.receiver_id, input.content()?).await?)
    }

    async fn update(db_pool: &SqlitePool, id: i64, input: MessageInput) -> Result<Option<Self>, AdminError> {
        Ok(messages::update(db_pool, id, input.sender_id, input.receiver_id, input.content()?).await?)
    }

    async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, AdminError> {
        Ok(messages::delete(db_pool, id).await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewInput {
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

impl ReviewInput {
    fn check(&self) -> Result<(), AdminError> {
        let mut errors = FieldErrors::new();
        if !(1..=5).contains(&self.rating) {
            errors.push("rating", "Rating must be between 1 and 5.");
        }
        Ok(errors.into_result(())?)
    }
}

#[async_trait]
impl AdminResource for Review {
    const PATH: &'static str = "reviews";
    type Input = ReviewInput;

    async fn list(db_pool: &SqlitePool) -> Result<Vec<Self>, AdminError> {
        Ok(reviews::list(db_pool).await?)
    }

    async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<Self>, AdminError> {
        Ok(reviews::find(db_pool, id).await?)
    }

    async fn create(db_pool: &SqlitePool, input: ReviewInput) -> Result<Self, AdminError> {
        input.check()?;
        Ok(reviews::insert(db_pool, input.product_id, input.user_id, input.rating, &input.comment).await?)
    }

    async fn update(db_pool: &SqlitePool, id: i64, input: ReviewInput) -> Result<Option<Self>, AdminError> {
        input.check()?;
        Ok(reviews::update(db_pool, id, input.product_id, input.user_id, input.rating, &input.comment).await?)
    }

    async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, AdminError> {
        Ok(reviews::delete(db_pool, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn user_input(email: &str, password: Option<&str>) -> UserInput {
        UserInput {
            username: "moderator".to_owned(),
            email: email.to_owned(),
            password: password.map(str::to_owned),
            is_admin: false,
            avatar: None,
        }
    }

    #[tokio::test]
    async fn user_create_hashes_and_requires_password() {
        let db_pool = test_pool().await;

        let err = User::create(&db_pool, user_input("mod@example.com", None)).await.unwrap_err();
        assert!(matches!(err, AdminError::Invalid(ref e) if e.has("password")));

        let user = User::create(&db_pool, user_input("mod@example.com", Some("secret1"))).await.unwrap();
        assert_ne!(user.password, "secret1");
        assert!(crate::auth::verify_password(&user.password, "secret1").unwrap());

        let dup = User::create(&db_pool, user_input("MOD@example.com", Some("secret1"))).await.unwrap_err();
        assert!(matches!(dup, AdminError::Conflict(_)));
    }

    #[tokio::test]
    async fn user_update_keeps_password_and_avatar() {
        let db_pool = test_pool().await;
        let user = User::create(&db_pool, user_input("mod@example.com", Some("secret1"))).await.unwrap();

        let mut input = user_input("mod@example.com", None);
        input.is_admin = true;
        let updated = User::update(&db_pool, user.id, input).await.unwrap().unwrap();
        assert!(updated.is_admin);
        assert_eq!(updated.password, user.password);
        assert_eq!(updated.avatar, user.avatar);

        assert!(User::update(&db_pool, 404, user_input("x@example.com", None)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn referenced_rows_cannot_be_deleted() {
        let db_pool = test_pool().await;
        let seller = User::create(&db_pool, user_input("seller@example.com", Some("secret1"))).await.unwrap();
        Product::create(
            &db_pool,
            ProductInput {
                title: "Tarot".to_owned(),
                category: Category::Services,
                description: "Readings".to_owned(),
                price: Decimal::new(500, 2),
                seller_id: seller.id,
            },
        )
        .await
        .unwrap();

        let err = User::delete(&db_pool, seller.id).await.unwrap_err();
        assert!(matches!(err, AdminError::Conflict(_)));
    }

    #[tokio::test]
    async fn orders_default_to_pending_and_reviews_are_bounded() {
        let db_pool = test_pool().await;
        let buyer = User::create(&db_pool, user_input("buyer@example.com", Some("secret1"))).await.unwrap();
        let product = Product::create(
            &db_pool,
            ProductInput {
                title: "Chess".to_owned(),
                category: Category::Games,
                description: "Board".to_owned(),
                price: Decimal::ONE,
                seller_id: buyer.id,
            },
        )
        .await
        .unwrap();

        let order = Order::create(
            &db_pool,
            OrderInput { buyer_id: buyer.id, product_id: product.id, status: None },
        )
        .await
        .unwrap();
        assert_eq!(order.status, "pending");

        let bad = Review::create(
            &db_pool,
            ReviewInput { product_id: product.id, user_id: buyer.id, rating: 6, comment: String::new() },
        )
        .await
        .unwrap_err();
        assert!(matches!(bad, AdminError::Invalid(ref e) if e.has("rating")));

        let blank = Message::create(
            &db_pool,
            MessageInput { sender_id: buyer.id, receiver_id: buyer.id, content: "  ".to_owned() },
        )
        .await
        .unwrap_err();
        assert!(matches!(blank, AdminError::Invalid(_)));
    }
}
