//! Generic JSON CRUD over every table, for admin users only.

mod error;
mod resources;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{FromRef, FromRequest, FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    routing::get,
};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppState, auth,
    db::{Message, Order, Product, Review, User},
};

pub use error::AdminError;
pub use resources::{MessageInput, OrderInput, ProductInput, ReviewInput, UserInput};

/// A table the admin API exposes under `/admin/{PATH}`.
#[async_trait]
pub trait AdminResource: Serialize + Send + Sized + 'static {
    const PATH: &'static str;

    /// Body accepted by create and update.
    type Input: DeserializeOwned + Send + 'static;

    async fn list(db_pool: &SqlitePool) -> Result<Vec<Self>, AdminError>;

    async fn find(db_pool: &SqlitePool, id: i64) -> Result<Option<Self>, AdminError>;

    async fn create(db_pool: &SqlitePool, input: Self::Input) -> Result<Self, AdminError>;

    /// `Ok(None)` when there is no row with that id.
    async fn update(db_pool: &SqlitePool, id: i64, input: Self::Input) -> Result<Option<Self>, AdminError>;

    async fn delete(db_pool: &SqlitePool, id: i64) -> Result<bool, AdminError>;
}

pub fn router() -> Router<AppState> {
    let router = Router::new();
    let router = with_resource::<User>(router);
    let router = with_resource::<Product>(router);
    let router = with_resource::<Order>(router);
    let router = with_resource::<Message>(router);
    with_resource::<Review>(router)
}

fn with_resource<R: AdminResource>(router: Router<AppState>) -> Router<AppState> {
    router
        .route(&format!("/admin/{}", R::PATH), get(list::<R>).post(create::<R>))
        .route(
            &format!("/admin/{}/{{id}}", R::PATH),
            get(show::<R>).put(update::<R>).delete(delete::<R>),
        )
}

/// JSON body whose rejections come back as [`AdminError`].
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AdminError))]
pub struct Payload<T>(pub T);

/// Row id from the path, rejected the same way.
pub struct RowId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for RowId {
    type Rejection = AdminError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state).await?;
        Ok(RowId(id))
    }
}

/// A logged-in user with the admin flag.
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = AdminError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AdminError::Internal(anyhow::anyhow!(msg)))?;
        let db_pool = SqlitePool::from_ref(state);

        let user = auth::session_user(&session, &db_pool)
            .await
            .map_err(|err| AdminError::Internal(err.0))?
            .ok_or(AdminError::Unauthorized)?;

        if !user.is_admin {
            tracing::warn!(user_id = user.id, path = %parts.uri.path(), "non-admin hit the admin api");
            return Err(AdminError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

async fn list<R: AdminResource>(
    _admin: AdminUser,
    State(db_pool): State<SqlitePool>,
) -> Result<Json<Vec<R>>, AdminError> {
    Ok(Json(R::list(&db_pool).await?))
}

async fn show<R: AdminResource>(
    _admin: AdminUser,
    State(db_pool): State<SqlitePool>,
    RowId(id): RowId,
) -> Result<Json<R>, AdminError> {
    R::find(&db_pool, id)
        .await?
        .map(Json)
        .ok_or(AdminError::NotFound { resource: R::PATH, id })
}

async fn create<R: AdminResource>(
    AdminUser(admin): AdminUser,
    State(db_pool): State<SqlitePool>,
    Payload(input): Payload<R::Input>,
) -> Result<(StatusCode, Json<R>), AdminError> {
    let row = R::create(&db_pool, input).await?;
    tracing::info!(admin_id = admin.id, resource = R::PATH, "admin created a row");
    Ok((StatusCode::CREATED, Json(row)))
}

async fn update<R: AdminResource>(
    AdminUser(admin): AdminUser,
    State(db_pool): State<SqlitePool>,
    RowId(id): RowId,
    Payload(input): Payload<R::Input>,
) -> Result<Json<R>, AdminError> {
    let row = R::update(&db_pool, id, input)
        .await?
        .ok_or(AdminError::NotFound { resource: R::PATH, id })?;
    tracing::info!(admin_id = admin.id, resource = R::PATH, id, "admin updated a row");
    Ok(Json(row))
}

async fn delete<R: AdminResource>(
    AdminUser(admin): AdminUser,
    State(db_pool): State<SqlitePool>,
    RowId(id): RowId,
) -> Result<StatusCode, AdminError> {
    if !R::delete(&db_pool, id).await? {
        return Err(AdminError::NotFound { resource: R::PATH, id });
    }
    tracing::info!(admin_id = admin.id, resource = R::PATH, id, "admin deleted a row");
    Ok(StatusCode::NO_CONTENT)
}
