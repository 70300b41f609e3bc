use axum::{
    Router,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    db::{User, users},
    session::{RETURN_URL, USER_ID, safe_return_url},
};

mod login;
mod logout;
pub mod password;
mod register;

pub use password::{hash_password, verify_password};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register::register_page).post(register::register))
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(logout::logout))
}

/// The logged-in user, if the session names one that still exists.
pub async fn session_user(session: &Session, db_pool: &SqlitePool) -> AppResult<Option<User>> {
    let Some(user_id) = session.get::<i64>(USER_ID).await? else {
        return Ok(None);
    };

    let user = users::find(db_pool, user_id).await?;
    if user.is_none() {
        tracing::warn!(user_id, "session refers to a missing user, dropping it");
        session.remove::<i64>(USER_ID).await?;
    }
    Ok(user)
}

/// Session gate for pages. Anonymous requests are sent to `/login` and come
/// back to where they were headed once logged in.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let db_pool = SqlitePool::from_ref(state);

        match session_user(&session, &db_pool).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                let wanted = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
                // logging out again after login would be pointless
                if parts.uri.path() != "/logout" {
                    if let Some(url) = safe_return_url(wanted) {
                        session
                            .insert(RETURN_URL, url)
                            .await
                            .map_err(|err| crate::AppError::from(err).into_response())?;
                    }
                }
                Err(Redirect::to("/login").into_response())
            }
            Err(err) => Err(err.into_response()),
        }
    }
}
