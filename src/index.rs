use axum::{debug_handler, extract::State, response::Html};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, auth, catalog, include_res, res, session};

#[debug_handler]
pub async fn index(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Html<String>> {
    let greeting = match auth::session_user(&session, &db_pool).await? {
        Some(user) => format!("Welcome back, {}!", res::escape(&user.username)),
        None => "Welcome! Log in or register to start selling.".to_owned(),
    };
    let flashes = session::take_flashes(&session).await?;

    let content = include_res!(str, "/pages/index.html")
        .replace("{greeting}", &greeting)
        .replace("{products}", &catalog::render_listings(&db_pool).await?);

    Ok(res::layout("Bazaar", &flashes, &content))
}
