use axum::{debug_handler, response::Redirect};
use tower_sessions::Session;

use crate::{AppResult, session};

use super::CurrentUser;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn logout(CurrentUser(user): CurrentUser, session: Session) -> AppResult<Redirect> {
    session.flush().await?;
    session::flash(&session, "You have been logged out.").await?;
    tracing::info!(user_id = user.id, "logged out");
    Ok(Redirect::to("/"))
}
