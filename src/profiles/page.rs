use axum::{debug_handler, response::Html};
use tower_sessions::Session;

use crate::{
    AppResult,
    auth::CurrentUser,
    db::{User, users::DEFAULT_AVATAR},
    forms::FieldErrors,
    include_res, res, session,
};

pub(crate) async fn render(session: &Session, user: &User, errors: &FieldErrors) -> AppResult<Html<String>> {
    let csrf_token = session::csrf_token(session).await?;
    let flashes = session::take_flashes(session).await?;

    let avatar = if user.avatar == DEFAULT_AVATAR {
        let initial = user.username.chars().next().unwrap_or('?').to_uppercase().to_string();
        format!(r#"<div class="avatar placeholder">{}</div>"#, res::escape(&initial))
    } else {
        format!(
            r#"<img class="avatar" src="/static/avatars/{}" alt="avatar">"#,
            res::escape(&user.avatar)
        )
    };

    let content = include_res!(str, "/pages/profile.html")
        .replace("{csrf_token}", &csrf_token)
        .replace("{avatar}", &avatar)
        .replace("{username}", &res::escape(&user.username))
        .replace("{email}", &res::escape(&user.email))
        .replace("{form_errors}", &res::field_errors(errors, "csrf_token"))
        .replace("{avatar_errors}", &res::field_errors(errors, "avatar"));

    Ok(res::layout("Profile", &flashes, &content))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn profile(CurrentUser(user): CurrentUser, session: Session) -> AppResult<Html<String>> {
    render(&session, &user, &FieldErrors::new()).await
}
