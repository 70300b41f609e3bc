use axum::{
    Form, debug_handler,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppResult,
    db::users,
    forms::{self, FieldErrors, LoginForm},
    include_res, res,
    session::{self, RETURN_URL, USER_ID, safe_return_url},
};

use super::verify_password;

pub(crate) const BAD_CREDENTIALS: &str = "Invalid email or password.";

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

async fn render(
    session: &Session,
    email: &str,
    errors: &FieldErrors,
    notice: Option<&str>,
) -> AppResult<Html<String>> {
    let csrf_token = session::csrf_token(session).await?;
    let mut flashes = session::take_flashes(session).await?;
    flashes.extend(notice.map(str::to_owned));

    let content = include_res!(str, "/pages/login.html")
        .replace("{csrf_token}", &csrf_token)
        .replace("{email}", &res::escape(email))
        .replace("{form_errors}", &res::field_errors(errors, "csrf_token"))
        .replace("{email_errors}", &res::field_errors(errors, "email"))
        .replace("{password_errors}", &res::field_errors(errors, "password"));

    Ok(res::layout("Log in", &flashes, &content))
}

#[debug_handler]
pub(crate) async fn login_page(
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    session: Session,
) -> AppResult<Html<String>> {
    if let Some(url) = return_url.as_deref().and_then(safe_return_url) {
        session.insert(RETURN_URL, url).await?;
    }

    render(&session, "", &FieldErrors::new(), None).await
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let csrf_ok = session::verify_csrf(&session, &form.csrf_token).await?;
    let credentials = match forms::with_csrf(form.validate(), csrf_ok) {
        Ok(credentials) => credentials,
        Err(errors) => {
            let page = render(&session, &form.email, &errors, None).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let user = users::find_by_email(&db_pool, &credentials.email).await?;
    let user = match user {
        Some(user) if verify_password(&user.password, &credentials.password)? => user,
        _ => {
            tracing::warn!(email = %credentials.email, "failed login");
            let page = render(&session, &form.email, &FieldErrors::new(), Some(BAD_CREDENTIALS)).await?;
            return Ok((StatusCode::UNAUTHORIZED, page).into_response());
        }
    };

    session.cycle_id().await?;
    session.insert(USER_ID, user.id).await?;
    session::flash(&session, "You are now logged in.").await?;
    tracing::info!(user_id = user.id, "logged in");

    let return_url = session.remove::<String>(RETURN_URL).await?;
    let return_url = return_url.as_deref().and_then(safe_return_url).unwrap_or("/");
    Ok(Redirect::to(return_url).into_response())
}
