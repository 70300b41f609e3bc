use axum::{
    Form, debug_handler,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppResult,
    db::{self, users},
    forms::{self, FieldErrors, RegisterForm},
    include_res, res, session,
};

use super::hash_password;

pub(crate) const EMAIL_TAKEN: &str = "An account with this email already exists.";

async fn render(session: &Session, form: &RegisterForm, errors: &FieldErrors) -> AppResult<Html<String>> {
    let csrf_token = session::csrf_token(session).await?;
    let flashes = session::take_flashes(session).await?;

    let content = include_res!(str, "/pages/register.html")
        .replace("{csrf_token}", &csrf_token)
        .replace("{username}", &res::escape(&form.username))
        .replace("{email}", &res::escape(&form.email))
        .replace("{form_errors}", &res::field_errors(errors, "csrf_token"))
        .replace("{username_errors}", &res::field_errors(errors, "username"))
        .replace("{email_errors}", &res::field_errors(errors, "email"))
        .replace("{password_errors}", &res::field_errors(errors, "password"));

    Ok(res::layout("Register", &flashes, &content))
}

async fn rejected(session: &Session, form: &RegisterForm, errors: &FieldErrors) -> AppResult<Response> {
    let page = render(session, form, errors).await?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

#[debug_handler]
pub(crate) async fn register_page(session: Session) -> AppResult<Html<String>> {
    render(&session, &RegisterForm::default(), &FieldErrors::new()).await
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let csrf_ok = session::verify_csrf(&session, &form.csrf_token).await?;
    let registration = match forms::with_csrf(form.validate(), csrf_ok) {
        Ok(registration) => registration,
        Err(errors) => return rejected(&session, &form, &errors).await,
    };

    let mut taken = FieldErrors::new();
    taken.push("email", EMAIL_TAKEN);

    if users::email_taken(&db_pool, &registration.email).await? {
        return rejected(&session, &form, &taken).await;
    }

    let password_hash = hash_password(&registration.password)?;
    let user = match users::insert(&db_pool, &registration.username, &registration.email, &password_hash, false, None).await {
        Ok(user) => user,
        // lost a race with a concurrent registration
        Err(err) if db::is_unique_violation(&err) => return rejected(&session, &form, &taken).await,
        Err(err) => return Err(err.into()),
    };

    tracing::info!(user_id = user.id, username = %user.username, "registered");
    session::flash(&session, "Registration successful! You can log in now.").await?;
    Ok(Redirect::to("/login").into_response())
}
