use std::{path::Path, sync::Arc};

use axum::{
    body::Bytes,
    debug_handler,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    AppResult, AppState,
    auth::CurrentUser,
    config::Config,
    db::users::{self, DEFAULT_AVATAR},
    forms::{self, FieldErrors, REQUIRED},
    session,
};

use super::page;

pub(crate) const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
pub(crate) const BAD_EXTENSION: &str = "Only jpg, jpeg, png, gif and webp images are allowed.";

/// Lowercased extension of an uploaded file name, if it is an allowed one.
pub(crate) fn avatar_extension(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.into_iter().find(|allowed| *allowed == extension)
}

/// A bare file name we generated, never a path.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

struct Upload {
    file_name: String,
    data: Bytes,
}

#[debug_handler(state = AppState)]
pub(crate) async fn upload_avatar(
    CurrentUser(user): CurrentUser,
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    session: Session,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut csrf_token = String::new();
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // oversized bodies end up here as 413
            Err(err) => return Ok(err.into_response()),
        };

        match field.name() {
            Some("csrf_token") => match field.text().await {
                Ok(text) => csrf_token = text,
                Err(err) => return Ok(err.into_response()),
            },
            Some("avatar") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let data = match field.bytes().await {
                    Ok(data) => data,
                    Err(err) => return Ok(err.into_response()),
                };
                if !file_name.is_empty() && !data.is_empty() {
                    upload = Some(Upload { file_name, data });
                }
            }
            _ => {}
        }
    }

    let mut errors = FieldErrors::new();
    let accepted = match upload {
        None => {
            errors.push("avatar", REQUIRED);
            None
        }
        Some(upload) => match avatar_extension(&upload.file_name) {
            Some(extension) => Some((upload, extension)),
            None => {
                errors.push("avatar", BAD_EXTENSION);
                None
            }
        },
    };

    let csrf_ok = session::verify_csrf(&session, &csrf_token).await?;
    let (upload, extension) = match forms::with_csrf(errors.into_result(accepted), csrf_ok) {
        Ok(Some(accepted)) => accepted,
        rejected => {
            let errors = rejected.err().unwrap_or_default();
            tracing::warn!(user_id = user.id, "avatar upload rejected");
            let page = page::render(&session, &user, &errors).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let file_name = format!("{}.{extension}", Uuid::now_v7().simple());
    let path = config.avatar_dir.join(&file_name);
    tokio::fs::create_dir_all(&config.avatar_dir).await?;
    tokio::fs::write(&path, &upload.data).await?;
    if let Err(err) = users::set_avatar(&db_pool, user.id, &file_name).await {
        if let Err(rm_err) = tokio::fs::remove_file(&path).await {
            tracing::warn!(error = %rm_err, avatar = %file_name, "could not remove unsaved avatar");
        }
        return Err(err.into());
    }

    tracing::info!(
        user_id = user.id,
        avatar = %file_name,
        client_name = %upload.file_name,
        bytes = upload.data.len(),
        "avatar updated"
    );

    // admins can point several users at one file
    if user.avatar != DEFAULT_AVATAR
        && is_plain_file_name(&user.avatar)
        && !users::avatar_in_use(&db_pool, &user.avatar).await?
    {
        if let Err(err) = tokio::fs::remove_file(config.avatar_dir.join(&user.avatar)).await {
            tracing::warn!(error = %err, avatar = %user.avatar, "could not remove previous avatar");
        }
    }

    session::flash(&session, "Avatar updated.").await?;
    Ok(Redirect::to("/profile").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_extensions_are_accepted() {
        assert_eq!(avatar_extension("me.PNG"), Some("png"));
        assert_eq!(avatar_extension("photo.final.jpeg"), Some("jpeg"));
        assert_eq!(avatar_extension("../../etc/passwd"), None);
        assert_eq!(avatar_extension("shell.php"), None);
        assert_eq!(avatar_extension("noextension"), None);
        assert_eq!(avatar_extension(".png"), None);
    }

    #[test]
    fn previous_avatar_must_be_a_bare_name() {
        assert!(is_plain_file_name("0190aa.png"));
        assert!(!is_plain_file_name("../secret.png"));
        assert!(!is_plain_file_name("dir/x.png"));
        assert!(!is_plain_file_name(""));
    }
}
