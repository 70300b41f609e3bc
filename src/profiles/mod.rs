mod avatar;
mod page;

use axum::{Router, extract::DefaultBodyLimit, routing::get};

use crate::AppState;

pub(crate) use avatar::is_plain_file_name;

/// `max_avatar_bytes` caps the whole upload body, form fields included.
pub fn router(max_avatar_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(page::profile)
            .post(avatar::upload_avatar)
            .layer(DefaultBodyLimit::max(max_avatar_bytes)),
    )
}
