pub mod admin;
pub mod appresult;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod forms;
pub mod index;
pub mod profiles;
pub mod res;
pub mod session;

use std::sync::Arc;

use axum::{Router, extract::FromRef, routing::get};
use sqlx::SqlitePool;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};

pub use appresult::{AppError, AppResult};
pub use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Opens the database, creates missing tables and the avatar directory,
    /// and applies the configured admin grant.
    pub async fn bootstrap(config: Config) -> anyhow::Result<AppState> {
        let db_pool = db::connect(&config.database_url).await?;
        db::create_tables(&db_pool).await?;
        tokio::fs::create_dir_all(&config.avatar_dir).await?;

        if let Some(email) = &config.admin_email {
            if db::users::grant_admin(&db_pool, email).await? {
                tracing::info!(%email, "admin rights granted");
            } else {
                tracing::warn!(%email, "ADMIN_EMAIL does not match any user yet");
            }
        }

        Ok(AppState {
            db_pool,
            config: Arc::new(config),
        })
    }
}

/// The whole site: pages, avatar files, admin api, sessions and request
/// tracing.
pub fn app(app_state: AppState) -> Router {
    let config = app_state.config.clone();

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.session_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.session_inactivity_minutes,
        )));

    Router::new()
        .route("/", get(index::index))
        .merge(auth::router())
        .merge(catalog::router())
        .merge(profiles::router(config.max_avatar_bytes))
        .merge(admin::router())
        .nest_service("/static/avatars", ServeDir::new(&config.avatar_dir))
        .with_state(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}
