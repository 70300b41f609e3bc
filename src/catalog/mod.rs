mod list;
mod new;

use axum::{Router, routing::get};

use crate::AppState;

pub use list::render_listings;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(list::catalog))
        .route("/add_product", get(new::new_product_page).post(new::new_product))
}
