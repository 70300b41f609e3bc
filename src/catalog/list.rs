use axum::{debug_handler, extract::State, response::Html};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, db::products, include_res, res, session};

/// Every product, unfiltered and unpaginated.
pub async fn render_listings(db_pool: &SqlitePool) -> AppResult<String> {
    let listings = products::list_with_sellers(db_pool).await?;
    if listings.is_empty() {
        return Ok(include_res!(str, "/pages/catalog/empty.html").to_owned());
    }

    let mut items = String::new();
    for products::Listing { product, seller_name } in listings {
        items += &include_res!(str, "/pages/catalog/product_item.html")
            .replace("{id}", &product.id.to_string())
            .replace("{title}", &res::escape(&product.title))
            .replace("{category}", product.category.as_str())
            .replace("{description}", &res::escape(&product.description))
            .replace("{price}", &format!("{:.2}", product.price))
            .replace("{seller}", &res::escape(&seller_name))
            .replace("{created_at}", &product.created_at.date().to_string());
    }

    Ok(include_res!(str, "/pages/catalog/product_list.html").replace("{items}", &items))
}

#[debug_handler]
pub(crate) async fn catalog(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Html<String>> {
    let flashes = session::take_flashes(&session).await?;
    let content = include_res!(str, "/pages/catalog/catalog.html")
        .replace("{products}", &render_listings(&db_pool).await?);

    Ok(res::layout("Catalog", &flashes, &content))
}
