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
    auth::CurrentUser,
    db::products::{self, Category, NewProduct},
    forms::{self, FieldErrors, ProductForm},
    include_res, res, session,
};

fn category_options(selected: &str) -> String {
    Category::ALL
        .iter()
        .map(|category| {
            let name = category.as_str();
            let selected = if name == selected { " selected" } else { "" };
            format!(r#"<option value="{name}"{selected}>{name}</option>"#)
        })
        .collect()
}

async fn render(session: &Session, form: &ProductForm, errors: &FieldErrors) -> AppResult<Html<String>> {
    let csrf_token = session::csrf_token(session).await?;
    let flashes = session::take_flashes(session).await?;

    let content = include_res!(str, "/pages/catalog/add_product.html")
        .replace("{csrf_token}", &csrf_token)
        .replace("{title}", &res::escape(&form.title))
        .replace("{category_options}", &category_options(form.category.trim()))
        .replace("{description}", &res::escape(&form.description))
        .replace("{price}", &res::escape(&form.price))
        .replace("{form_errors}", &res::field_errors(errors, "csrf_token"))
        .replace("{title_errors}", &res::field_errors(errors, "title"))
        .replace("{category_errors}", &res::field_errors(errors, "category"))
        .replace("{description_errors}", &res::field_errors(errors, "description"))
        .replace("{price_errors}", &res::field_errors(errors, "price"));

    Ok(res::layout("Add product", &flashes, &content))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_product_page(_user: CurrentUser, session: Session) -> AppResult<Html<String>> {
    render(&session, &ProductForm::default(), &FieldErrors::new()).await
}

#[debug_handler]
pub(crate) async fn new_product(
    CurrentUser(user): CurrentUser,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> AppResult<Response> {
    let csrf_ok = session::verify_csrf(&session, &form.csrf_token).await?;
    let input = match forms::with_csrf(form.validate(), csrf_ok) {
        Ok(input) => input,
        Err(errors) => {
            let page = render(&session, &form, &errors).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let product = products::insert(
        &db_pool,
        NewProduct {
            title: &input.title,
            category: input.category,
            description: &input.description,
            price: input.price,
            seller_id: user.id,
        },
    )
    .await?;

    tracing::info!(product_id = product.id, seller_id = user.id, "product added");
    session::flash(&session, "Product added.").await?;
    Ok(Redirect::to("/catalog").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_category_is_marked() {
        let html = category_options("Services");
        assert!(html.contains(r#"<option value="Services" selected>"#));
        assert!(html.contains(r#"<option value="Games">"#));
    }
}
