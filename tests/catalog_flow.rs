mod common;

use bazaar::db::products::{self, Category};
use reqwest::{Client, Response, StatusCode};

use common::{TestApp, client, location, spawn};

async fn add_product(app: &TestApp, client: &Client, fields: &[(&str, &str)]) -> Response {
    let csrf_token = app.csrf(client, "/add_product").await;
    let mut form = fields.to_vec();
    form.push(("csrf_token", csrf_token.as_str()));
    client
        .post(app.url("/add_product"))
        .form(&form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn catalog_is_public_and_starts_empty() {
    let app = spawn().await;
    for path in ["/", "/catalog"] {
        let resp = app.get(&client(), path).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.text().await.unwrap().contains("No products yet."));
    }
}

#[tokio::test]
async fn adding_a_product_requires_a_session() {
    let app = spawn().await;
    let resp = app.get(&client(), "/add_product").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let resp = client()
        .post(app.url("/add_product"))
        .form(&[("title", "Sneaky"), ("category", "Games"), ("description", "x"), ("price", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(products::list(&app.state.db_pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn added_product_belongs_to_the_seller_and_is_listed() {
    let app = spawn().await;
    let (seller, user) = app.signed_in("gwen", "gwen@example.com").await;

    let resp = add_product(
        &app,
        &seller,
        &[
            ("title", "Elden Ring key"),
            ("category", "Games"),
            ("description", "Steam key, region free"),
            ("price", "39.9"),
        ],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/catalog");

    let stored = products::list(&app.state.db_pool).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].seller_id, user.id);
    assert_eq!(stored[0].category, Category::Games);
    assert_eq!(stored[0].price.to_string(), "39.9");

    let page = app.get(&seller, "/catalog").await.text().await.unwrap();
    assert!(page.contains("Product added."));
    assert!(page.contains("Elden Ring key"));
    assert!(page.contains("39.90"));

    // anonymous visitors see it on both listings
    for path in ["/", "/catalog"] {
        let page = app.get(&client(), path).await.text().await.unwrap();
        assert!(page.contains("Elden Ring key"));
        assert!(page.contains("gwen"));
    }
}

#[tokio::test]
async fn invalid_product_is_re_rendered() {
    let app = spawn().await;
    let (seller, _) = app.signed_in("hank", "hank@example.com").await;

    let resp = add_product(
        &app,
        &seller,
        &[("title", ""), ("category", "Weapons"), ("description", "Sharp"), ("price", "-1")],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = resp.text().await.unwrap();
    assert!(page.contains("This field is required."));
    assert!(page.contains("Not a valid choice."));
    assert!(page.contains("Price must be greater than zero."));
    assert!(page.contains("Sharp"));

    assert!(products::list(&app.state.db_pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_escapes_user_text() {
    let app = spawn().await;
    let (seller, _) = app.signed_in("ivan_", "ivan@example.com").await;

    add_product(
        &app,
        &seller,
        &[
            ("title", "<script>alert(1)</script>"),
            ("category", "Services"),
            ("description", "{content}"),
            ("price", "5"),
        ],
    )
    .await;

    let page = app.get(&client(), "/catalog").await.text().await.unwrap();
    assert!(!page.contains("<script>alert(1)</script>"));
    assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(page.contains("&#123;content&#125;"));
}
