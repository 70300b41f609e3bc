#![allow(dead_code)]

use bazaar::{AppState, Config, app, db};
use reqwest::{Client, Response, StatusCode, header::LOCATION, redirect::Policy};
use tempfile::TempDir;

pub struct TestApp {
    pub base_url: String,
    pub state: AppState,
    pub dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        database_url: format!("sqlite://{}", dir.path().join("bazaar.db").display()),
        avatar_dir: dir.path().join("avatars"),
        max_avatar_bytes: 64 * 1024,
        ..Config::default()
    }
}

/// Serves a fresh app on an ephemeral port, backed by a temp directory.
pub async fn spawn() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = AppState::bootstrap(test_config(&dir)).await.expect("bootstrap");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let router = app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });

    TestApp {
        base_url: format!("http://127.0.0.1:{port}"),
        state,
        dir,
    }
}

/// A browser-like client: keeps cookies, does not follow redirects.
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("client")
}

pub fn csrf_from(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("page has a csrf field") + marker.len();
    let end = start + html[start..].find('"').expect("closing quote");
    html[start..end].to_owned()
}

pub fn location(resp: &Response) -> String {
    resp.headers()
        .get(LOCATION)
        .expect("redirect has a location")
        .to_str()
        .expect("ascii location")
        .to_owned()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, client: &Client, path: &str) -> Response {
        client.get(self.url(path)).send().await.expect("GET")
    }

    pub async fn csrf(&self, client: &Client, form_path: &str) -> String {
        let resp = self.get(client, form_path).await;
        assert_eq!(resp.status(), StatusCode::OK, "GET {form_path}");
        csrf_from(&resp.text().await.expect("body"))
    }

    pub async fn register(&self, client: &Client, username: &str, email: &str, password: &str) -> Response {
        let csrf_token = self.csrf(client, "/register").await;
        client
            .post(self.url("/register"))
            .form(&[
                ("username", username),
                ("email", email),
                ("password", password),
                ("csrf_token", csrf_token.as_str()),
            ])
            .send()
            .await
            .expect("POST /register")
    }

    pub async fn login(&self, client: &Client, email: &str, password: &str) -> Response {
        let csrf_token = self.csrf(client, "/login").await;
        client
            .post(self.url("/login"))
            .form(&[("email", email), ("password", password), ("csrf_token", csrf_token.as_str())])
            .send()
            .await
            .expect("POST /login")
    }

    /// Registers and logs in on a fresh client, returning it with the user.
    pub async fn signed_in(&self, username: &str, email: &str) -> (Client, db::User) {
        let client = client();
        let resp = self.register(&client, username, email, "secret123").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let resp = self.login(&client, email, "secret123").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let user = db::users::find_by_email(&self.state.db_pool, email)
            .await
            .expect("query")
            .expect("user exists");
        (client, user)
    }
}
