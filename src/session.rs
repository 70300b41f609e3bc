use rand::{Rng, distr::Alphanumeric};
use tower_sessions::Session;

use crate::AppResult;

pub const USER_ID: &str = "user_id";
pub const RETURN_URL: &str = "return_url";
pub const FLASHES: &str = "flashes";
pub const CSRF_TOKEN: &str = "csrf_token";

/// Queues a one-shot notice for the next rendered page.
pub async fn flash(session: &Session, message: impl Into<String>) -> AppResult<()> {
    let mut flashes: Vec<String> = session.get(FLASHES).await?.unwrap_or_default();
    flashes.push(message.into());
    session.insert(FLASHES, flashes).await?;
    Ok(())
}

pub async fn take_flashes(session: &Session) -> AppResult<Vec<String>> {
    Ok(session.remove::<Vec<String>>(FLASHES).await?.unwrap_or_default())
}

/// The session's form token, created on first use.
pub async fn csrf_token(session: &Session) -> AppResult<String> {
    if let Some(token) = session.get::<String>(CSRF_TOKEN).await? {
        return Ok(token);
    }

    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect();
    session.insert(CSRF_TOKEN, &token).await?;
    Ok(token)
}

pub async fn verify_csrf(session: &Session, submitted: &str) -> AppResult<bool> {
    let Some(expected) = session.get::<String>(CSRF_TOKEN).await? else {
        return Ok(false);
    };
    Ok(!submitted.is_empty() && constant_time_eq(expected.as_bytes(), submitted.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Only same-site absolute paths are honoured as post-login destinations.
pub fn safe_return_url(url: &str) -> Option<&str> {
    let is_local = url.starts_with('/') && !url.starts_with("//") && !url.contains('\\');
    is_local.then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_urls_must_stay_on_site() {
        assert_eq!(safe_return_url("/profile"), Some("/profile"));
        assert_eq!(safe_return_url("/add_product?x=1"), Some("/add_product?x=1"));
        assert_eq!(safe_return_url("//evil.example"), None);
        assert_eq!(safe_return_url("https://evil.example"), None);
        assert_eq!(safe_return_url("/\\evil.example"), None);
        assert_eq!(safe_return_url(""), None);
    }

    #[test]
    fn token_comparison() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
