use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub avatar_dir: PathBuf,
    pub max_avatar_bytes: usize,
    pub session_secure: bool,
    pub session_inactivity_minutes: i64,
    pub admin_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite://bazaar.db".to_owned(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            avatar_dir: PathBuf::from("static/avatars"),
            max_avatar_bytes: 2 * 1024 * 1024,
            session_secure: false,
            session_inactivity_minutes: 60,
            admin_email: None,
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenv::dotenv().ok();
        Config::from_lookup(|var| dotenv::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            avatar_dir: lookup("AVATAR_DIR").map(PathBuf::from).unwrap_or(defaults.avatar_dir),
            max_avatar_bytes: parse_or(&lookup, "MAX_AVATAR_BYTES", defaults.max_avatar_bytes)?,
            session_secure: parse_or(&lookup, "SESSION_SECURE", defaults.session_secure)?,
            session_inactivity_minutes: parse_or(
                &lookup,
                "SESSION_INACTIVITY_MINUTES",
                defaults.session_inactivity_minutes,
            )?,
            admin_email: lookup("ADMIN_EMAIL")
                .map(|email| email.trim().to_lowercase())
                .filter(|email| !email.is_empty()),
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(var) else {
        return Ok(default);
    };

    let parsed = value.trim().parse::<T>();
    parsed.map_err(|err| ConfigError::Invalid {
        var,
        reason: err.to_string(),
        value,
    })
}
