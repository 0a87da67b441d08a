use std::env;

use chrono::{Duration, Utc};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Process settings, read once at startup and handed to the components that
/// need them.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    /// `None` renders emails to the log instead of sending them.
    pub smtp: Option<SmtpSettings>,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// Token lifetime in minutes: positive, and small enough that an expiry
/// computed from now is still a valid timestamp.
fn token_ttl(value: Option<String>) -> Result<i64, ConfigError> {
    const NAME: &str = "ACCESS_TOKEN_EXPIRE_MINUTES";
    let Some(value) = value else {
        return Ok(1440);
    };
    let minutes = value.trim().parse::<i64>().ok().filter(|minutes| {
        *minutes > 0
            && Duration::try_minutes(*minutes)
                .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                .is_some()
    });
    minutes.ok_or(ConfigError::Invalid { name: NAME, value })
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                port: parsed("SMTP_PORT", 587)?,
                username: optional("SMTP_USERNAME"),
                password: optional("SMTP_PASSWORD"),
                from: required("MAIL_FROM")?,
            }),
            None => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("PORT", 8080)?,
            jwt_secret: required("JWT_SECRET")?,
            token_ttl_minutes: token_ttl(optional("ACCESS_TOKEN_EXPIRE_MINUTES"))?,
            smtp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_error_names_the_variable() {
        assert_eq!(
            ConfigError::Missing("JWT_SECRET").to_string(),
            "JWT_SECRET must be set"
        );
    }

    #[test]
    fn invalid_error_shows_the_value() {
        let err = ConfigError::Invalid {
            name: "PORT",
            value: "eighty".to_string(),
        };
        assert_eq!(err.to_string(), "PORT has an invalid value 'eighty'");
    }

    #[test]
    fn token_ttl_defaults_to_a_day() {
        assert_eq!(token_ttl(None).unwrap(), 1440);
        assert_eq!(token_ttl(Some("30".to_string())).unwrap(), 30);
    }

    #[test]
    fn token_ttl_rejects_unusable_lifetimes() {
        for value in ["0", "-5", "soon", "9223372036854775807", "1000000000000"] {
            let err = token_ttl(Some(value.to_string())).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: "ACCESS_TOKEN_EXPIRE_MINUTES", .. }),
                "{value}"
            );
        }
    }
}
