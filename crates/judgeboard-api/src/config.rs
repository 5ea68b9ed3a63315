//! Server configuration read from the environment.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use judgeboard_core::config::JudgingConfig;

use crate::error::AppError;

/// Everything the server needs at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `PostgreSQL` connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Bind host (`HOST`, default `0.0.0.0`).
    pub host: String,
    /// Bind port (`PORT`, default 3000).
    pub port: u16,
    /// Pool size (`DATABASE_MAX_CONNECTIONS`, default 10).
    pub max_connections: u32,
    /// Engine tunables (`VOTE_TIMEOUT_SECS`, `STORE_TIMEOUT_SECS`,
    /// `BROADCAST_TIMEOUT_SECS`).
    pub judging: JudgingConfig,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
        let defaults = JudgingConfig::default();

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            judging: JudgingConfig {
                vote_timeout: seconds_or(&lookup, "VOTE_TIMEOUT_SECS", defaults.vote_timeout)?,
                store_timeout: seconds_or(&lookup, "STORE_TIMEOUT_SECS", defaults.store_timeout)?,
                broadcast_timeout: seconds_or(
                    &lookup,
                    "BROADCAST_TIMEOUT_SECS",
                    defaults.broadcast_timeout,
                )?,
                default_timer: defaults.default_timer,
            },
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a valid address.
    pub fn listen_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}

fn seconds_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration, AppError> {
    let secs: u64 = parse_or(lookup, key, default.as_secs())?;
    if secs == 0 {
        return Err(AppError::Config(format!("{key} must be positive")));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/judging")]))
            .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.judging, JudgingConfig::default());
        assert_eq!(config.listen_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/judging"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("VOTE_TIMEOUT_SECS", "45"),
            ("STORE_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.judging.vote_timeout, Duration::from_secs(45));
        assert_eq!(config.judging.store_timeout, Duration::from_secs(3));
        assert_eq!(config.judging.broadcast_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_missing_database_url_is_rejected() {
        let result = AppConfig::from_lookup(lookup(&[]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (key, value) in [("PORT", "seventy"), ("VOTE_TIMEOUT_SECS", "0"), ("DATABASE_MAX_CONNECTIONS", "-1")] {
            let result = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://db"), (key, value)]));
            assert!(matches!(result, Err(AppError::Config(_))), "{key}={value}");
        }
    }
}
