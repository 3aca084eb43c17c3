//! Environment driven configuration of the server.

use std::env;

use chrono::Duration;
use lateshow_catalog::AuthSettings;
use thiserror::Error;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 5555;
/// How long issued tokens last unless configured otherwise.
pub const DEFAULT_TOKEN_LIFETIME_IN_MINUTES: i64 = 15;
/// Tokens can't be configured to outlive a year.
pub const MAX_TOKEN_LIFETIME_IN_MINUTES: i64 = 60 * 24 * 365;

const MIN_SECRET_KEY_LENGTH: usize = 16;

const DATABASE_URL: &str = "DATABASE_URL";
const SECRET_KEY: &str = "LATESHOW_SECRET_KEY";
const TOKEN_TTL: &str = "LATESHOW_TOKEN_TTL_MINUTES";
const PORT: &str = "LATESHOW_PORT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// A postgres URL, or None to keep everything in memory
    pub database_url: Option<String>,
    pub secret_key: String,
    pub token_lifetime: Duration,
}

impl ServerConfig {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration from any key-value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value: &String| !value.trim().is_empty());

        let secret_key = read(SECRET_KEY).ok_or(ConfigError::Missing(SECRET_KEY))?;
        if secret_key.len() < MIN_SECRET_KEY_LENGTH {
            return Err(ConfigError::Invalid {
                name: SECRET_KEY,
                reason: format!("must be at least {MIN_SECRET_KEY_LENGTH} bytes long"),
            });
        }

        let port = match read(PORT) {
            Some(port) => port.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let token_lifetime = match read(TOKEN_TTL) {
            Some(minutes) => {
                let minutes = minutes
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| ConfigError::Invalid {
                        name: TOKEN_TTL,
                        reason: e.to_string(),
                    })?;

                if !(1..=MAX_TOKEN_LIFETIME_IN_MINUTES).contains(&minutes) {
                    return Err(ConfigError::Invalid {
                        name: TOKEN_TTL,
                        reason: format!(
                            "must be between 1 and {MAX_TOKEN_LIFETIME_IN_MINUTES} minutes"
                        ),
                    });
                }

                Duration::try_minutes(minutes).ok_or(ConfigError::Invalid {
                    name: TOKEN_TTL,
                    reason: "is out of range".to_string(),
                })?
            }
            None => Duration::minutes(DEFAULT_TOKEN_LIFETIME_IN_MINUTES),
        };

        Ok(Self {
            port,
            database_url: read(DATABASE_URL),
            secret_key,
            token_lifetime,
        })
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            secret_key: self.secret_key.clone(),
            token_lifetime: self.token_lifetime,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply() {
        let config = config_from(&[(SECRET_KEY, "0123456789abcdef")]).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database_url, None);
        assert_eq!(config.token_lifetime, Duration::minutes(15));
    }

    #[test]
    fn test_values_are_read() {
        let config = config_from(&[
            (SECRET_KEY, "0123456789abcdef"),
            (PORT, "8080"),
            (TOKEN_TTL, "60"),
            (DATABASE_URL, "postgres://localhost/lateshow"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.token_lifetime, Duration::minutes(60));
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/lateshow")
        );
    }

    #[test]
    fn test_secret_key_is_required() {
        assert_eq!(
            config_from(&[]).unwrap_err(),
            ConfigError::Missing(SECRET_KEY)
        );
        assert!(matches!(
            config_from(&[(SECRET_KEY, "short")]),
            Err(ConfigError::Invalid { name: SECRET_KEY, .. })
        ));
    }

    #[test]
    fn test_blank_database_url_means_memory() {
        let config = config_from(&[(SECRET_KEY, "0123456789abcdef"), (DATABASE_URL, "  ")]).unwrap();

        assert_eq!(config.database_url, None);
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        assert!(config_from(&[(SECRET_KEY, "0123456789abcdef"), (PORT, "http")]).is_err());
        assert!(config_from(&[(SECRET_KEY, "0123456789abcdef"), (TOKEN_TTL, "0")]).is_err());
    }

    #[test]
    fn test_huge_token_lifetime_is_rejected() {
        for minutes in ["9223372036854775807", "200000000000", "525601"] {
            assert!(matches!(
                config_from(&[(SECRET_KEY, "0123456789abcdef"), (TOKEN_TTL, minutes)]),
                Err(ConfigError::Invalid { name: TOKEN_TTL, .. })
            ));
        }

        let config = config_from(&[(SECRET_KEY, "0123456789abcdef"), (TOKEN_TTL, "525600")]).unwrap();
        assert_eq!(config.token_lifetime, Duration::days(365));
    }
}
