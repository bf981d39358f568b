use std::{env, str::FromStr};

use chrono::Duration;
use cuesheet_core::{CuesheetOptions, Scope, ThrottleSettings, TokenSettings};
use cuesheet_server::{ServerOptions, DEFAULT_PORT};
use thiserror::Error;

/// The database url that selects the in-memory store
pub const MEMORY_DATABASE_URL: &str = "memory";

const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Everything read from the environment at start
#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub server: ServerOptions,
    pub cuesheet: CuesheetOptions,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let database_url = vars.required("DATABASE_URL")?;

        let secret = vars.required("CUESHEET_SECRET")?;
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                name: "CUESHEET_SECRET",
                reason: format!("must be at least {} bytes", MIN_SECRET_LENGTH),
            });
        }

        let token_hours: i64 = vars.parsed("CUESHEET_TOKEN_HOURS", 5)?;
        if token_hours < 1 {
            return Err(ConfigError::Invalid {
                name: "CUESHEET_TOKEN_HOURS",
                reason: "must be at least 1".to_string(),
            });
        }

        let scope = match vars.get("CUESHEET_SCOPE").as_deref() {
            None | Some("shared") => Scope::Shared,
            Some("per-user") => Scope::PerUser,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "CUESHEET_SCOPE",
                    reason: format!("expected shared or per-user, got {}", other),
                })
            }
        };

        let allowed_origins = vars
            .get("CUESHEET_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| ServerOptions::default().allowed_origins);

        Ok(Self {
            database_url,
            server: ServerOptions {
                port: vars.parsed("CUESHEET_PORT", DEFAULT_PORT)?,
                allowed_origins,
                cookie_secure: vars.parsed("CUESHEET_COOKIE_SECURE", false)?,
            },
            cuesheet: CuesheetOptions {
                scope,
                tokens: TokenSettings {
                    secret,
                    lifetime: Duration::hours(token_hours),
                },
                throttle: ThrottleSettings {
                    max_failures: vars.parsed("CUESHEET_LOGIN_ATTEMPTS", 5)?,
                    window: Duration::minutes(vars.parsed("CUESHEET_LOGIN_WINDOW_MINUTES", 15)?),
                },
            },
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Empty values count as unset
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        match self.get(name) {
            Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[("DATABASE_URL", "memory"), ("CUESHEET_SECRET", SECRET)]).unwrap();

        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(!config.server.cookie_secure);
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.cuesheet.scope, Scope::Shared);
        assert_eq!(config.cuesheet.tokens.lifetime, Duration::hours(5));
        assert_eq!(config.cuesheet.throttle.max_failures, 5);
        assert_eq!(config.cuesheet.throttle.window, Duration::minutes(15));
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/cuesheet"),
            ("CUESHEET_SECRET", SECRET),
            ("CUESHEET_PORT", "8080"),
            ("CUESHEET_SCOPE", "per-user"),
            ("CUESHEET_TOKEN_HOURS", "1"),
            ("CUESHEET_COOKIE_SECURE", "true"),
            (
                "CUESHEET_ALLOWED_ORIGINS",
                "https://a.example.com, https://b.example.com",
            ),
        ])
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.server.cookie_secure);
        assert_eq!(
            config.server.allowed_origins,
            vec!["https://a.example.com", "https://b.example.com"]
        );
        assert_eq!(config.cuesheet.scope, Scope::PerUser);
        assert_eq!(config.cuesheet.tokens.lifetime, Duration::hours(1));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        assert!(matches!(
            config(&[("CUESHEET_SECRET", SECRET)]),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));

        assert!(matches!(
            config(&[("DATABASE_URL", "memory"), ("CUESHEET_SECRET", "short")]),
            Err(ConfigError::Invalid {
                name: "CUESHEET_SECRET",
                ..
            })
        ));

        assert!(matches!(
            config(&[
                ("DATABASE_URL", "memory"),
                ("CUESHEET_SECRET", SECRET),
                ("CUESHEET_PORT", "eighty")
            ]),
            Err(ConfigError::Invalid {
                name: "CUESHEET_PORT",
                ..
            })
        ));

        assert!(matches!(
            config(&[
                ("DATABASE_URL", "memory"),
                ("CUESHEET_SECRET", SECRET),
                ("CUESHEET_SCOPE", "everyone")
            ]),
            Err(ConfigError::Invalid {
                name: "CUESHEET_SCOPE",
                ..
            })
        ));
    }
}
