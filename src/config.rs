//! Process configuration.
//!
//! `Config` is read once at startup and handed to the pieces that need it
//! (token service, password hashing, store). Nothing reads the environment
//! after that.

use std::env;

use jsonwebtoken::Algorithm;
use thiserror::Error;

const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
// Ten years.
const MAX_TOKEN_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_algorithm = match get("JWT_ALGORITHM") {
            Some(raw) => parse_hmac_algorithm(&raw)?,
            None => Algorithm::HS256,
        };

        let ttl_minutes = parse_or(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            get("ACCESS_TOKEN_EXPIRE_MINUTES"),
            DEFAULT_TOKEN_TTL_MINUTES,
        )?;
        let access_token_ttl = token_ttl(ttl_minutes)?;

        let bcrypt_cost = parse_or("BCRYPT_COST", get("BCRYPT_COST"), bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: "must be between 4 and 31".into(),
            });
        }

        Ok(Self {
            database_url,
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
            )?,
            server_port: parse_or("SERVER_PORT", get("SERVER_PORT"), DEFAULT_SERVER_PORT)?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            jwt_secret,
            jwt_algorithm,
            access_token_ttl,
            bcrypt_cost,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn token_ttl(minutes: i64) -> Result<chrono::Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: "ACCESS_TOKEN_EXPIRE_MINUTES",
        reason,
    };
    if minutes <= 0 {
        return Err(invalid("must be greater than zero".into()));
    }
    if minutes > MAX_TOKEN_TTL_MINUTES {
        return Err(invalid(format!("must be at most {} (ten years)", MAX_TOKEN_TTL_MINUTES)));
    }
    chrono::Duration::try_minutes(minutes).ok_or_else(|| invalid("out of range".into()))
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

// The signing secret is shared between issuer and verifier, so only HMAC fits.
fn parse_hmac_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::Invalid {
            key: "JWT_ALGORITHM",
            reason: format!("unsupported algorithm '{}', expected HS256, HS384 or HS512", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map = vars(pairs);
        Config::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "secret")]).unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.access_token_ttl, chrono::Duration::minutes(30));
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_config_custom_values() {
        let config = load(&[
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "secret"),
            ("JWT_ALGORITHM", "hs512"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("BCRYPT_COST", "4"),
        ])
        .unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.jwt_algorithm, Algorithm::HS512);
        assert_eq!(config.access_token_ttl, chrono::Duration::minutes(5));
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn test_config_missing_required_keys() {
        assert_eq!(
            load(&[("JWT_SECRET", "secret")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            load(&[("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "  ")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let base = [("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "secret")];

        let mut bad_port = base.to_vec();
        bad_port.push(("SERVER_PORT", "eighty"));
        assert!(matches!(
            load(&bad_port),
            Err(ConfigError::Invalid { key: "SERVER_PORT", .. })
        ));

        let mut asymmetric = base.to_vec();
        asymmetric.push(("JWT_ALGORITHM", "RS256"));
        assert!(matches!(
            load(&asymmetric),
            Err(ConfigError::Invalid { key: "JWT_ALGORITHM", .. })
        ));

        let mut zero_ttl = base.to_vec();
        zero_ttl.push(("ACCESS_TOKEN_EXPIRE_MINUTES", "0"));
        assert!(matches!(
            load(&zero_ttl),
            Err(ConfigError::Invalid { key: "ACCESS_TOKEN_EXPIRE_MINUTES", .. })
        ));
    }

    #[test]
    fn test_config_bounds_token_lifetime() {
        let base = [("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "secret")];

        for too_long in ["9223372036854775807", "5256001", "99999999999"] {
            let mut pairs = base.to_vec();
            pairs.push(("ACCESS_TOKEN_EXPIRE_MINUTES", too_long));
            assert!(
                matches!(
                    load(&pairs),
                    Err(ConfigError::Invalid { key: "ACCESS_TOKEN_EXPIRE_MINUTES", .. })
                ),
                "{} should be rejected",
                too_long
            );
        }

        let mut longest = base.to_vec();
        longest.push(("ACCESS_TOKEN_EXPIRE_MINUTES", "5256000"));
        let config = load(&longest).unwrap();
        assert_eq!(config.access_token_ttl, chrono::Duration::days(3650));

        // The longest accepted lifetime still yields a usable token.
        let tokens = crate::auth::TokenService::from_config(&config);
        let user_id = uuid::Uuid::new_v4();
        let token = tokens.issue(user_id, config.access_token_ttl).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), user_id);
    }
}
