//! Runtime configuration read from the process environment.
//!
//! Both binaries call [`AppConfig::from_env`], which first loads a `.env` file
//! from the working directory if one exists. Every key is optional:
//!
//! | Key | Default |
//! |---|---|
//! | `DATABASE_URL` | unset: content is kept in memory |
//! | `OPENAI_API_KEY` (or `OPENAI_API_KEY_ENV_VAR`) | unset: AI calls fail |
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `OPENAI_MODEL` | `gpt-4o` |
//! | `OPENAI_TIMEOUT_SECS` | `60` |
//! | `BIND_ADDR` | `0.0.0.0:5000` |
//! | `UPLOAD_LIMIT_BYTES` | 10 MiB |
//! | `STATIC_DIR` | unset: no frontend bundle is served |

use crate::ai::{AiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub ai: AiConfig,
    pub bind_addr: SocketAddr,
    pub upload_limit: usize,
    pub static_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Reads the configuration from the environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::DotEnv(e));
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs: u64 = parse_or(&get, "OPENAI_TIMEOUT_SECS", 60)?;

        Ok(AppConfig {
            database_url: get("DATABASE_URL"),
            ai: AiConfig {
                api_key: get("OPENAI_API_KEY").or_else(|| get("OPENAI_API_KEY_ENV_VAR")),
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
            bind_addr: match get("BIND_ADDR") {
                Some(value) => parse("BIND_ADDR", &value)?,
                None => parse("BIND_ADDR", DEFAULT_BIND_ADDR)?,
            },
            upload_limit: parse_or(&get, "UPLOAD_LIMIT_BYTES", DEFAULT_UPLOAD_LIMIT)?,
            static_dir: get("STATIC_DIR").map(PathBuf::from),
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => parse(key, &value),
        None => Ok(default),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to load .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(None, config.database_url);
        assert_eq!(None, config.ai.api_key);
        assert_eq!(DEFAULT_BASE_URL, config.ai.base_url);
        assert_eq!("gpt-4o", config.ai.model);
        assert_eq!(Duration::from_secs(60), config.ai.timeout);
        assert_eq!("0.0.0.0:5000".parse::<SocketAddr>().unwrap(), config.bind_addr);
        assert_eq!(10 * 1024 * 1024, config.upload_limit);
        assert_eq!(None, config.static_dir);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite://content.db"),
            ("OPENAI_API_KEY_ENV_VAR", "sk-fallback"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_TIMEOUT_SECS", "5"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("UPLOAD_LIMIT_BYTES", "1024"),
            ("STATIC_DIR", "dist/public"),
        ]))
        .unwrap();

        assert_eq!(Some("sqlite://content.db".to_string()), config.database_url);
        assert_eq!(Some("sk-fallback".to_string()), config.ai.api_key);
        assert_eq!("gpt-4o-mini", config.ai.model);
        assert_eq!(Duration::from_secs(5), config.ai.timeout);
        assert_eq!(8080, config.bind_addr.port());
        assert_eq!(1024, config.upload_limit);
        assert_eq!(Some(PathBuf::from("dist/public")), config.static_dir);
    }

    #[test]
    fn test_primary_api_key_wins_and_blank_is_unset() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-primary"),
            ("OPENAI_API_KEY_ENV_VAR", "sk-fallback"),
            ("DATABASE_URL", "  "),
        ]))
        .unwrap();

        assert_eq!(Some("sk-primary".to_string()), config.ai.api_key);
        assert_eq!(None, config.database_url);
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup(&[("UPLOAD_LIMIT_BYTES", "ten")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "UPLOAD_LIMIT_BYTES",
                ..
            }
        ));

        assert!(AppConfig::from_lookup(lookup(&[("BIND_ADDR", "localhost")])).is_err());
    }
}
