use axum::http::HeaderValue;
use std::{env, net::SocketAddr, path::PathBuf};
use thiserror::Error;

pub mod cors;

pub use cors::create_cors_layer;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// When set, the named file must exist and is loaded before reading config.
pub const ENV_FILE_VAR: &str = "CALENDAR_ENV_FILE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to load env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub allowed_origin: HeaderValue,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = parse_or_default(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR, |raw| {
            raw.parse::<SocketAddr>().map_err(|e| e.to_string())
        })?;

        let max_connections = parse_or_default(
            &lookup,
            "DATABASE_MAX_CONNECTIONS",
            &DEFAULT_MAX_CONNECTIONS.to_string(),
            |raw| match raw.parse::<u32>() {
                Ok(0) => Err("must be at least 1".to_string()),
                Ok(n) => Ok(n),
                Err(e) => Err(e.to_string()),
            },
        )?;

        let allowed_origin = parse_or_default(
            &lookup,
            "CORS_ALLOWED_ORIGIN",
            DEFAULT_ALLOWED_ORIGIN,
            |raw| raw.parse::<HeaderValue>().map_err(|e| e.to_string()),
        )?;

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            allowed_origin,
        })
    }
}

fn parse_or_default<F, T>(
    lookup: &F,
    var: &'static str,
    default: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(var).unwrap_or_else(|| default.to_string());
    let trimmed = raw.trim();
    parse(trimmed).map_err(|reason| ConfigError::Invalid {
        var,
        value: trimmed.to_string(),
        reason,
    })
}

/// Seeds the process environment from a dotenv file.
///
/// With `CALENDAR_ENV_FILE` set, that file is required. Otherwise a `.env`
/// in the working directory is loaded if one exists.
pub fn load_env_file() -> Result<Option<PathBuf>, ConfigError> {
    match env::var_os(ENV_FILE_VAR) {
        Some(path) => {
            let path = PathBuf::from(path);
            dotenvy::from_path(&path).map_err(|source| ConfigError::EnvFile {
                path: path.clone(),
                source,
            })?;
            Ok(Some(path))
        }
        None => Ok(dotenvy::dotenv().ok()),
    }
}
