use std::env;
use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use tracing::info;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_CORS_ORIGINS: &str = "http://127.0.0.1:8080,http://127.0.0.1:3000";
const DEFAULT_MAX_CONNECTIONS: &str = "10";

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "{} must be set", key),
            Self::Invalid { key, value } => write!(f, "Invalid {} value: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<HeaderValue>,
    pub max_connections: u32,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                info!("{} not set, using default: {}", key, default);
                default.to_string()
            })
        };

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = or_default("BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| ConfigError::Invalid { key: "BIND_ADDR", value: bind_addr.clone() })?;

        let max_connections = or_default("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let max_connections = max_connections.parse().map_err(|_| ConfigError::Invalid {
            key: "DATABASE_MAX_CONNECTIONS",
            value: max_connections.clone(),
        })?;

        let cors_origins = or_default("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|_| ConfigError::Invalid {
                    key: "CORS_ORIGINS",
                    value: origin.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            database_url,
            redis_url: or_default("REDIS_URL", DEFAULT_REDIS_URL),
            bind_addr,
            cors_origins,
            max_connections,
        })
    }
}
