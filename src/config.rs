use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use strum_macros::{Display, EnumString};

/// Which backend the stores are built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    Mysql,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: tracing::Level,

    /// Events buffered per channel before a slow subscriber starts skipping.
    pub broadcast_capacity: usize,

    // Live feed heartbeat
    pub ws_heartbeat_interval: Duration,
    /// A client silent for this long is disconnected.
    pub ws_client_timeout: Duration,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_signup_per_min: u32,
    pub rate_api_per_min: u32,

    /// Empty or containing "*" means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            store: StoreBackend::Mysql,
            database_url: None,
            db_max_connections: 10,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
            broadcast_capacity: 256,
            ws_heartbeat_interval: Duration::from_secs(5),
            ws_client_timeout: Duration::from_secs(30),
            rate_login_per_min: 60,
            rate_signup_per_min: 30,
            rate_api_per_min: 1000,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Reads `key`, falling back to `default` when unset, and parses it.
fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        let store = var_or("STORE", defaults.store)?;
        let database_url = env::var("DATABASE_URL").ok();
        if store == StoreBackend::Mysql && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORE=mysql"));
        }

        let log_level = match env::var("LOG_LEVEL") {
            Ok(raw) => raw
                .parse::<tracing::Level>()
                .with_context(|| format!("LOG_LEVEL has invalid value {raw:?}"))?,
            Err(_) => defaults.log_level,
        };

        let ws_heartbeat_interval = Duration::from_millis(var_or(
            "WS_HEARTBEAT_MS",
            defaults.ws_heartbeat_interval.as_millis() as u64,
        )?);
        let ws_client_timeout = Duration::from_millis(var_or(
            "WS_CLIENT_TIMEOUT_MS",
            defaults.ws_client_timeout.as_millis() as u64,
        )?);
        if ws_heartbeat_interval.is_zero() || ws_client_timeout <= ws_heartbeat_interval {
            return Err(anyhow!(
                "WS_CLIENT_TIMEOUT_MS must exceed WS_HEARTBEAT_MS, and both must be positive"
            ));
        }

        let cors_allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            Err(_) => defaults.cors_allowed_origins,
        };

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            store,
            database_url,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            api_prefix: env::var("API_PREFIX").unwrap_or(defaults.api_prefix),
            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level,
            broadcast_capacity: var_or("BROADCAST_CAPACITY", defaults.broadcast_capacity)?,
            ws_heartbeat_interval,
            ws_client_timeout,
            rate_login_per_min: var_or("RATE_LOGIN_PER_MIN", defaults.rate_login_per_min)?,
            rate_signup_per_min: var_or("RATE_SIGNUP_PER_MIN", defaults.rate_signup_per_min)?,
            rate_api_per_min: var_or("RATE_API_PER_MIN", defaults.rate_api_per_min)?,
            cors_allowed_origins,
        })
    }

    /// Configuration used by tests: in-memory stores, no database.
    pub fn in_memory() -> Self {
        Self {
            store: StoreBackend::Memory,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_lowercase_names() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("mysql".parse::<StoreBackend>().unwrap(), StoreBackend::Mysql);
        assert!("postgres".parse::<StoreBackend>().is_err());
        assert_eq!(StoreBackend::Memory.to_string(), "memory");
    }

    #[test]
    fn defaults_allow_any_origin() {
        let config = Config::in_memory();
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.cors_allowed_origins, vec!["*".to_string()]);
        assert_eq!(config.store, StoreBackend::Memory);
    }
}
