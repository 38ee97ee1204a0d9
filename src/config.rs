//! Server configuration from environment variables.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::api::SecurityConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind: IpAddr,
    /// SQLite file. `None` uses the platform data directory.
    pub database_path: Option<PathBuf>,
    pub security: SecurityConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `NEXTNOTE_BIND`: listen address (default: 127.0.0.1)
    /// - `NEXTNOTE_DB_PATH`: SQLite database file
    /// - `NEXTNOTE_API_KEY`: bearer token required on every API request
    /// - `NEXTNOTE_CORS_ORIGINS`: comma-separated allowed origins
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = match lookup("NEXTNOTE_BIND") {
            Some(raw) => raw.trim().parse::<IpAddr>().map_err(|_| ConfigError::InvalidValue {
                name: "NEXTNOTE_BIND".to_string(),
                reason: format!("not an IP address: {}", raw),
            })?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        let database_path = lookup("NEXTNOTE_DB_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let security = match lookup("NEXTNOTE_API_KEY").filter(|s| !s.is_empty()) {
            Some(key) => SecurityConfig::with_api_key(key),
            None => SecurityConfig::disabled(),
        };

        let cors_origins = lookup("NEXTNOTE_CORS_ORIGINS").map(|s| {
            s.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        Ok(Self {
            bind,
            database_path,
            security: SecurityConfig {
                cors_origins,
                ..security
            },
        })
    }

    /// Get the socket address for the server.
    pub fn socket_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.bind, port)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid environment variable value.
    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
