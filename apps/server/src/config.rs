//! Layered configuration: optional `config/default.toml`, then environment
//! variables with the `ACADEMY` prefix (e.g. `ACADEMY__SERVER__PORT=8080`).

use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins; empty means allow any (development default).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Engine-facing knobs; the engine only ever sees this struct.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u64,
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "postgres://localhost/academy".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_limit() -> u64 {
    12
}

fn default_max_limit() -> u64 {
    50
}

fn default_radius_km() -> f64 {
    10.0
}

fn default_log_filter() -> String {
    "info,academy_server=debug".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            default_radius_km: default_radius_km(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from the optional file and the environment.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("ACADEMY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.search.default_limit == 0 || self.search.max_limit == 0 {
            return Err("search limits must be positive".to_string());
        }
        if self.search.default_limit > self.search.max_limit {
            return Err("search.default_limit exceeds search.max_limit".to_string());
        }
        if !self.search.default_radius_km.is_finite() || self.search.default_radius_km <= 0.0 {
            return Err("search.default_radius_km must be positive".to_string());
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self.server.host.parse()?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.search.default_limit, 12);
        assert_eq!(config.search.max_limit, 50);
        assert_eq!(config.search.default_radius_km, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_limits() {
        let mut config = Config::default();
        config.search.default_limit = 100;
        assert!(config.validate().is_err());
    }
}
