use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

/// Bind configuration shared by every service binary.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load from an optional `configuration` file, then `APP__`-prefixed
    /// environment variables (e.g. `APP__PORT=9000`).
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// The socket address to bind, validating the configured host.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("Invalid bind host: {}", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_hostnames() {
        let config = Config {
            host: "localhost".to_string(),
            port: 8080,
        };
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn bind_addr_accepts_wildcard() {
        let config = Config {
            host: default_host(),
            port: 0,
        };
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:0");
    }
}
