//! Process-level settings: listen address and logging

use anyhow::Result;
use config::{Config, Environment};
use std::{env, str::FromStr};
use tracing_subscriber::EnvFilter;

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

impl ServerConfig {
    /// Load listener settings from the environment
    ///
    /// # Environment Variables
    /// - `HOST`: Interface to bind (default: "0.0.0.0")
    /// - `PORT`: Port to bind (default: `default_port`)
    pub fn from_env(default_port: u16) -> Result<Self> {
        let settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(default_port))?
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        Ok(ServerConfig {
            host: settings.get_string("host")?,
            port: settings.get::<u16>("port")?,
        })
    }

    /// Address in `host:port` form for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read `key` from the environment, falling back to `default` when it is
/// unset or does not parse
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

/// Install the global fmt subscriber, filtered by `RUST_LOG` (default: info)
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("setting default subscriber failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_server_config_defaults() {
        unsafe {
            std::env::remove_var("HOST");
            std::env::remove_var("PORT");
        }

        let config = ServerConfig::from_env(5001).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5001);
        assert_eq!(config.bind_address(), "0.0.0.0:5001");
    }

    #[test]
    #[serial]
    fn test_server_config_from_env() {
        unsafe {
            std::env::set_var("HOST", "127.0.0.1");
            std::env::set_var("PORT", "8080");
        }

        let config = ServerConfig::from_env(5001).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");

        unsafe {
            std::env::remove_var("HOST");
            std::env::remove_var("PORT");
        }
    }

    #[test]
    #[serial]
    fn test_env_or_falls_back_on_garbage() {
        unsafe {
            std::env::set_var("EVENTHUB_TEST_NUMBER", " 42 ");
        }
        assert_eq!(env_or("EVENTHUB_TEST_NUMBER", 7u32), 42);

        unsafe {
            std::env::set_var("EVENTHUB_TEST_NUMBER", "forty-two");
        }
        assert_eq!(env_or("EVENTHUB_TEST_NUMBER", 7u32), 7);

        unsafe {
            std::env::remove_var("EVENTHUB_TEST_NUMBER");
        }
        assert_eq!(env_or("EVENTHUB_TEST_NUMBER", 7u32), 7);
    }
}
