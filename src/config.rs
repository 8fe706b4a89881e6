//! Configuration management for MirrorChain

use serde::Deserialize;
use std::fs;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub replication: ReplicationConfig,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    /// Listening port for the holder, target port for followers.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Client connection retry bound.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplicationConfig {
    /// Transmit transaction bodies alongside block metadata, enabling full
    /// hash verification on the follower side.
    #[serde(default)]
    pub include_transactions: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_addr: default_bind_addr(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let config_str = fs::read_to_string("config.toml").unwrap_or_default();
    if config_str.is_empty() {
        // Sane defaults when config.toml is absent
        return Ok(Config::default());
    }
    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let config: Config = toml::from_str(config_str)?;

    // Validate critical values
    if config.network.port == 0 {
        return Err("network.port must be nonzero".into());
    }

    if config.network.max_attempts == 0 {
        return Err("network.max_attempts must be at least 1".into());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let config = Config {
            network: NetworkConfig::default(),
            replication: ReplicationConfig::default(),
        };
        assert_eq!(config.network.port, 8080);
        assert_eq!(config.network.max_attempts, 5);
        assert!(!config.replication.include_transactions);
    }

    #[test]
    fn parses_partial_toml() {
        let config = parse_config(
            r#"
            [network]
            port = 9000

            [replication]
            include_transactions = true
            "#,
        )
        .unwrap();
        assert_eq!(config.network.port, 9000);
        assert_eq!(config.network.max_attempts, 5);
        assert!(config.replication.include_transactions);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse_config("[network\nport = ]").is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse_config("[network]\nport = 0").is_err());
        assert!(parse_config("[network]\nmax_attempts = 0").is_err());
    }
}
