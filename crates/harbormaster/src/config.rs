use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub auth: AuthSection,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Address to use when advertising this node
    #[serde(default = "default_advertise_host")]
    pub advertise_host: String,

    #[serde(default = "default_bind_port")]
    pub advertise_port: u16,

    /// Local node id; a fresh UUID is generated when left empty
    #[serde(default)]
    pub node_id: String,

    #[serde(default)]
    pub server_group: String,

    /// Attach error causes to statuses as debug details
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AuthSection {
    /// Bearer token required on API calls; empty disables auth
    #[serde(default)]
    pub api_token: String,
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_bind_port() -> u16 {
    18098
}

fn default_advertise_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            bind_port: default_bind_port(),
            advertise_host: default_advertise_host(),
            advertise_port: default_bind_port(),
            node_id: String::new(),
            server_group: String::new(),
            debug: false,
            allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.gateway.bind_host.is_empty() {
            anyhow::bail!("gateway.bind_host must not be empty");
        }
        if self.gateway.bind_port == 0 {
            anyhow::bail!("gateway.bind_port must be > 0");
        }
        if self.gateway.advertise_port == 0 {
            anyhow::bail!("gateway.advertise_port must be > 0");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("QUAY_BIND_HOST") {
            if !val.is_empty() {
                self.gateway.bind_host = val;
            }
        }
        if let Ok(val) = std::env::var("QUAY_BIND_PORT") {
            if let Ok(port) = val.parse::<u16>() {
                self.gateway.bind_port = port;
            }
        }
        if let Ok(val) = std::env::var("QUAY_NODE_ID") {
            if !val.is_empty() {
                self.gateway.node_id = val;
            }
        }
        if let Ok(token) = std::env::var("QUAY_API_TOKEN") {
            if self.auth.api_token.is_empty() {
                self.auth.api_token = token;
            }
        }
    }
}

/// Load config from file or use defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = if let Some(path) = path {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&content).context("Failed to parse TOML config")?
    } else {
        Config {
            gateway: GatewayConfig::default(),
            auth: AuthSection::default(),
        }
    };

    // Apply environment variable overrides
    config.apply_env_overrides();

    // Validate config
    config.validate()?;

    Ok(config)
}
