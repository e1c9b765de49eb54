//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::blockchain::types::BlockchainError;
use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const NODE_URL_ENV_VAR: &str = "ETH_NODE_URL";
pub const ADDRESS_ENV_VAR: &str = "ETH_ADDRESS";
pub const CONTRACT_ADDRESS_ENV_VAR: &str = "CONTRACT_ADDRESS";
pub const ABI_PATH_ENV_VAR: &str = "ABI_PATH";
pub const RPC_TIMEOUT_ENV_VAR: &str = "RPC_TIMEOUT_SECS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => write!(f, "Invalid value for {}: '{}'", var, value),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for BlockchainError {
    fn from(e: ConfigError) -> Self {
        BlockchainError::Configuration(e.to_string())
    }
}

/// Load and validate configuration from a TOML file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: ClientConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    config.apply_overrides(|var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

impl ClientConfig {
    /// Build configuration from defaults plus environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = ClientConfig::default();
        config.apply_overrides(|var| std::env::var(var).ok())?;
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Overlay values from `lookup` (normally the process environment).
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let get = |var| lookup(var).filter(|v: &String| !v.trim().is_empty());

        if let Some(url) = get(NODE_URL_ENV_VAR) {
            self.node_url = url;
        }
        if let Some(address) = get(ADDRESS_ENV_VAR) {
            self.eth_address = Some(address);
        }
        if let Some(address) = get(CONTRACT_ADDRESS_ENV_VAR) {
            self.contract_address = address;
        }
        if let Some(path) = get(ABI_PATH_ENV_VAR) {
            self.abi_path = path;
        }
        if let Some(raw) = get(RPC_TIMEOUT_ENV_VAR) {
            self.rpc_timeout_secs = raw.trim().parse().map_err(|_| ConfigError::Env {
                var: RPC_TIMEOUT_ENV_VAR,
                value: raw.clone(),
            })?;
        }
        Ok(())
    }
}
