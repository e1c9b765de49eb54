//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! The signing key is deliberately absent; see [`crate::blockchain::wallet`].

use serde::{Deserialize, Serialize};

/// Root configuration for the federation client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Node endpoint. `ws://`/`wss://` select the streaming transport,
    /// `http://`/`https://` the request/response one.
    pub node_url: String,

    /// Operator address. Optional; the address derived from the private
    /// key always wins.
    pub eth_address: Option<String>,

    /// Path to the compiled contract artifact (JSON with an `abi` field).
    pub abi_path: String,

    /// Federation contract address.
    pub contract_address: String,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Rewrite oversized `extraData` headers (Clique/QBFT chains).
    pub poa_compat: bool,

    /// Gas limit used when a transaction does not carry one.
    pub default_gas_limit: Option<u64>,

    /// Bind address for the Prometheus scrape endpoint (e.g. "0.0.0.0:9100").
    pub metrics_address: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_url: "http://localhost:8545".to_string(),
            eth_address: None,
            abi_path: "/smart-contracts/artifacts/contracts/Federation.sol/Federation.json".to_string(),
            contract_address: String::new(),
            rpc_timeout_secs: 10,
            poa_compat: true,
            default_gas_limit: None,
            metrics_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.node_url, "http://localhost:8545");
        assert_eq!(config.rpc_timeout_secs, 10);
        assert!(config.poa_compat);
        assert!(config.eth_address.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            node_url = "wss://node.example:8546"
            contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            default_gas_limit = 500000
            "#,
        )
        .unwrap();

        assert_eq!(config.node_url, "wss://node.example:8546");
        assert_eq!(config.default_gas_limit, Some(500_000));
        assert_eq!(config.rpc_timeout_secs, 10);
        assert!(config.poa_compat);
    }
}
