//! Node connection with per-call timeouts.
//!
//! # Responsibilities
//! - Pick the transport from the endpoint scheme
//! - Verify the node answers before handing out a client
//! - Wrap every RPC in a timeout and map failures onto [`BlockchainError`]
//! - Route raw blocks through the PoA header adapter

use std::future::IntoFuture;
use std::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::transports::TransportResult;
use serde_json::{Map, Value};
use tokio::time::timeout;
use url::Url;

use crate::blockchain::poa::{BlockHeader, PoaHeaderAdapter};
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId};
use crate::config::ClientConfig;
use crate::observability::metrics;

/// Transport family selected from the endpoint URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Persistent websocket (`ws://`, `wss://`).
    WebSocket,
    /// Request/response HTTP (`http://`, `https://`).
    Http,
}

impl TransportKind {
    pub fn from_url(url: &Url) -> BlockchainResult<Self> {
        match url.scheme() {
            "ws" | "wss" => Ok(TransportKind::WebSocket),
            "http" | "https" => Ok(TransportKind::Http),
            other => Err(BlockchainError::Configuration(format!(
                "eth_node_url must start with ws://, wss://, http:// or https:// (got '{}://')",
                other
            ))),
        }
    }
}

/// Established connection to an Ethereum node.
#[derive(Clone)]
pub struct BlockchainClient {
    provider: DynProvider,
    endpoint: String,
    transport: TransportKind,
    chain_id: ChainId,
    client_version: String,
    timeout_duration: Duration,
    header_adapter: PoaHeaderAdapter,
}

impl BlockchainClient {
    /// Connect to the node named by `config.node_url` and verify it is alive.
    pub async fn connect(config: &ClientConfig) -> BlockchainResult<Self> {
        let url: Url = config.node_url.parse().map_err(|e| {
            BlockchainError::Configuration(format!("Invalid node URL '{}': {}", config.node_url, e))
        })?;
        let transport = TransportKind::from_url(&url)?;
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);

        let provider = match transport {
            TransportKind::Http => ProviderBuilder::default().connect_http(url).erased(),
            TransportKind::WebSocket => {
                let connecting = ProviderBuilder::default().connect_ws(WsConnect::new(url.as_str()));
                match timeout(timeout_duration, connecting).await {
                    Ok(Ok(provider)) => provider.erased(),
                    Ok(Err(e)) => {
                        metrics::record_node_health(false);
                        return Err(BlockchainError::Connectivity {
                            url: config.node_url.clone(),
                            reason: e.to_string(),
                        });
                    }
                    Err(_) => {
                        metrics::record_node_health(false);
                        return Err(BlockchainError::Connectivity {
                            url: config.node_url.clone(),
                            reason: format!("websocket handshake timed out after {}s", config.rpc_timeout_secs),
                        });
                    }
                }
            }
        };

        Self::with_provider(provider, config).await
    }

    /// Build a client over an existing provider (custom or mocked transports).
    ///
    /// Runs the same liveness probe and chain-id lookup as [`Self::connect`].
    pub async fn with_provider(provider: DynProvider, config: &ClientConfig) -> BlockchainResult<Self> {
        let url: Url = config.node_url.parse().map_err(|e| {
            BlockchainError::Configuration(format!("Invalid node URL '{}': {}", config.node_url, e))
        })?;

        let mut client = Self {
            provider,
            endpoint: config.node_url.clone(),
            transport: TransportKind::from_url(&url)?,
            chain_id: ChainId(0),
            client_version: String::new(),
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            header_adapter: PoaHeaderAdapter::new(config.poa_compat),
        };

        let probe = client
            .rpc("web3_clientVersion", client.provider.get_client_version())
            .await;
        let client_version = match probe {
            Ok(version) => version,
            Err(e) => {
                metrics::record_node_health(false);
                return Err(BlockchainError::Connectivity {
                    url: client.endpoint.clone(),
                    reason: e.to_string(),
                });
            }
        };
        metrics::record_node_health(true);

        let chain_id = client.rpc("eth_chainId", client.provider.get_chain_id()).await?;
        client.client_version = client_version;
        client.chain_id = ChainId(chain_id);

        tracing::info!(
            endpoint = %client.endpoint,
            transport = ?client.transport,
            client_version = %client.client_version,
            chain_id = client.chain_id.0,
            poa_compat = client.header_adapter.is_enabled(),
            "Connected to Ethereum node"
        );

        Ok(client)
    }

    /// Await an RPC future under the configured timeout.
    async fn rpc<T, F>(&self, method: &'static str, call: F) -> BlockchainResult<T>
    where
        F: IntoFuture<Output = TransportResult<T>>,
    {
        match timeout(self.timeout_duration, call.into_future()).await {
            Ok(Ok(value)) => {
                metrics::record_rpc_call(method, "ok");
                Ok(value)
            }
            Ok(Err(e)) => {
                metrics::record_rpc_call(method, "error");
                tracing::debug!(method, error = %e, "RPC call failed");
                Err(BlockchainError::Rpc {
                    method,
                    message: e.to_string(),
                })
            }
            Err(_) => {
                metrics::record_rpc_call(method, "timeout");
                Err(BlockchainError::Timeout {
                    method,
                    secs: self.timeout_duration.as_secs(),
                })
            }
        }
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.rpc("eth_blockNumber", self.provider.get_block_number()).await
    }

    /// Transaction count of `address` including pending transactions.
    pub async fn get_pending_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.rpc(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address).pending(),
        )
        .await
    }

    /// Receipt as the node sent it; `None` until the transaction is mined.
    ///
    /// Kept as raw JSON so node-specific fields (Besu's `revertReason`) survive.
    pub async fn get_transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<Map<String, Value>>> {
        let raw: Value = self
            .rpc(
                "eth_getTransactionReceipt",
                self.provider
                    .raw_request::<_, Value>("eth_getTransactionReceipt".into(), (tx_hash,)),
            )
            .await?;

        match raw {
            Value::Null => Ok(None),
            Value::Object(fields) => Ok(Some(fields)),
            other => Err(BlockchainError::Rpc {
                method: "eth_getTransactionReceipt",
                message: format!("expected a receipt object, got {}", other),
            }),
        }
    }

    /// Fetch a block header, applying the PoA adapter before strict parsing.
    pub async fn get_block_header(&self, number: u64) -> BlockchainResult<Option<BlockHeader>> {
        let raw: Value = self
            .rpc(
                "eth_getBlockByNumber",
                self.provider.raw_request::<_, Value>(
                    "eth_getBlockByNumber".into(),
                    (BlockNumberOrTag::Number(number), false),
                ),
            )
            .await?;

        if raw.is_null() {
            return Ok(None);
        }
        BlockHeader::from_json(self.header_adapter.adapt(raw)).map(Some)
    }

    /// Submit an encoded transaction; node rejections surface as [`BlockchainError::Broadcast`].
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        let pending = self
            .rpc("eth_sendRawTransaction", self.provider.send_raw_transaction(raw))
            .await
            .map_err(|e| match e {
                BlockchainError::Rpc { message, .. } => BlockchainError::Broadcast(message),
                other => other,
            })?;
        Ok(*pending.tx_hash())
    }

    /// Read-only contract call against the latest block.
    pub async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        self.rpc("eth_call", self.provider.call(tx)).await
    }

    pub async fn get_logs(&self, filter: &Filter) -> BlockchainResult<Vec<Log>> {
        self.rpc("eth_getLogs", self.provider.get_logs(filter)).await
    }

    /// Install a server-side log filter, returning its id.
    pub async fn new_filter(&self, filter: &Filter) -> BlockchainResult<U256> {
        self.rpc("eth_newFilter", self.provider.new_filter(filter)).await
    }

    pub async fn get_filter_changes(&self, id: U256) -> BlockchainResult<Vec<Log>> {
        self.rpc(
            "eth_getFilterChanges",
            self.provider.get_filter_changes::<Log>(id),
        )
        .await
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn client_version(&self) -> &str {
        &self.client_version
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("endpoint", &self.endpoint)
            .field("transport", &self.transport)
            .field("chain_id", &self.chain_id.0)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::transports::mock::Asserter;

    fn test_config() -> ClientConfig {
        ClientConfig {
            node_url: "http://localhost:8545".to_string(),
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            rpc_timeout_secs: 5,
            ..ClientConfig::default()
        }
    }

    fn mocked(asserter: &Asserter) -> DynProvider {
        ProviderBuilder::default()
            .connect_mocked_client(asserter.clone())
            .erased()
    }

    #[test]
    fn test_transport_from_scheme() {
        let kind = |s: &str| TransportKind::from_url(&s.parse().unwrap());
        assert_eq!(kind("ws://node:8546").unwrap(), TransportKind::WebSocket);
        assert_eq!(kind("wss://node:8546").unwrap(), TransportKind::WebSocket);
        assert_eq!(kind("http://node:8545").unwrap(), TransportKind::Http);
        assert_eq!(kind("https://node").unwrap(), TransportKind::Http);
        assert!(matches!(kind("ipc://node"), Err(BlockchainError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_bad_scheme_fails_before_dialing() {
        let config = ClientConfig {
            node_url: "ftp://node:21".to_string(),
            ..test_config()
        };
        let result = BlockchainClient::connect(&config).await;
        assert!(matches!(result, Err(BlockchainError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_liveness_probe() {
        let asserter = Asserter::new();
        asserter.push_success(&"Besu/v24.1.0/linux-x86_64/openjdk-java-17");
        asserter.push_success(&"0x539");

        let client = BlockchainClient::with_provider(mocked(&asserter), &test_config())
            .await
            .unwrap();
        assert_eq!(client.chain_id(), ChainId(1337));
        assert_eq!(client.transport(), TransportKind::Http);
        assert!(client.client_version().starts_with("Besu"));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_connectivity_error() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("connection refused");

        let result = BlockchainClient::with_provider(mocked(&asserter), &test_config()).await;
        match result {
            Err(BlockchainError::Connectivity { url, .. }) => assert_eq!(url, "http://localhost:8545"),
            other => panic!("expected connectivity error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_block_header_goes_through_adapter() {
        let asserter = Asserter::new();
        asserter.push_success(&"Besu/v24.1.0");
        asserter.push_success(&"0x539");
        asserter.push_success(&serde_json::json!({
            "number": "0x64",
            "hash": format!("0x{}", "aa".repeat(32)),
            "parentHash": format!("0x{}", "bb".repeat(32)),
            "timestamp": "0x65000000",
            "extraData": format!("0x{}", "cd".repeat(120)),
        }));
        asserter.push_success(&serde_json::Value::Null);

        let client = BlockchainClient::with_provider(mocked(&asserter), &test_config())
            .await
            .unwrap();

        let header = client.get_block_header(100).await.unwrap().unwrap();
        assert_eq!(header.number(), 100);
        assert_eq!(header.timestamp(), 0x65000000);

        assert!(client.get_block_header(101).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejected_raw_transaction_is_broadcast_error() {
        let asserter = Asserter::new();
        asserter.push_success(&"Besu/v24.1.0");
        asserter.push_success(&"0x539");
        asserter.push_failure_msg("nonce too low");

        let client = BlockchainClient::with_provider(mocked(&asserter), &test_config())
            .await
            .unwrap();

        let err = client.send_raw_transaction(&[0xf8, 0x00]).await.unwrap_err();
        match err {
            BlockchainError::Broadcast(message) => assert!(message.contains("nonce too low")),
            other => panic!("expected broadcast error, got {:?}", other),
        }
    }
}
