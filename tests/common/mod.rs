//! Shared fixtures for integration tests.
//!
//! The node is simulated with alloy's mock transport: responses are queued on
//! an [`Asserter`] and handed out in order, one per RPC call.

use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::mock::Asserter;
use serde_json::{json, Value};

use federation_client::blockchain::{BlockchainClient, FederationClient, Wallet};
use federation_client::config::ClientConfig;

// Well-known test private key (Anvil's first account)
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

pub fn test_config() -> ClientConfig {
    ClientConfig {
        node_url: "http://localhost:8545".to_string(),
        abi_path: concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/federation_abi.json").to_string(),
        contract_address: CONTRACT_ADDRESS.to_string(),
        rpc_timeout_secs: 5,
        default_gas_limit: Some(300_000),
        ..ClientConfig::default()
    }
}

pub fn hash(byte: &str) -> String {
    format!("0x{}", byte.repeat(32))
}

/// Queue the three construction-time responses: client version, chain id,
/// pending transaction count.
pub fn push_handshake(asserter: &Asserter, pending_nonce: u64) {
    asserter.push_success(&"Besu/v24.1.0/linux-x86_64/openjdk-java-17");
    asserter.push_success(&"0x539");
    asserter.push_success(&format!("{:#x}", pending_nonce));
}

/// Client wired to a mocked node with `pending_nonce` as the account's tx count.
#[allow(dead_code)]
pub async fn mocked_client(asserter: &Asserter, pending_nonce: u64) -> FederationClient {
    mocked_client_with(asserter, pending_nonce, test_config()).await
}

pub async fn mocked_client_with(asserter: &Asserter, pending_nonce: u64, config: ClientConfig) -> FederationClient {
    push_handshake(asserter, pending_nonce);
    let provider = ProviderBuilder::default()
        .connect_mocked_client(asserter.clone())
        .erased();
    let connection = BlockchainClient::with_provider(provider, &config).await.unwrap();
    let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
    FederationClient::with_client(connection, &config, wallet).await.unwrap()
}

/// A mined legacy receipt from the test account to the contract.
#[allow(dead_code)]
pub fn receipt_json(tx_hash: &str, block_number: u64) -> Value {
    json!({
        "type": "0x0",
        "status": "0x1",
        "cumulativeGasUsed": "0xb1c2",
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "logs": [{
            "address": CONTRACT_ADDRESS.to_lowercase(),
            "topics": [hash("4F")],
            "data": "0x",
            "blockHash": hash("BB"),
            "blockNumber": format!("{:#x}", block_number),
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "logIndex": "0x0",
            "removed": false
        }],
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": hash("BB"),
        "blockNumber": format!("{:#x}", block_number),
        "gasUsed": "0xb1c2",
        "effectiveGasPrice": "0x0",
        "from": TEST_ADDRESS.to_lowercase(),
        "to": CONTRACT_ADDRESS.to_lowercase(),
        "contractAddress": null
    })
}

/// A QBFT block whose `extraData` carries validator seals.
#[allow(dead_code)]
pub fn qbft_block_json(block_number: u64, timestamp: u64) -> Value {
    json!({
        "number": format!("{:#x}", block_number),
        "hash": hash("BB"),
        "parentHash": hash("AA"),
        "timestamp": format!("{:#x}", timestamp),
        "miner": "0x0000000000000000000000000000000000000000",
        "extraData": format!("0x{}", "f8".repeat(101)),
        "transactions": [],
    })
}
