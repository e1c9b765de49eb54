//! Receipt retrieval and normalization.
//!
//! Normalization edits the node's JSON rather than rebuilding it: hash, bloom
//! and topic values become [`to_canonical_hex`] text, `from`/`to` become the
//! checksummed `from_address`/`to_address`, and the block timestamp is added.
//! Every other key stays exactly as the node sent it, node extensions such as
//! Besu's `revertReason` included.

use alloy::hex;
use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::Log;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{to_canonical_hex, BlockchainError, BlockchainResult};

const RECEIPT_METHOD: &str = "eth_getTransactionReceipt";

/// A transaction receipt with text-encoded hashes and the block timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReceipt {
    pub transaction_hash: String,
    pub block_hash: Option<String>,
    pub logs_bloom: Option<String>,
    #[serde(rename = "from_address")]
    pub from_address: String,
    /// `None` for contract creations.
    #[serde(rename = "to_address")]
    pub to_address: Option<String>,
    pub logs: Vec<NormalizedLog>,
    /// Timestamp of the containing block, seconds since epoch.
    pub timestamp: u64,
    /// Untouched node fields: `status`, `blockNumber`, `gasUsed`, ...
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl NormalizedReceipt {
    /// Execution outcome from `status`; `None` on receipts that carry `root` instead.
    pub fn succeeded(&self) -> Option<bool> {
        quantity(&self.other, "status").map(|status| status == 1)
    }

    pub fn block_number(&self) -> Option<u64> {
        quantity(&self.other, "blockNumber")
    }
}

/// A contract log with text-encoded references and topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedLog {
    pub block_hash: Option<String>,
    pub transaction_hash: Option<String>,
    pub topics: Vec<String>,
    /// Untouched node fields: `address`, `data`, `logIndex`, `removed`, ...
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl NormalizedLog {
    fn from_json(mut fields: Map<String, Value>, method: &'static str) -> BlockchainResult<Self> {
        let block_hash = take_hex(&mut fields, "blockHash", method)?;
        let transaction_hash = take_hex(&mut fields, "transactionHash", method)?;

        let topics = match fields.remove("topics") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(topics)) => topics
                .into_iter()
                .map(|topic| match topic {
                    Value::String(text) => hex_text(&text, "topics", method),
                    other => Err(malformed(method, "topics", other)),
                })
                .collect::<BlockchainResult<_>>()?,
            Some(other) => return Err(malformed(method, "topics", other)),
        };

        Ok(Self {
            block_hash,
            transaction_hash,
            topics,
            other: fields,
        })
    }

    pub fn address(&self) -> Option<Address> {
        self.other.get("address")?.as_str()?.parse().ok()
    }

    pub fn block_number(&self) -> Option<u64> {
        quantity(&self.other, "blockNumber")
    }

    pub fn log_index(&self) -> Option<u64> {
        quantity(&self.other, "logIndex")
    }
}

impl TryFrom<&Log> for NormalizedLog {
    type Error = BlockchainError;

    fn try_from(log: &Log) -> BlockchainResult<Self> {
        match serde_json::to_value(log) {
            Ok(Value::Object(fields)) => Self::from_json(fields, "eth_getLogs"),
            Ok(other) => Err(malformed("eth_getLogs", "log", other)),
            Err(e) => Err(malformed("eth_getLogs", "log", e)),
        }
    }
}

fn malformed(method: &'static str, field: &str, detail: impl std::fmt::Display) -> BlockchainError {
    BlockchainError::Rpc {
        method,
        message: format!("malformed {}: {}", field, detail),
    }
}

/// Hex quantity such as `"0x1a"`.
fn quantity(fields: &Map<String, Value>, key: &str) -> Option<u64> {
    let text = fields.get(key)?.as_str()?;
    u64::from_str_radix(text.strip_prefix("0x")?, 16).ok()
}

fn hex_text(text: &str, field: &str, method: &'static str) -> BlockchainResult<String> {
    hex::decode(text)
        .map(to_canonical_hex)
        .map_err(|e| malformed(method, field, e))
}

fn take_hex(fields: &mut Map<String, Value>, key: &str, method: &'static str) -> BlockchainResult<Option<String>> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => hex_text(&text, key, method).map(Some),
        Some(other) => Err(malformed(method, key, other)),
    }
}

fn take_address(fields: &mut Map<String, Value>, key: &str) -> BlockchainResult<Option<String>> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => text
            .parse::<Address>()
            .map(|address| Some(address.to_checksum(None)))
            .map_err(|e| malformed(RECEIPT_METHOD, key, e)),
        Some(other) => Err(malformed(RECEIPT_METHOD, key, other)),
    }
}

/// Convert a raw receipt object, attaching the containing block's `timestamp`.
pub fn normalize_receipt(mut fields: Map<String, Value>, timestamp: u64) -> BlockchainResult<NormalizedReceipt> {
    let transaction_hash = take_hex(&mut fields, "transactionHash", RECEIPT_METHOD)?
        .ok_or_else(|| malformed(RECEIPT_METHOD, "receipt", "no transactionHash"))?;
    let block_hash = take_hex(&mut fields, "blockHash", RECEIPT_METHOD)?;
    let logs_bloom = take_hex(&mut fields, "logsBloom", RECEIPT_METHOD)?;

    let from_address = take_address(&mut fields, "from")?
        .ok_or_else(|| malformed(RECEIPT_METHOD, "receipt", "no from"))?;
    let to_address = take_address(&mut fields, "to")?;

    let logs = match fields.remove("logs") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(logs)) => logs
            .into_iter()
            .map(|log| match log {
                Value::Object(log) => NormalizedLog::from_json(log, RECEIPT_METHOD),
                other => Err(malformed(RECEIPT_METHOD, "logs", other)),
            })
            .collect::<BlockchainResult<_>>()?,
        Some(other) => return Err(malformed(RECEIPT_METHOD, "logs", other)),
    };

    // the block's timestamp takes the key
    fields.remove("timestamp");

    Ok(NormalizedReceipt {
        transaction_hash,
        block_hash,
        logs_bloom,
        from_address,
        to_address,
        logs,
        timestamp,
        other: fields,
    })
}

/// Parse a transaction hash given as text, with or without `0x`.
pub fn parse_tx_hash(raw: &str) -> BlockchainResult<TxHash> {
    raw.trim()
        .parse::<TxHash>()
        .map_err(|e| BlockchainError::InvalidInput(format!("'{}' is not a transaction hash: {}", raw, e)))
}

/// Fetch and normalize the receipt for `tx_hash`.
///
/// Does not wait: a transaction that is not yet mined yields
/// [`BlockchainError::NotFound`].
pub async fn fetch_receipt(client: &BlockchainClient, tx_hash: TxHash) -> BlockchainResult<NormalizedReceipt> {
    let receipt = client
        .get_transaction_receipt(tx_hash)
        .await?
        .ok_or_else(|| BlockchainError::NotFound(to_canonical_hex(tx_hash)))?;

    let block_number = quantity(&receipt, "blockNumber")
        .ok_or_else(|| malformed(RECEIPT_METHOD, "receipt", "no blockNumber"))?;

    let header = client
        .get_block_header(block_number)
        .await?
        .ok_or_else(|| BlockchainError::Rpc {
            method: "eth_getBlockByNumber",
            message: format!("block {} not found", block_number),
        })?;

    tracing::debug!(
        tx_hash = %tx_hash,
        block_number,
        status = ?receipt.get("status"),
        "Fetched transaction receipt"
    );

    normalize_receipt(receipt, header.timestamp())
}
