//! Block header compatibility for proof-of-authority chains.
//!
//! Clique and QBFT engines pack validator seals into `extraData`, which then
//! exceeds the 32 bytes a standard header allows. Raw block JSON is passed
//! through [`PoaHeaderAdapter`] before being parsed into [`BlockHeader`].

use alloy::primitives::{Address, Bytes, B256, U64};
use serde::Deserialize;
use serde_json::Value;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Maximum `extraData` length of a standard header.
pub const MAX_EXTRA_DATA_BYTES: usize = 32;

const EXTRA_DATA_KEY: &str = "extraData";
const POA_DATA_KEY: &str = "proofOfAuthorityData";

/// Rewrites raw block JSON so PoA headers parse as standard headers.
#[derive(Debug, Clone, Copy)]
pub struct PoaHeaderAdapter {
    enabled: bool,
}

impl PoaHeaderAdapter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Move `extraData` to `proofOfAuthorityData` on any non-null block.
    pub fn adapt(&self, mut block: Value) -> Value {
        if !self.enabled {
            return block;
        }
        if let Value::Object(fields) = &mut block {
            if let Some(extra) = fields.remove(EXTRA_DATA_KEY) {
                fields.insert(POA_DATA_KEY.to_string(), extra);
            }
        }
        block
    }
}

/// Strict view of the header fields this client consumes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub number: U64,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: U64,
    #[serde(default)]
    pub miner: Option<Address>,
    #[serde(default)]
    pub extra_data: Bytes,
    #[serde(default)]
    pub proof_of_authority_data: Option<Bytes>,
}

impl BlockHeader {
    /// Parse a (possibly adapted) JSON block, rejecting non-standard `extraData`.
    pub fn from_json(block: Value) -> BlockchainResult<Self> {
        let header: BlockHeader = serde_json::from_value(block).map_err(|e| BlockchainError::Rpc {
            method: "eth_getBlockByNumber",
            message: format!("Malformed block header: {}", e),
        })?;

        if header.extra_data.len() > MAX_EXTRA_DATA_BYTES {
            return Err(BlockchainError::Rpc {
                method: "eth_getBlockByNumber",
                message: format!(
                    "extraData is {} bytes, standard headers allow {}; enable poa_compat for PoA/QBFT chains",
                    header.extra_data.len(),
                    MAX_EXTRA_DATA_BYTES
                ),
            });
        }

        Ok(header)
    }

    pub fn number(&self) -> u64 {
        self.number.to::<u64>()
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp.to::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn qbft_block() -> Value {
        json!({
            "number": "0x10",
            "hash": format!("0x{}", "11".repeat(32)),
            "parentHash": format!("0x{}", "22".repeat(32)),
            "timestamp": "0x6553f100",
            "miner": "0x0000000000000000000000000000000000000000",
            // vanity + RLP-encoded validators and seals
            "extraData": format!("0x{}", "ab".repeat(97)),
        })
    }

    #[test]
    fn test_strict_parse_rejects_seal_data() {
        let err = BlockHeader::from_json(qbft_block()).unwrap_err();
        assert!(err.to_string().contains("poa_compat"));
    }

    #[test]
    fn test_adapter_moves_extra_data() {
        let adapted = PoaHeaderAdapter::new(true).adapt(qbft_block());
        assert!(adapted.get("extraData").is_none());

        let header = BlockHeader::from_json(adapted).unwrap();
        assert_eq!(header.number(), 16);
        assert_eq!(header.timestamp(), 0x6553f100);
        assert!(header.extra_data.is_empty());
        assert_eq!(header.proof_of_authority_data.unwrap().len(), 97);
    }

    #[test]
    fn test_disabled_adapter_is_passthrough() {
        let block = qbft_block();
        assert_eq!(PoaHeaderAdapter::new(false).adapt(block.clone()), block);
    }

    #[test]
    fn test_null_block_untouched() {
        assert_eq!(PoaHeaderAdapter::new(true).adapt(Value::Null), Value::Null);
    }

    #[test]
    fn test_standard_header_parses_without_adapter() {
        let mut block = qbft_block();
        block["extraData"] = json!("0xd883010d0f846765746888676f312e32312e33856c696e7578");
        let header = BlockHeader::from_json(block).unwrap();
        assert!(header.proof_of_authority_data.is_none());
        assert!(!header.extra_data.is_empty());
    }
}
