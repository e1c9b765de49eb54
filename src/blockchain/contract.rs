//! Contract interface loaded from a compiled artifact.
//!
//! The artifact is the JSON emitted by the contract toolchain; only its
//! `abi` field is read.

use std::fs;
use std::path::Path;

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, Bytes, B256};
use serde_json::Value;

use crate::blockchain::types::{BlockchainError, BlockchainResult, FederationEvent};

/// Parse a contract address, enforcing EIP-55 when the input is mixed-case.
///
/// All-lowercase or all-uppercase hex carries no checksum and is accepted as is.
pub fn parse_contract_address(raw: &str) -> BlockchainResult<Address> {
    let raw = raw.trim();
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());

    let parsed = if has_lower && has_upper {
        Address::parse_checksummed(raw, None).map_err(|e| e.to_string())
    } else {
        raw.parse::<Address>().map_err(|e| e.to_string())
    };

    parsed.map_err(|e| {
        BlockchainError::Configuration(format!("'{}' is not a valid contract address: {}", raw, e))
    })
}

/// ABI plus deployment address of the Federation contract.
#[derive(Debug, Clone)]
pub struct ContractInterface {
    address: Address,
    abi: JsonAbi,
}

impl ContractInterface {
    /// Read the artifact at `path` and bind it to `address`.
    pub fn load(path: &Path, address: &str) -> BlockchainResult<Self> {
        let document = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Configuration(format!("Cannot read ABI file {}: {}", path.display(), e))
        })?;
        Self::from_artifact(&document, address)
    }

    /// Parse an artifact document already in memory.
    pub fn from_artifact(document: &str, address: &str) -> BlockchainResult<Self> {
        let mut artifact: Value = serde_json::from_str(document)
            .map_err(|e| BlockchainError::Configuration(format!("ABI file is not valid JSON: {}", e)))?;

        let abi = match artifact.get_mut("abi").map(Value::take) {
            Some(Value::Array(entries)) if !entries.is_empty() => Value::Array(entries),
            _ => return Err(BlockchainError::Configuration("ABI not found in JSON".to_string())),
        };
        let abi: JsonAbi = serde_json::from_value(abi)
            .map_err(|e| BlockchainError::Configuration(format!("Malformed ABI: {}", e)))?;

        Ok(Self {
            address: parse_contract_address(address)?,
            abi,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Topic-0 of `event` as declared in the ABI.
    pub fn event_selector(&self, event: FederationEvent) -> BlockchainResult<B256> {
        self.abi
            .event(event.as_str())
            .and_then(|overloads| overloads.first())
            .map(|e| e.selector())
            .ok_or_else(|| {
                BlockchainError::Configuration(format!("Event '{}' not present in contract ABI", event))
            })
    }

    fn function(&self, name: &str) -> BlockchainResult<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| {
                BlockchainError::Configuration(format!("Function '{}' not present in contract ABI", name))
            })
    }

    /// Selector-prefixed calldata for `name(args...)`.
    pub fn encode_call(&self, name: &str, args: &[DynSolValue]) -> BlockchainResult<Bytes> {
        self.function(name)?
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| BlockchainError::Signing(format!("Cannot encode {} arguments: {}", name, e)))
    }

    /// Decode the return data of `name`.
    pub fn decode_output(&self, name: &str, data: &[u8]) -> BlockchainResult<Vec<DynSolValue>> {
        self.function(name)?
            .abi_decode_output(data)
            .map_err(|e| BlockchainError::Rpc {
                method: "eth_call",
                message: format!("Cannot decode {} output: {}", name, e),
            })
    }
}
