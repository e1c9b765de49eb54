//! Chain-specific types and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Bad endpoint scheme, missing ABI, unknown event name and similar setup faults.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Node unreachable while establishing the connection.
    #[error("Cannot connect to Ethereum node at {url}: {reason}")]
    Connectivity { url: String, reason: String },

    /// Transaction record could not be turned into a signed payload.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Node refused the raw transaction (stale nonce, insufficient funds, ...).
    #[error("Broadcast rejected: {0}")]
    Broadcast(String),

    /// No receipt exists for the hash (yet).
    #[error("Transaction receipt not found: {0}")]
    NotFound(String),

    /// Caller passed a value that cannot be parsed (e.g. a malformed hash).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Any other RPC failure.
    #[error("RPC error in {method}: {message}")]
    Rpc { method: &'static str, message: String },

    /// RPC request timed out.
    #[error("RPC timeout in {method} after {secs} seconds")]
    Timeout { method: &'static str, secs: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Canonical text form for binary chain values: lowercase hex, no `0x` prefix.
///
/// Every hash, bloom, topic and payload leaving this crate as text goes through here.
pub fn to_canonical_hex(bytes: impl AsRef<[u8]>) -> String {
    alloy::hex::encode(bytes)
}

/// Events emitted by the Federation contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FederationEvent {
    OperatorRegistered,
    OperatorRemoved,
    ServiceAnnouncement,
    NewBid,
    ServiceAnnouncementClosed,
    ConsumerEndpointUpdated,
    ProviderEndpointUpdated,
    ServiceDeployed,
    ServiceCancelled,
}

impl FederationEvent {
    pub const ALL: [FederationEvent; 9] = [
        FederationEvent::OperatorRegistered,
        FederationEvent::OperatorRemoved,
        FederationEvent::ServiceAnnouncement,
        FederationEvent::NewBid,
        FederationEvent::ServiceAnnouncementClosed,
        FederationEvent::ConsumerEndpointUpdated,
        FederationEvent::ProviderEndpointUpdated,
        FederationEvent::ServiceDeployed,
        FederationEvent::ServiceCancelled,
    ];

    /// Event name as declared in the contract ABI.
    pub fn as_str(&self) -> &'static str {
        match self {
            FederationEvent::OperatorRegistered => "OperatorRegistered",
            FederationEvent::OperatorRemoved => "OperatorRemoved",
            FederationEvent::ServiceAnnouncement => "ServiceAnnouncement",
            FederationEvent::NewBid => "NewBid",
            FederationEvent::ServiceAnnouncementClosed => "ServiceAnnouncementClosed",
            FederationEvent::ConsumerEndpointUpdated => "ConsumerEndpointUpdated",
            FederationEvent::ProviderEndpointUpdated => "ProviderEndpointUpdated",
            FederationEvent::ServiceDeployed => "ServiceDeployed",
            FederationEvent::ServiceCancelled => "ServiceCancelled",
        }
    }
}

impl fmt::Display for FederationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FederationEvent {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| BlockchainError::Configuration(format!("Unknown contract event '{}'", s)))
    }
}
