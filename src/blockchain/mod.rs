//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! ClientConfig + ETH_PRIVATE_KEY
//!     → client.rs (transport by URL scheme, liveness probe, PoA headers)
//!     → wallet.rs (derived identity, signing)
//!     → contract.rs (ABI + checksummed address)
//!     → nonce.rs (seeded from pending tx count)
//!
//! per transaction:
//!     transaction.rs (complete request → sign → eth_sendRawTransaction)
//!
//! any time:
//!     receipt.rs (receipt + block timestamp → canonical text)
//!     events.rs (event filter over a trailing block window)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from the environment or the caller
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod contract;
pub mod events;
pub mod federation;
pub mod nonce;
pub mod poa;
pub mod receipt;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{BlockchainClient, TransportKind};
pub use contract::ContractInterface;
pub use events::EventFilter;
pub use federation::FederationClient;
pub use nonce::NonceSequencer;
pub use receipt::{NormalizedLog, NormalizedReceipt};
pub use types::{to_canonical_hex, BlockchainError, BlockchainResult, ChainId, FederationEvent};
pub use wallet::Wallet;
