//! Operator client for the Federation contract on EVM chains.

pub mod blockchain;
pub mod config;
pub mod observability;

pub use blockchain::{BlockchainError, FederationClient, FederationEvent, Wallet};
pub use config::ClientConfig;
