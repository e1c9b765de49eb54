//! Operator identity and transaction signing.
//!
//! # Security
//! - The private key is read ONLY from the environment or passed in directly
//! - Keys are never logged or serialized; `Debug` shows the address only

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "ETH_PRIVATE_KEY";

/// Holds the signing key of the operator account.
pub struct Wallet {
    signer: PrivateKeySigner,
}

/// Outcome of reconciling a configured address against the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Address every transaction is sent from.
    pub address: Address,
    /// The configured address, when it disagreed with the key.
    pub overridden: Option<Address>,
}

/// A signed, broadcast-ready transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// EIP-2718 encoded payload for `eth_sendRawTransaction`.
    pub raw: Bytes,
    pub hash: TxHash,
    pub nonce: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex.parse().map_err(|e| {
            BlockchainError::Configuration(format!("Invalid private key format: {}", e))
        })?;

        Ok(Self { signer })
    }

    /// Load wallet from environment variable.
    ///
    /// Reads `ETH_PRIVATE_KEY` from environment.
    pub fn from_env() -> BlockchainResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            BlockchainError::Configuration(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key)
    }

    /// Address derived from the private key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Reconcile an optionally configured address with the derived one.
    ///
    /// The derived address always wins. A mismatch is logged, never an error.
    pub fn resolve_identity(&self, configured: Option<&str>) -> ResolvedIdentity {
        let derived = self.address();

        let overridden = match configured.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => match raw.parse::<Address>() {
                Ok(provided) if provided == derived => None,
                Ok(provided) => {
                    tracing::warn!(
                        provided = %provided,
                        derived = %derived,
                        "Configured ETH_ADDRESS differs from address of private key, using derived"
                    );
                    Some(provided)
                }
                Err(e) => {
                    tracing::warn!(
                        provided = raw,
                        derived = %derived,
                        error = %e,
                        "Configured ETH_ADDRESS is not an address, using derived"
                    );
                    None
                }
            },
        };

        ResolvedIdentity {
            address: derived,
            overridden,
        }
    }

    /// Sign a legacy transaction (EIP-155 when `chain_id` is set).
    pub fn sign_legacy(&self, mut tx: TxLegacy) -> BlockchainResult<SignedTransaction> {
        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| BlockchainError::Signing(format!("Signing failed: {}", e)))?;

        let nonce = tx.nonce;
        let envelope = TxEnvelope::from(tx.into_signed(signature));

        Ok(SignedTransaction {
            hash: *envelope.tx_hash(),
            raw: envelope.encoded_2718().into(),
            nonce,
        })
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
