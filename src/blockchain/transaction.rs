//! Transaction building, signing, and broadcasting.
//!
//! # Responsibilities
//! - Complete caller requests with nonce, chain id, legacy type, gas price
//! - Sign with the operator key and submit the raw payload
//!
//! # Design Decisions
//! - Always legacy (type 0) transactions; fee-market fields are stripped
//! - Gas price defaults to 0 (permissioned chains run without a fee market)
//! - No gas estimation, retries or confirmation polling

use std::sync::Arc;

use alloy::consensus::TxLegacy;
use alloy::primitives::{Address, TxKind};
use alloy::rpc::types::TransactionRequest;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::nonce::NonceSequencer;
use crate::blockchain::types::{to_canonical_hex, BlockchainError, BlockchainResult, ChainId};
use crate::blockchain::wallet::{SignedTransaction, Wallet};
use crate::observability::metrics;

/// `type` marker of pre-EIP-2718 transactions.
pub const LEGACY_TX_TYPE: u8 = 0;

/// Fields the builder fills in on top of a caller request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxDefaults {
    pub sender: Address,
    pub chain_id: ChainId,
    pub gas_limit: Option<u64>,
}

/// Only the operator account may appear as `from`.
fn ensure_sender(from: Option<Address>, sender: Address) -> BlockchainResult<()> {
    match from {
        Some(from) if from != sender => Err(BlockchainError::Signing(format!(
            "Transaction sender {} is not the operator account {}",
            from, sender
        ))),
        _ => Ok(()),
    }
}

/// Check a caller request before a nonce is spent on it.
fn check_request(request: &TransactionRequest, defaults: &TxDefaults) -> BlockchainResult<()> {
    ensure_sender(request.from, defaults.sender)?;
    if request.gas.is_none() && defaults.gas_limit.is_none() {
        return Err(BlockchainError::Signing(
            "Transaction has no gas limit and no default_gas_limit is configured".to_string(),
        ));
    }
    Ok(())
}

/// Merge `request` with chain metadata.
///
/// Caller fields win, except `nonce` and `type`, which are always assigned.
pub fn complete_request(mut request: TransactionRequest, nonce: u64, defaults: &TxDefaults) -> TransactionRequest {
    request.from = Some(request.from.unwrap_or(defaults.sender));
    request.nonce = Some(nonce);
    request.chain_id = Some(request.chain_id.unwrap_or(defaults.chain_id.0));
    request.gas_price = Some(request.gas_price.unwrap_or(0));
    request.gas = request.gas.or(defaults.gas_limit);

    request.transaction_type = Some(LEGACY_TX_TYPE);
    request.max_fee_per_gas = None;
    request.max_priority_fee_per_gas = None;
    request.max_fee_per_blob_gas = None;
    request.blob_versioned_hashes = None;
    request.sidecar = None;
    request.access_list = None;
    request.authorization_list = None;

    request
}

/// Turn a completed request into a signable legacy transaction.
pub fn to_legacy(request: &TransactionRequest) -> BlockchainResult<TxLegacy> {
    let missing = |field: &str| BlockchainError::Signing(format!("Transaction record is missing {}", field));

    if let Some(ty) = request.transaction_type {
        if ty != LEGACY_TX_TYPE {
            return Err(BlockchainError::Signing(format!("Expected legacy transaction, got type {}", ty)));
        }
    }

    Ok(TxLegacy {
        chain_id: Some(request.chain_id.ok_or_else(|| missing("chainId"))?),
        nonce: request.nonce.ok_or_else(|| missing("nonce"))?,
        gas_price: request.gas_price.ok_or_else(|| missing("gasPrice"))?,
        gas_limit: request.gas.ok_or_else(|| missing("gas"))?,
        to: request.to.unwrap_or(TxKind::Create),
        value: request.value.unwrap_or_default(),
        input: request.input.input().cloned().unwrap_or_default(),
    })
}

/// Builds, signs and broadcasts operator transactions.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    client: BlockchainClient,
    wallet: Arc<Wallet>,
    nonces: Arc<NonceSequencer>,
    defaults: TxDefaults,
}

impl TxBuilder {
    /// Create a new transaction builder.
    pub fn new(
        client: BlockchainClient,
        wallet: Arc<Wallet>,
        nonces: Arc<NonceSequencer>,
        default_gas_limit: Option<u64>,
    ) -> Self {
        let defaults = TxDefaults {
            sender: wallet.address(),
            chain_id: client.chain_id(),
            gas_limit: default_gas_limit,
        };
        Self {
            client,
            wallet,
            nonces,
            defaults,
        }
    }

    /// Complete `request` into a signable record, consuming one nonce.
    pub fn build(&self, request: TransactionRequest) -> BlockchainResult<TransactionRequest> {
        check_request(&request, &self.defaults)?;
        let nonce = self.nonces.allocate();
        Ok(complete_request(request, nonce, &self.defaults))
    }

    /// Sign a completed record without sending it.
    pub fn sign(&self, record: &TransactionRequest) -> BlockchainResult<SignedTransaction> {
        ensure_sender(record.from, self.defaults.sender)?;
        self.wallet.sign_legacy(to_legacy(record)?)
    }

    /// Sign and broadcast a completed record; returns the hash in canonical text.
    ///
    /// Node rejections are returned as-is, never retried.
    pub async fn submit(&self, record: &TransactionRequest) -> BlockchainResult<String> {
        let signed = self.sign(record)?;

        match self.client.send_raw_transaction(&signed.raw).await {
            Ok(tx_hash) => {
                metrics::record_transaction("accepted");
                if tx_hash != signed.hash {
                    tracing::warn!(local = %signed.hash, node = %tx_hash, "Node reported a different transaction hash");
                }
                tracing::info!(nonce = signed.nonce, tx_hash = %tx_hash, "Transaction broadcast");
                Ok(to_canonical_hex(tx_hash))
            }
            Err(e) => {
                metrics::record_transaction("rejected");
                tracing::warn!(nonce = signed.nonce, error = %e, "Transaction rejected");
                Err(e)
            }
        }
    }

    /// Build then submit.
    pub async fn send(&self, request: TransactionRequest) -> BlockchainResult<String> {
        let record = self.build(request)?;
        self.submit(&record).await
    }

    /// Get the operator address.
    pub fn address(&self) -> Address {
        self.defaults.sender
    }

    /// Nonce the next build will use.
    pub fn next_nonce(&self) -> u64 {
        self.nonces.peek()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::network::TransactionBuilder;
    use alloy::primitives::{Bytes, U256};

    fn defaults() -> TxDefaults {
        TxDefaults {
            sender: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
            chain_id: ChainId(1337),
            gas_limit: Some(300_000),
        }
    }

    fn contract() -> Address {
        "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap()
    }

    #[test]
    fn test_complete_request_fills_metadata() {
        let request = TransactionRequest::default()
            .with_to(contract())
            .with_input(Bytes::from_static(&[1, 2, 3]));

        let record = complete_request(request, 5, &defaults());
        assert_eq!(record.nonce, Some(5));
        assert_eq!(record.chain_id, Some(1337));
        assert_eq!(record.transaction_type, Some(LEGACY_TX_TYPE));
        assert_eq!(record.gas_price, Some(0));
        assert_eq!(record.gas, Some(300_000));
        assert_eq!(record.from, Some(defaults().sender));
    }

    #[test]
    fn test_caller_fields_take_precedence() {
        let request = TransactionRequest::default()
            .with_to(contract())
            .with_gas_price(7)
            .with_gas_limit(90_000)
            .with_chain_id(99)
            .with_nonce(1234);

        let record = complete_request(request, 5, &defaults());
        assert_eq!(record.gas_price, Some(7));
        assert_eq!(record.gas, Some(90_000));
        assert_eq!(record.chain_id, Some(99));
        // nonce is never the caller's
        assert_eq!(record.nonce, Some(5));
    }

    #[test]
    fn test_fee_market_fields_are_stripped() {
        let request = TransactionRequest::default()
            .with_to(contract())
            .with_max_fee_per_gas(100)
            .with_max_priority_fee_per_gas(2);

        let record = complete_request(request, 0, &defaults());
        assert!(record.max_fee_per_gas.is_none());
        assert!(record.max_priority_fee_per_gas.is_none());
        assert_eq!(record.transaction_type, Some(LEGACY_TX_TYPE));
        assert!(to_legacy(&record).is_ok());
    }

    #[test]
    fn test_check_request() {
        let stranger: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();
        let request = TransactionRequest::default().with_from(stranger).with_to(contract());
        assert!(matches!(check_request(&request, &defaults()), Err(BlockchainError::Signing(_))));

        let no_gas = TxDefaults { gas_limit: None, ..defaults() };
        let request = TransactionRequest::default().with_to(contract());
        assert!(matches!(check_request(&request, &no_gas), Err(BlockchainError::Signing(_))));
        assert!(check_request(&request.with_gas_limit(21_000), &no_gas).is_ok());
    }

    #[test]
    fn test_ensure_sender() {
        let operator = defaults().sender;
        let stranger: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();

        assert!(ensure_sender(None, operator).is_ok());
        assert!(ensure_sender(Some(operator), operator).is_ok());
        let err = ensure_sender(Some(stranger), operator).unwrap_err();
        assert!(matches!(err, BlockchainError::Signing(ref m) if m.contains("not the operator account")));
    }

    #[test]
    fn test_to_legacy() {
        let record = complete_request(
            TransactionRequest::default()
                .with_to(contract())
                .with_value(U256::from(10))
                .with_input(Bytes::from_static(&[0xaa])),
            3,
            &defaults(),
        );

        let tx = to_legacy(&record).unwrap();
        assert_eq!(tx.nonce, 3);
        assert_eq!(tx.chain_id, Some(1337));
        assert_eq!(tx.gas_price, 0);
        assert_eq!(tx.gas_limit, 300_000);
        assert_eq!(tx.to, TxKind::Call(contract()));
        assert_eq!(tx.value, U256::from(10));
        assert_eq!(tx.input, Bytes::from_static(&[0xaa]));
    }

    #[test]
    fn test_malformed_record_is_signing_error() {
        let request = TransactionRequest::default().with_to(contract()).with_gas_limit(21_000);
        let err = to_legacy(&request).unwrap_err();
        assert!(matches!(err, BlockchainError::Signing(ref m) if m.contains("chainId")));

        let mut record = complete_request(request, 0, &defaults());
        record.transaction_type = Some(2);
        assert!(matches!(to_legacy(&record), Err(BlockchainError::Signing(_))));
    }
}
