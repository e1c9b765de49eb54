//! Federation contract client.
//!
//! Ties the pieces together: one connection, one operator identity, one
//! nonce sequencer, shared by every clone of [`FederationClient`].

use std::path::Path;
use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::contract::ContractInterface;
use crate::blockchain::events::{self, EventFilter};
use crate::blockchain::nonce::NonceSequencer;
use crate::blockchain::receipt::{self, NormalizedLog, NormalizedReceipt};
use crate::blockchain::transaction::TxBuilder;
use crate::blockchain::types::{BlockchainResult, ChainId, FederationEvent};
use crate::blockchain::wallet::Wallet;
use crate::config::ClientConfig;

/// Operator-side client of the Federation contract.
#[derive(Debug, Clone)]
pub struct FederationClient {
    client: BlockchainClient,
    contract: Arc<ContractInterface>,
    transactions: TxBuilder,
}

impl FederationClient {
    /// Connect to the configured node and prepare the operator account.
    pub async fn connect(config: &ClientConfig, wallet: Wallet) -> BlockchainResult<Self> {
        let client = BlockchainClient::connect(config).await?;
        Self::with_client(client, config, wallet).await
    }

    /// Finish construction over an already established connection.
    pub async fn with_client(client: BlockchainClient, config: &ClientConfig, wallet: Wallet) -> BlockchainResult<Self> {
        let identity = wallet.resolve_identity(config.eth_address.as_deref());
        let contract = ContractInterface::load(Path::new(&config.abi_path), &config.contract_address)?;

        let start_nonce = client.get_pending_transaction_count(identity.address).await?;

        tracing::info!(
            address = %identity.address,
            contract = %contract.address(),
            chain_id = client.chain_id().0,
            start_nonce,
            "Federation client initialized"
        );

        let transactions = TxBuilder::new(
            client.clone(),
            Arc::new(wallet),
            Arc::new(NonceSequencer::new(start_nonce)),
            config.default_gas_limit,
        );

        Ok(Self {
            client,
            contract: Arc::new(contract),
            transactions,
        })
    }

    pub fn address(&self) -> Address {
        self.transactions.address()
    }

    pub fn chain_id(&self) -> ChainId {
        self.client.chain_id()
    }

    pub fn contract(&self) -> &ContractInterface {
        &self.contract
    }

    pub fn connection(&self) -> &BlockchainClient {
        &self.client
    }

    /// Nonce the next built transaction will carry.
    pub fn next_nonce(&self) -> u64 {
        self.transactions.next_nonce()
    }

    /// Complete a caller request (nonce, chain id, legacy type, gas price).
    pub fn build_transaction(&self, request: TransactionRequest) -> BlockchainResult<TransactionRequest> {
        self.transactions.build(request)
    }

    /// Sign and broadcast a built record; returns the hash as canonical hex.
    pub async fn submit_transaction(&self, record: &TransactionRequest) -> BlockchainResult<String> {
        self.transactions.submit(record).await
    }

    /// Build, sign and broadcast in one step.
    pub async fn send_transaction(&self, request: TransactionRequest) -> BlockchainResult<String> {
        self.transactions.send(request).await
    }

    /// Normalized receipt of a mined transaction. Does not wait for inclusion.
    pub async fn get_transaction_receipt(&self, tx_hash: &str) -> BlockchainResult<NormalizedReceipt> {
        let tx_hash = receipt::parse_tx_hash(tx_hash)?;
        receipt::fetch_receipt(&self.client, tx_hash).await
    }

    /// Filter for `event` covering the last `trailing_blocks` blocks, or only
    /// future blocks when `None`.
    pub async fn create_event_filter(
        &self,
        event: FederationEvent,
        trailing_blocks: Option<u64>,
    ) -> BlockchainResult<EventFilter> {
        EventFilter::create(&self.client, &self.contract, event, trailing_blocks).await
    }

    /// Same as [`Self::create_event_filter`], with the event given by name.
    pub async fn create_event_filter_by_name(
        &self,
        event_name: &str,
        trailing_blocks: Option<u64>,
    ) -> BlockchainResult<EventFilter> {
        let event: FederationEvent = event_name.parse()?;
        self.create_event_filter(event, trailing_blocks).await
    }

    pub async fn query_events(&self, filter: &EventFilter) -> BlockchainResult<Vec<NormalizedLog>> {
        events::query_events(&self.client, filter).await
    }

    pub async fn install_filter(&self, filter: &EventFilter) -> BlockchainResult<U256> {
        events::install_filter(&self.client, filter).await
    }

    pub async fn poll_filter(&self, filter_id: U256) -> BlockchainResult<Vec<NormalizedLog>> {
        events::poll_filter(&self.client, filter_id).await
    }

    fn contract_call(&self, data: Bytes) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.address())
            .with_to(self.contract.address())
            .with_input(data)
    }

    /// Register the operator under `domain_name` (`addOperator`).
    pub async fn register_domain(&self, domain_name: &str) -> BlockchainResult<String> {
        let data = self
            .contract
            .encode_call("addOperator", &[DynSolValue::String(domain_name.to_string())])?;
        self.send_transaction(self.contract_call(data)).await
    }

    /// Deregister the operator (`removeOperator`).
    pub async fn unregister_domain(&self) -> BlockchainResult<String> {
        let data = self.contract.encode_call("removeOperator", &[])?;
        self.send_transaction(self.contract_call(data)).await
    }

    /// `getOperatorInfo(address)` for this operator, decoded per the ABI.
    pub async fn get_operator_info(&self) -> BlockchainResult<Vec<DynSolValue>> {
        let data = self
            .contract
            .encode_call("getOperatorInfo", &[DynSolValue::Address(self.address())])?;
        let output = self.client.call(self.contract_call(data)).await?;
        self.contract.decode_output("getOperatorInfo", &output)
    }
}
