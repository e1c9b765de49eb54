//! Contract event filters.
//!
//! An [`EventFilter`] is a plain descriptor: one Federation event, a starting
//! block, and an open end at `latest`. Querying or polling it is up to the
//! caller, through [`query_events`] or [`install_filter`]/[`poll_filter`].

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::Filter;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::contract::ContractInterface;
use crate::blockchain::receipt::NormalizedLog;
use crate::blockchain::types::{BlockchainResult, FederationEvent};

/// First block of a filter ending at `current_block`.
///
/// With a trailing window the start is `current_block - trailing`, clamped at
/// genesis; without one only blocks from `current_block` onward are covered.
pub fn starting_block(current_block: u64, trailing_blocks: Option<u64>) -> u64 {
    match trailing_blocks {
        Some(window) => current_block.saturating_sub(window),
        None => current_block,
    }
}

/// Selects one contract event from `from_block` to `latest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub event: FederationEvent,
    pub from_block: u64,
    pub contract: Address,
    pub selector: B256,
}

impl EventFilter {
    /// Build a filter against a known current block.
    pub fn new(
        contract: &ContractInterface,
        event: FederationEvent,
        current_block: u64,
        trailing_blocks: Option<u64>,
    ) -> BlockchainResult<Self> {
        Ok(Self {
            event,
            from_block: starting_block(current_block, trailing_blocks),
            contract: contract.address(),
            selector: contract.event_selector(event)?,
        })
    }

    /// Build a filter anchored at the chain head as reported by the node.
    pub async fn create(
        client: &BlockchainClient,
        contract: &ContractInterface,
        event: FederationEvent,
        trailing_blocks: Option<u64>,
    ) -> BlockchainResult<Self> {
        // Fail on an ABI without the event before touching the network.
        contract.event_selector(event)?;
        let current_block = client.get_block_number().await?;
        Self::new(contract, event, current_block, trailing_blocks)
    }

    /// Node-level `eth_getLogs`/`eth_newFilter` parameters.
    pub fn to_rpc_filter(&self) -> Filter {
        Filter::new()
            .address(self.contract)
            .event_signature(self.selector)
            .from_block(self.from_block)
            .to_block(BlockNumberOrTag::Latest)
    }
}

/// One-shot query of all matching logs.
pub async fn query_events(client: &BlockchainClient, filter: &EventFilter) -> BlockchainResult<Vec<NormalizedLog>> {
    let logs = client.get_logs(&filter.to_rpc_filter()).await?;
    tracing::debug!(event = %filter.event, from_block = filter.from_block, count = logs.len(), "Queried events");
    logs.iter().map(NormalizedLog::try_from).collect()
}

/// Register the filter on the node and return its id.
pub async fn install_filter(client: &BlockchainClient, filter: &EventFilter) -> BlockchainResult<U256> {
    let id = client.new_filter(&filter.to_rpc_filter()).await?;
    tracing::info!(event = %filter.event, from_block = filter.from_block, filter_id = %id, "Installed event filter");
    Ok(id)
}

/// Logs matched by an installed filter since the previous poll.
pub async fn poll_filter(client: &BlockchainClient, filter_id: U256) -> BlockchainResult<Vec<NormalizedLog>> {
    let logs = client.get_filter_changes(filter_id).await?;
    logs.iter().map(NormalizedLog::try_from).collect()
}
