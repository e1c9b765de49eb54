//! Federation operator CLI.
//!
//! Drives [`FederationClient`] end to end: register/unregister the operator,
//! inspect receipts, query contract events.

use std::path::PathBuf;

use alloy::dyn_abi::DynSolValue;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use federation_client::blockchain::{FederationClient, FederationEvent, Wallet};
use federation_client::config::{load_config, ClientConfig};
use federation_client::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "federation-client")]
#[command(about = "Operator client for the Federation smart contract", long_about = None)]
struct Cli {
    /// TOML config file; environment variables override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register this operator under a domain name
    Register { domain: String },
    /// Remove this operator from the federation
    Unregister,
    /// Show the contract's record of this operator
    OperatorInfo,
    /// Fetch the normalized receipt of a transaction
    Receipt { tx_hash: String },
    /// List contract events
    Events {
        /// Event name, e.g. ServiceAnnouncement
        event: String,
        /// Look back this many blocks (default: none, only the head block)
        #[arg(long)]
        last: Option<u64>,
    },
}

fn sol_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => json!(b),
        DynSolValue::String(s) => json!(s),
        DynSolValue::Address(a) => json!(a.to_checksum(None)),
        DynSolValue::Uint(n, _) => json!(n.to_string()),
        DynSolValue::Int(n, _) => json!(n.to_string()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(sol_to_json).collect())
        }
        other => json!(format!("{:?}", other)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.json_logs);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::from_env()?,
    };

    if let Some(addr) = config.metrics_address.as_deref() {
        match addr.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(metrics_address = %addr, error = %e, "Failed to parse metrics address"),
        }
    }

    let wallet = Wallet::from_env()?;
    let client = FederationClient::connect(&config, wallet).await?;

    let output = match cli.command {
        Commands::Register { domain } => json!({ "tx_hash": client.register_domain(&domain).await? }),
        Commands::Unregister => json!({ "tx_hash": client.unregister_domain().await? }),
        Commands::OperatorInfo => {
            let values = client.get_operator_info().await?;
            Value::Array(values.iter().map(sol_to_json).collect())
        }
        Commands::Receipt { tx_hash } => serde_json::to_value(client.get_transaction_receipt(&tx_hash).await?)?,
        Commands::Events { event, last } => {
            let event: FederationEvent = event.parse()?;
            let filter = client.create_event_filter(event, last).await?;
            let logs = client.query_events(&filter).await?;
            json!({ "event": event, "from_block": filter.from_block, "logs": logs })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
