//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoint scheme, address formats, value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use alloy::primitives::Address;

use crate::blockchain::client::TransportKind;
use crate::blockchain::contract::parse_contract_address;
use crate::config::schema::ClientConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.node_url.parse::<url::Url>() {
        Ok(url) => {
            if let Err(e) = TransportKind::from_url(&url) {
                errors.push(ValidationError::new("node_url", e.to_string()));
            }
        }
        Err(e) => errors.push(ValidationError::new("node_url", format!("invalid URL: {}", e))),
    }

    if let Some(address) = config.eth_address.as_deref() {
        if address.parse::<Address>().is_err() {
            errors.push(ValidationError::new("eth_address", format!("'{}' is not an address", address)));
        }
    }

    if config.contract_address.trim().is_empty() {
        errors.push(ValidationError::new("contract_address", "must be set"));
    } else if let Err(e) = parse_contract_address(&config.contract_address) {
        errors.push(ValidationError::new("contract_address", e.to_string()));
    }

    if config.abi_path.trim().is_empty() {
        errors.push(ValidationError::new("abi_path", "must be set"));
    }

    if config.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("rpc_timeout_secs", "must be greater than 0"));
    }

    if config.default_gas_limit == Some(0) {
        errors.push(ValidationError::new("default_gas_limit", "must be greater than 0"));
    }

    if let Some(addr) = config.metrics_address.as_deref() {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::new("metrics_address", format!("'{}' is not a socket address", addr)));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
