//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the contract id and RPC URL parse
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CoordinatorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::CoordinatorConfig;
use crate::soroban::Address;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &CoordinatorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field, message: String| errors.push(ValidationError { field, message });

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        fail(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        );
    }

    if config.timeouts.request_secs == 0 {
        fail("timeouts.request_secs", "must be greater than 0".to_string());
    }

    let soroban = &config.soroban;
    if let Err(e) = url::Url::parse(&soroban.rpc_url) {
        fail("soroban.rpc_url", format!("'{}' is not a URL: {}", soroban.rpc_url, e));
    }
    if soroban.contract_id.is_empty() {
        fail("soroban.contract_id", "is required".to_string());
    } else {
        match soroban.contract_id.parse::<Address>() {
            Ok(Address::Contract(_)) => {}
            Ok(Address::Account(_)) => fail(
                "soroban.contract_id",
                "must be a contract (C…) address".to_string(),
            ),
            Err(e) => fail("soroban.contract_id", e.to_string()),
        }
    }
    if soroban.network_passphrase.is_empty() {
        fail("soroban.network_passphrase", "is required".to_string());
    }
    if soroban.rpc_timeout_secs == 0 {
        fail("soroban.rpc_timeout_secs", "must be greater than 0".to_string());
    }
    if soroban.validity_window_secs == 0 {
        fail("soroban.validity_window_secs", "must be greater than 0".to_string());
    }

    if config.store.path.is_empty() {
        fail("store.path", "is required".to_string());
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        fail(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        );
    }

    if config.security.max_body_size == 0 {
        fail("security.max_body_size", "must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
