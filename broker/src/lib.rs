//! Broker trait and implementations for contractbook.
//!
//! Provides a generic `Broker` trait over the venue operations the bot needs:
//! catalog responses, account, purchase, and settlement polling.
//! Implementations:
//!
//! - **Deriv** (feature `deriv`, default): blocking websocket API client
//! - **Mock** ([`mock::MockBroker`]): canned responses for tests

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "deriv")]
pub mod deriv;

pub use error::BrokerError;
pub use types::*;

use serde_json::Value;

/// A venue connection that can describe its catalog, buy contracts, and
/// report on them.
pub trait Broker {
    /// Connect and authenticate.
    fn connect(&mut self) -> Result<(), BrokerError>;

    /// Disconnect gracefully.
    fn disconnect(&mut self) -> Result<(), BrokerError>;

    /// Get the authenticated account (login id, currency, balance).
    fn account(&self) -> Result<Account, BrokerError>;

    /// Raw `asset_index` response.
    fn asset_index(&self) -> Result<Value, BrokerError>;

    /// Raw `active_symbols` response.
    fn active_symbols(&self) -> Result<Value, BrokerError>;

    /// Buy one contract.
    fn buy(&self, request: &ContractRequest) -> Result<Purchase, BrokerError>;

    /// Current state of a bought contract.
    fn contract_status(&self, id: ContractId) -> Result<ContractStatus, BrokerError>;
}
