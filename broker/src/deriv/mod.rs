//! Deriv broker implementation.

pub mod auth;
pub mod client;
pub mod types;

use std::sync::{Mutex, PoisonError};

use log::info;
use serde_json::Value;

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;
pub use client::{ClientConfig, DEFAULT_ENDPOINT, DerivClient};
use types::{BalanceInfo, BuyReceipt, OpenContract};

/// Deriv broker implementing the generic Broker trait.
///
/// Blocking (sync) over a single websocket; calls are serialised through
/// a mutex since the socket carries one request at a time. Reads are retried
/// once after a reconnect, purchases never are.
pub struct DerivBroker {
    config: ClientConfig,
    client: Mutex<Option<DerivClient>>,
}

impl DerivBroker {
    /// Create a new Deriv broker handle (not yet connected).
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    fn with_client<T>(
        &self,
        f: impl FnOnce(&mut DerivClient) -> Result<T, BrokerError>,
    ) -> Result<T, BrokerError> {
        let mut guard = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        let client = guard.as_mut().ok_or(BrokerError::NotConnected)?;
        f(client)
    }

    fn call(&self, payload: Value) -> Result<Value, BrokerError> {
        self.with_client(|client| client.request(payload))
    }
}

impl Broker for DerivBroker {
    fn connect(&mut self) -> Result<(), BrokerError> {
        let client = DerivClient::connect(self.config.clone())?;
        *self.client.get_mut().unwrap_or_else(PoisonError::into_inner) = Some(client);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BrokerError> {
        let slot = self.client.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut client) = slot.take() {
            client.close();
            info!("Disconnected");
        }
        Ok(())
    }

    fn account(&self) -> Result<Account, BrokerError> {
        self.with_client(|client| {
            let response = client.request(types::balance_request())?;
            let balance: BalanceInfo = types::payload(&response, "balance")?;
            let mut account = client.account().clone();
            account.balance = balance.balance;
            account.currency = balance.currency;
            Ok(account)
        })
    }

    fn asset_index(&self) -> Result<Value, BrokerError> {
        self.call(types::asset_index_request())
    }

    fn active_symbols(&self) -> Result<Value, BrokerError> {
        self.call(types::active_symbols_request())
    }

    fn buy(&self, request: &ContractRequest) -> Result<Purchase, BrokerError> {
        let payload = types::buy_request(request);
        let response = self.with_client(|client| client.request_once(payload))?;
        let receipt: BuyReceipt = types::payload(&response, "buy")?;
        let purchase = Purchase::from(receipt);
        info!(
            "Bought {} for {:.2}: contract {}",
            request, purchase.buy_price, purchase.contract_id
        );
        Ok(purchase)
    }

    fn contract_status(&self, id: ContractId) -> Result<ContractStatus, BrokerError> {
        let response = self.call(types::contract_status_request(id))?;
        let contract: OpenContract = types::payload(&response, "proposal_open_contract")?;
        Ok(contract.into())
    }
}
