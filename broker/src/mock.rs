//! Mock broker for testing: implements the `Broker` trait with configurable behavior.
//!
//! Use this in integration tests to simulate venue responses without network calls.
//!
//! ```
//! use contractbook_broker::mock::{MockBroker, Settlement};
//! use contractbook_broker::Broker;
//! use serde_json::json;
//!
//! let mut broker = MockBroker::builder()
//!     .with_asset_index(json!({"asset_index": [["R_10", "Volatility 10", []]]}))
//!     .with_account("VRTC100", "USD", 10_000.0)
//!     .settlement(Settlement::OpenFor(2))
//!     .build();
//! broker.connect().unwrap();
//! assert_eq!(broker.account().unwrap().loginid, "VRTC100");
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;

/// How the mock settles bought contracts.
#[derive(Clone, Debug)]
pub enum Settlement {
    /// Sold on the first poll with this profit.
    Win(f64),
    /// Sold on the first poll, losing this amount.
    Lose(f64),
    /// Open for this many polls, then won at 95% of the buy price.
    OpenFor(u32),
    /// Every purchase is refused by the venue.
    Reject,
}

/// Builder for `MockBroker`.
pub struct MockBrokerBuilder {
    settlement: Settlement,
    asset_index: Value,
    active_symbols: Value,
    account: Account,
}

impl MockBrokerBuilder {
    pub fn settlement(mut self, settlement: Settlement) -> Self {
        self.settlement = settlement;
        self
    }

    pub fn with_asset_index(mut self, response: Value) -> Self {
        self.asset_index = response;
        self
    }

    pub fn with_active_symbols(mut self, response: Value) -> Self {
        self.active_symbols = response;
        self
    }

    pub fn with_account(mut self, loginid: &str, currency: &str, balance: f64) -> Self {
        self.account = Account {
            loginid: loginid.to_string(),
            currency: currency.to_string(),
            balance,
            is_virtual: loginid.starts_with("VR"),
        };
        self
    }

    pub fn build(self) -> MockBroker {
        MockBroker {
            connected: false,
            settlement: self.settlement,
            asset_index: self.asset_index,
            active_symbols: self.active_symbols,
            account: self.account,
            state: Mutex::new(MockState::default()),
        }
    }
}

#[derive(Default)]
struct MockState {
    next_contract_id: u64,
    purchases: Vec<ContractRequest>,
    buy_prices: Vec<(ContractId, f64)>,
    polls: u32,
}

/// A mock broker that records purchases and returns configurable responses.
pub struct MockBroker {
    connected: bool,
    settlement: Settlement,
    asset_index: Value,
    active_symbols: Value,
    account: Account,
    state: Mutex<MockState>,
}

impl MockBroker {
    pub fn builder() -> MockBrokerBuilder {
        MockBrokerBuilder {
            settlement: Settlement::Win(9.5),
            asset_index: json!({"asset_index": []}),
            active_symbols: json!({"active_symbols": []}),
            account: Account {
                loginid: "VRTC0000001".into(),
                currency: "USD".into(),
                balance: 10_000.0,
                is_virtual: true,
            },
        }
    }

    /// Every purchase request received (for assertion in tests).
    pub fn purchases(&self) -> Vec<ContractRequest> {
        self.state().purchases.clone()
    }

    /// Number of `contract_status` calls so far.
    pub fn polls(&self) -> u32 {
        self.state().polls
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_connected(&self) -> Result<(), BrokerError> {
        if self.connected {
            Ok(())
        } else {
            Err(BrokerError::NotConnected)
        }
    }
}

impl Broker for MockBroker {
    fn connect(&mut self) -> Result<(), BrokerError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BrokerError> {
        self.connected = false;
        Ok(())
    }

    fn account(&self) -> Result<Account, BrokerError> {
        self.require_connected()?;
        Ok(self.account.clone())
    }

    fn asset_index(&self) -> Result<Value, BrokerError> {
        self.require_connected()?;
        Ok(self.asset_index.clone())
    }

    fn active_symbols(&self) -> Result<Value, BrokerError> {
        self.require_connected()?;
        Ok(self.active_symbols.clone())
    }

    fn buy(&self, request: &ContractRequest) -> Result<Purchase, BrokerError> {
        self.require_connected()?;

        let mut state = self.state();
        state.purchases.push(request.clone());

        if let Settlement::Reject = self.settlement {
            return Err(BrokerError::Api {
                code: "ContractBuyValidationError".into(),
                message: "mock: contract rejected".into(),
            });
        }

        state.next_contract_id += 1;
        let contract_id = ContractId(1000 + state.next_contract_id);
        let buy_price = request.amount;
        state.buy_prices.push((contract_id, buy_price));
        Ok(Purchase {
            contract_id,
            buy_price,
            longcode: format!(
                "{} on {} over {}",
                request.contract_type, request.symbol, request.duration
            ),
            transaction_id: 2000 + state.next_contract_id,
        })
    }

    fn contract_status(&self, id: ContractId) -> Result<ContractStatus, BrokerError> {
        self.require_connected()?;

        let mut state = self.state();
        state.polls += 1;
        let buy_price = state
            .buy_prices
            .iter()
            .find(|(c, _)| *c == id)
            .map(|(_, p)| *p)
            .ok_or_else(|| BrokerError::Api {
                code: "InvalidContractId".into(),
                message: format!("mock: unknown contract {id}"),
            })?;

        let settled = |profit: f64| ContractStatus {
            contract_id: id,
            is_sold: true,
            profit,
            status: if profit > 0.0 { "won" } else { "lost" }.into(),
            buy_price,
            sell_price: Some((buy_price + profit).max(0.0)),
        };

        Ok(match self.settlement {
            Settlement::Win(profit) => settled(profit),
            Settlement::Lose(loss) => settled(-loss),
            Settlement::OpenFor(n) if state.polls <= n => ContractStatus {
                contract_id: id,
                is_sold: false,
                profit: 0.0,
                status: "open".into(),
                buy_price,
                sell_price: None,
            },
            Settlement::OpenFor(_) => settled(buy_price * 0.95),
            Settlement::Reject => {
                return Err(BrokerError::Other("mock: nothing was bought".into()));
            }
        })
    }
}
