//! Deriv API request builders and response types.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::BrokerError;
use crate::types::{Account, ContractId, ContractRequest, ContractStatus, Purchase};

/// `error` object of a failed call.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// `authorize` payload.
#[derive(Debug, Deserialize)]
pub struct AuthorizeInfo {
    pub loginid: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub balance: f64,
    #[serde(default, deserialize_with = "contractbook::wire::flag")]
    pub is_virtual: bool,
}

impl From<AuthorizeInfo> for Account {
    fn from(info: AuthorizeInfo) -> Self {
        Account {
            loginid: info.loginid,
            currency: info.currency,
            balance: info.balance,
            is_virtual: info.is_virtual,
        }
    }
}

/// `balance` payload.
#[derive(Debug, Deserialize)]
pub struct BalanceInfo {
    pub balance: f64,
    pub currency: String,
    #[serde(default)]
    pub loginid: String,
}

/// `buy` payload.
#[derive(Debug, Deserialize)]
pub struct BuyReceipt {
    pub contract_id: u64,
    pub buy_price: f64,
    #[serde(default)]
    pub longcode: String,
    pub transaction_id: u64,
}

impl From<BuyReceipt> for Purchase {
    fn from(r: BuyReceipt) -> Self {
        Purchase {
            contract_id: ContractId(r.contract_id),
            buy_price: r.buy_price,
            longcode: r.longcode,
            transaction_id: r.transaction_id,
        }
    }
}

/// `proposal_open_contract` payload. Most fields are absent until the
/// contract is live, hence the defaults.
#[derive(Debug, Deserialize)]
pub struct OpenContract {
    pub contract_id: u64,
    #[serde(default, deserialize_with = "contractbook::wire::flag")]
    pub is_sold: bool,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub buy_price: f64,
    #[serde(default)]
    pub sell_price: Option<f64>,
}

impl From<OpenContract> for ContractStatus {
    fn from(c: OpenContract) -> Self {
        ContractStatus {
            contract_id: ContractId(c.contract_id),
            is_sold: c.is_sold,
            profit: c.profit,
            status: c.status.unwrap_or_else(|| "open".into()),
            buy_price: c.buy_price,
            sell_price: c.sell_price,
        }
    }
}

pub fn asset_index_request() -> Value {
    json!({"asset_index": 1})
}

pub fn active_symbols_request() -> Value {
    json!({"active_symbols": "full", "product_type": "basic"})
}

pub fn balance_request() -> Value {
    json!({"balance": 1})
}

pub fn ping_request() -> Value {
    json!({"ping": 1})
}

/// `{"buy": 1, "price": <limit>, "parameters": {...}}`
pub fn buy_request(request: &ContractRequest) -> Value {
    let mut parameters = json!({
        "contract_type": request.contract_type,
        "symbol": request.symbol,
        "duration": request.duration.magnitude(),
        "duration_unit": request.duration.unit().as_char().to_string(),
        "amount": request.amount,
        "basis": request.basis.as_str(),
        "currency": request.currency,
    });
    if let Some(barrier) = &request.barrier {
        parameters["barrier"] = json!(barrier);
    }
    if let Some(barrier2) = &request.barrier2 {
        parameters["barrier2"] = json!(barrier2);
    }
    json!({
        "buy": 1,
        "price": request.price_limit(),
        "parameters": parameters,
    })
}

pub fn contract_status_request(id: ContractId) -> Value {
    json!({"proposal_open_contract": 1, "contract_id": id.0})
}

/// Turn an `error` object into [`BrokerError::Api`]; pass anything else through.
pub fn check(response: Value) -> Result<Value, BrokerError> {
    match response.get("error") {
        Some(error) => {
            let ApiError { code, message } = ApiError::deserialize(error).map_err(|e| {
                BrokerError::Protocol(format!("unreadable error object {error}: {e}"))
            })?;
            Err(BrokerError::Api { code, message })
        }
        None => Ok(response),
    }
}

/// Decode `response[key]` into `T`.
pub fn payload<T: for<'de> Deserialize<'de>>(response: &Value, key: &str) -> Result<T, BrokerError> {
    let value = response
        .get(key)
        .ok_or_else(|| BrokerError::Protocol(format!("response has no \"{key}\" field")))?;
    T::deserialize(value).map_err(|e| BrokerError::Protocol(format!("bad \"{key}\" payload: {e}")))
}
