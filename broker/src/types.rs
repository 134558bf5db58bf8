//! Shared broker types: accounts, contract requests, purchases, settlement.

use std::fmt;
use std::str::FromStr;

use contractbook::DurationValue;
use serde::{Deserialize, Serialize};

/// Authenticated account summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub loginid: String,
    pub currency: String,
    pub balance: f64,
    /// Demo account.
    pub is_virtual: bool,
}

impl Account {
    /// `"demo"` or `"real"`, as written to the journal.
    pub fn kind(&self) -> &'static str {
        if self.is_virtual { "demo" } else { "real" }
    }
}

/// Venue-assigned contract id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub u64);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether `amount` is the stake paid or the payout received on a win.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    #[default]
    Stake,
    Payout,
}

impl Basis {
    pub fn as_str(self) -> &'static str {
        match self {
            Basis::Stake => "stake",
            Basis::Payout => "payout",
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Basis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stake" => Ok(Basis::Stake),
            "payout" => Ok(Basis::Payout),
            other => Err(format!("unknown basis '{other}' (expected stake or payout)")),
        }
    }
}

/// One contract purchase, fully parameterised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractRequest {
    /// Venue contract type, e.g. `CALL`, `DIGITEVEN`.
    pub contract_type: String,
    pub symbol: String,
    pub duration: DurationValue,
    pub amount: f64,
    pub basis: Basis,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barrier2: Option<String>,
    /// Highest price accepted for the contract; defaults to `amount`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

impl ContractRequest {
    pub fn price_limit(&self) -> f64 {
        self.max_price.unwrap_or(self.amount)
    }
}

impl fmt::Display for ContractRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {:.2} {} ({})",
            self.contract_type, self.symbol, self.duration, self.amount, self.currency, self.basis
        )?;
        if let Some(barrier) = &self.barrier {
            write!(f, " barrier {barrier}")?;
        }
        if let Some(barrier2) = &self.barrier2 {
            write!(f, "/{barrier2}")?;
        }
        Ok(())
    }
}

/// Receipt of a successful purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub contract_id: ContractId,
    pub buy_price: f64,
    pub longcode: String,
    pub transaction_id: u64,
}

/// Snapshot of a bought contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractStatus {
    pub contract_id: ContractId,
    /// Settled; `profit` is final.
    pub is_sold: bool,
    pub profit: f64,
    /// Venue status: `open`, `won`, `lost`, `sold`.
    pub status: String,
    pub buy_price: f64,
    pub sell_price: Option<f64>,
}

impl ContractStatus {
    pub fn is_won(&self) -> bool {
        self.is_sold && self.profit > 0.0
    }
}
