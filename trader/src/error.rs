//! Error types for the trader.

use std::path::PathBuf;

use contractbook::{CatalogError, SelectionError};

/// All errors that can occur during a trading session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    /// The order failed a local check and was never sent.
    #[error("order refused: {0}")]
    OrderRefused(String),

    /// The venue refused the purchase.
    #[error("order rejected by venue: {0}")]
    Rejected(String),

    #[error("no settlement for contract {contract_id} after {waited_secs}s")]
    SettlementTimeout { contract_id: u64, waited_secs: u64 },

    /// The session cannot go on, e.g. the catalog offers nothing to pick.
    #[error("session aborted: {0}")]
    Aborted(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("journal error: {0}")]
    Journal(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit code: 2 when the venue rejected the purchase, 1 otherwise.
    /// A cancelled session is not an error and exits with 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Rejected(_) => 2,
            _ => 1,
        }
    }
}
