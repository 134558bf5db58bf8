//! contractbook-trader: interactive options bot on top of the contractbook catalog.
//!
//! Connects to the Deriv API, builds the contract catalog from the asset
//! index and active symbols, walks the user through market, symbol and
//! modality selection, buys the contract and journals its settlement.

pub mod broker;
pub mod config;
pub mod contract;
pub mod error;
pub mod execution;
pub mod journal;
pub mod wizard;
