//! # contractbook
//!
//! An in-memory catalog of the contracts an options-style venue offers:
//! which symbols are tradeable, which contract modalities they support and
//! over which duration envelopes.
//!
//! ## Features
//!
//! - **Durations**: `<digits><unit>` tokens (`5t`, `30s`, `15m`, `2h`, `1d`) with
//!   same-unit comparison and a cross-unit ordering key
//! - **De-duplication**: identical (group, modality, range) parameters collapse to one entry
//! - **Generations**: every population builds a fresh catalog; nothing stale survives
//! - **Composite queries**: by market, submarket, display name, modality, duration, or all at once
//! - **Selection flow**: a step-wise state machine for console or GUI wizards
//!
//! ## Quick Start
//!
//! ```
//! use contractbook::{Catalog, DurationValue};
//! use serde_json::json;
//!
//! let asset_index = json!({"asset_index": [
//!     ["frxEURUSD", "EUR/USD", [["callput", "Rise/Fall", "5t", "1d"]]]
//! ]});
//! let active_symbols = json!({"active_symbols": [{
//!     "symbol": "frxEURUSD", "display_name": "EUR/USD",
//!     "exchange_is_open": 1, "is_trading_suspended": 0,
//!     "market": "forex", "market_display_name": "Forex",
//!     "submarket": "major_pairs", "submarket_display_name": "Major Pairs"
//! }]});
//!
//! let mut catalog = Catalog::new();
//! let report = catalog.populate(&asset_index, &active_symbols).unwrap();
//! assert_eq!(report.instruments, 1);
//!
//! let contracts = catalog.available_contracts();
//! assert_eq!(contracts.len(), 1);
//! assert_eq!(contracts[0].instrument.symbol(), "frxEURUSD");
//! assert_eq!(contracts[0].parameter.modality(), "Rise/Fall");
//!
//! // 7 ticks sits inside 5t..1d under the cross-unit order...
//! let seven_ticks = DurationValue::parse("7t").unwrap();
//! assert_eq!(catalog.by_duration(&seven_ticks, false).len(), 1);
//! // ...but the envelope is not expressed purely in ticks.
//! assert!(catalog.by_duration(&seven_ticks, true).is_empty());
//! ```
//!
//! ## Duration Ordering
//!
//! | Operation | Across units | Fails |
//! |-----------|--------------|-------|
//! | [`DurationValue::compare_within_unit`] | no | on unit mismatch |
//! | [`DurationValue::ordering_key`] | yes, unit first | never |
//!
//! ```
//! use contractbook::DurationValue;
//!
//! let hours: DurationValue = "45h".parse().unwrap();
//! let day: DurationValue = "1d".parse().unwrap();
//! assert!(hours.compare_within_unit(&day).is_err());
//! assert!(hours.ordering_key() < day.ordering_key());
//! ```
//!
//! ## Sharing
//!
//! [`SharedCatalog`] hands out `Arc` snapshots. A population builds the next
//! generation off-lock and swaps it in, so readers never see a mixed state.

pub mod catalog;
pub mod duration;
mod error;
pub mod instrument;
pub mod parameter;
mod pattern;
pub mod selection;
pub mod wire;

pub use catalog::{Catalog, ContractFilter, ContractView, MarketStatus, PopulateReport, SharedCatalog};
pub use duration::{DurationRange, DurationUnit, DurationValue};
pub use error::{CatalogError, SelectionError};
pub use instrument::{ActiveInstrument, InstrumentId, InstrumentSet, SymbolInfo};
pub use parameter::{InstrumentParameter, ParameterId, ParameterSet};
pub use selection::{Choice, SelectionFlow, SelectionInput, SelectionState, TradeSelection};
pub use wire::{AssetIndexEntry, Offering};
