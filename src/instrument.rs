//! Active instruments: one record per tradable symbol, linked to its parameters.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::parameter::{InstrumentParameter, ParameterId, ParameterSet};
use crate::pattern::text_matches;

/// Handle to an instrument inside one [`InstrumentSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct InstrumentId(pub u32);

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I{}", self.0)
    }
}

/// Market/session metadata of one symbol, as sent in `active_symbols`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub market_display_name: String,
    #[serde(default, alias = "sub_market")]
    pub submarket: String,
    #[serde(default)]
    pub submarket_display_name: String,
    #[serde(default, deserialize_with = "crate::wire::flag")]
    pub exchange_is_open: bool,
    #[serde(default, deserialize_with = "crate::wire::flag")]
    pub is_trading_suspended: bool,
}

/// One tradable symbol and the parameters it supports.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ActiveInstrument {
    id: InstrumentId,
    info: SymbolInfo,
    parameters: Vec<ParameterId>,
}

impl ActiveInstrument {
    pub fn id(&self) -> InstrumentId {
        self.id
    }

    pub fn info(&self) -> &SymbolInfo {
        &self.info
    }

    pub fn symbol(&self) -> &str {
        &self.info.symbol
    }

    pub fn display_name(&self) -> &str {
        &self.info.display_name
    }

    pub fn market(&self) -> &str {
        &self.info.market
    }

    pub fn market_display_name(&self) -> &str {
        &self.info.market_display_name
    }

    pub fn submarket(&self) -> &str {
        &self.info.submarket
    }

    pub fn submarket_display_name(&self) -> &str {
        &self.info.submarket_display_name
    }

    pub fn exchange_is_open(&self) -> bool {
        self.info.exchange_is_open
    }

    pub fn is_trading_suspended(&self) -> bool {
        self.info.is_trading_suspended
    }

    /// Open and not suspended.
    pub fn is_tradeable(&self) -> bool {
        self.info.exchange_is_open && !self.info.is_trading_suspended
    }

    /// Associated parameters, in catalog sort order.
    pub fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    fn cmp_key(&self, other: &Self) -> std::cmp::Ordering {
        (&self.info.market, &self.info.submarket, &self.info.symbol).cmp(&(
            &other.info.market,
            &other.info.submarket,
            &other.info.symbol,
        ))
    }
}

impl fmt::Display for ActiveInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16} {:<19} {}",
            self.info.market_display_name, self.info.submarket_display_name, self.info.display_name
        )?;
        if self.info.is_trading_suspended {
            write!(f, " (suspended)")?;
        }
        if !self.info.exchange_is_open {
            write!(f, " (closed)")?;
        }
        Ok(())
    }
}

/// Owned collection of instruments, keyed by symbol id.
#[derive(Clone, Debug, Default)]
pub struct InstrumentSet {
    items: Vec<ActiveInstrument>,
    index: FxHashMap<String, InstrumentId>,
}

impl InstrumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    pub fn get(&self, id: InstrumentId) -> Option<&ActiveInstrument> {
        self.items.get(id.0 as usize)
    }

    /// Exact symbol lookup.
    pub fn by_symbol(&self, symbol: &str) -> Option<&ActiveInstrument> {
        self.index.get(symbol).and_then(|&id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveInstrument> {
        self.items.iter()
    }

    /// Register `info` unless its symbol is already present.
    ///
    /// First write wins: a second call for the same symbol returns the
    /// existing id and leaves the stored fields untouched.
    pub fn get_or_create(&mut self, info: SymbolInfo, parameters: Vec<ParameterId>) -> InstrumentId {
        if let Some(&id) = self.index.get(&info.symbol) {
            log::debug!("duplicate active symbol {} ignored", info.symbol);
            return id;
        }
        let id = InstrumentId(self.items.len() as u32);
        self.index.insert(info.symbol.clone(), id);
        self.items.push(ActiveInstrument {
            id,
            info,
            parameters,
        });
        id
    }

    fn sorted<'a>(&'a self, mut pred: impl FnMut(&ActiveInstrument) -> bool) -> Vec<&'a ActiveInstrument> {
        let mut out: Vec<_> = self.items.iter().filter(|i| pred(i)).collect();
        out.sort_by(|a, b| a.cmp_key(b));
        out
    }

    pub fn all(&self) -> Vec<&ActiveInstrument> {
        self.sorted(|_| true)
    }

    pub fn tradeable(&self) -> Vec<&ActiveInstrument> {
        self.sorted(ActiveInstrument::is_tradeable)
    }

    /// Substring search over market code and market display name.
    pub fn by_market(&self, pattern: &str) -> Vec<&ActiveInstrument> {
        self.sorted(|i| {
            text_matches(&i.info.market, pattern, false)
                || text_matches(&i.info.market_display_name, pattern, false)
        })
    }

    /// Substring search over submarket code and submarket display name.
    pub fn by_submarket(&self, pattern: &str) -> Vec<&ActiveInstrument> {
        self.sorted(|i| {
            text_matches(&i.info.submarket, pattern, false)
                || text_matches(&i.info.submarket_display_name, pattern, false)
        })
    }

    pub fn by_display_name(&self, pattern: &str) -> Vec<&ActiveInstrument> {
        self.sorted(|i| text_matches(&i.info.display_name, pattern, false))
    }

    /// Instruments with at least one parameter satisfying `pred`.
    pub fn by_parameter_predicate<'a>(
        &'a self,
        parameters: &ParameterSet,
        mut pred: impl FnMut(&InstrumentParameter) -> bool,
    ) -> Vec<&'a ActiveInstrument> {
        self.sorted(|i| {
            i.parameters
                .iter()
                .filter_map(|&id| parameters.get(id))
                .any(&mut pred)
        })
    }
}
