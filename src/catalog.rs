//! The catalog: parameters and instruments joined by symbol, plus the
//! composite queries the wizard and order builder run against them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::duration::DurationValue;
use crate::error::CatalogError;
use crate::instrument::{ActiveInstrument, InstrumentSet};
use crate::parameter::{InstrumentParameter, ParameterId, ParameterSet};
use crate::pattern::text_matches;
use crate::wire;

/// Outcome of a successful population.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PopulateReport {
    pub generation: u64,
    pub parameters: usize,
    pub instruments: usize,
    /// Active symbols dropped because the asset index has no row for them.
    pub skipped: Vec<String>,
}

impl fmt::Display for PopulateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: {} parameters, {} instruments, {} skipped",
            self.generation,
            self.parameters,
            self.instruments,
            self.skipped.len()
        )
    }
}

/// One tradable combination: an instrument and one of its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractView<'a> {
    pub instrument: &'a ActiveInstrument,
    pub parameter: &'a InstrumentParameter,
}

impl fmt::Display for ContractView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<14} {}", self.instrument.symbol(), self.parameter)?;
        if !self.instrument.is_tradeable() {
            write!(f, "  (closed)")?;
        }
        Ok(())
    }
}

/// A market or submarket as listed by the selection wizard.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct MarketStatus {
    pub code: String,
    pub display_name: String,
    /// At least one instrument under it is tradeable.
    pub is_open: bool,
}

/// Multi-predicate filter for [`Catalog::find_matches`].
///
/// Every set field must match (AND). Text fields are case-insensitive
/// substring patterns.
///
/// ```
/// use contractbook::{ContractFilter, DurationValue};
///
/// let filter = ContractFilter::new()
///     .market("forex")
///     .modality_name("rise")
///     .duration(DurationValue::parse("7t").unwrap())
///     .fit_in_units(true);
/// assert!(!filter.is_empty());
/// assert!(ContractFilter::new().is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractFilter {
    pub symbol: Option<String>,
    pub market: Option<String>,
    pub submarket: Option<String>,
    pub display_name: Option<String>,
    pub modality_group: Option<String>,
    pub modality_name: Option<String>,
    pub duration: Option<DurationValue>,
    pub fit_in_units: bool,
}

impl ContractFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol(mut self, pattern: impl Into<String>) -> Self {
        self.symbol = Some(pattern.into());
        self
    }

    pub fn market(mut self, pattern: impl Into<String>) -> Self {
        self.market = Some(pattern.into());
        self
    }

    pub fn submarket(mut self, pattern: impl Into<String>) -> Self {
        self.submarket = Some(pattern.into());
        self
    }

    pub fn display_name(mut self, pattern: impl Into<String>) -> Self {
        self.display_name = Some(pattern.into());
        self
    }

    pub fn modality_group(mut self, pattern: impl Into<String>) -> Self {
        self.modality_group = Some(pattern.into());
        self
    }

    pub fn modality_name(mut self, pattern: impl Into<String>) -> Self {
        self.modality_name = Some(pattern.into());
        self
    }

    pub fn duration(mut self, value: DurationValue) -> Self {
        self.duration = Some(value);
        self
    }

    /// Use same-unit containment for the duration filter.
    pub fn fit_in_units(mut self, fit: bool) -> Self {
        self.fit_in_units = fit;
        self
    }

    /// No predicate set. `fit_in_units` alone is not a predicate.
    pub fn is_empty(&self) -> bool {
        self.symbol.is_none()
            && self.market.is_none()
            && self.submarket.is_none()
            && self.display_name.is_none()
            && self.modality_group.is_none()
            && self.modality_name.is_none()
            && self.duration.is_none()
    }

    fn matches_instrument(&self, i: &ActiveInstrument) -> bool {
        any_field(&self.symbol, &[i.symbol()])
            && any_field(&self.market, &[i.market(), i.market_display_name()])
            && any_field(&self.submarket, &[i.submarket(), i.submarket_display_name()])
            && any_field(&self.display_name, &[i.display_name()])
    }

    fn matches_parameter(&self, p: &InstrumentParameter) -> bool {
        self.modality_group
            .as_deref()
            .is_none_or(|g| text_matches(p.group(), g, false))
            && self
                .modality_name
                .as_deref()
                .is_none_or(|m| text_matches(p.modality(), m, false))
            && self
                .duration
                .is_none_or(|d| p.matches_duration(&d, self.fit_in_units))
    }
}

fn any_field(pattern: &Option<String>, fields: &[&str]) -> bool {
    pattern
        .as_deref()
        .is_none_or(|p| fields.iter().any(|f| text_matches(f, p, false)))
}

/// One generation of the instrument catalog.
///
/// Built wholesale from an `asset_index` and an `active_symbols` response.
/// Re-populating replaces every parameter and instrument; nothing from the
/// previous generation survives.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    parameters: ParameterSet,
    instruments: InstrumentSet,
    skipped: Vec<String>,
    generation: u64,
}

impl Catalog {
    /// An empty catalog (generation 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build generation 1 straight from two responses.
    pub fn from_responses(asset_index: &Value, active_symbols: &Value) -> Result<Self, CatalogError> {
        let mut catalog = Self::build(asset_index, active_symbols)?;
        catalog.generation = 1;
        Ok(catalog)
    }

    /// Replace the contents with a fresh generation.
    ///
    /// The new generation is built aside and swapped in only on success, so
    /// a failed call leaves the catalog as it was.
    pub fn populate(
        &mut self,
        asset_index: &Value,
        active_symbols: &Value,
    ) -> Result<PopulateReport, CatalogError> {
        let mut next = Self::build(asset_index, active_symbols)?;
        next.generation = self.generation + 1;
        *self = next;
        let report = self.report();
        info!("catalog populated: {report}");
        Ok(report)
    }

    fn build(asset_index: &Value, active_symbols: &Value) -> Result<Self, CatalogError> {
        let entries = wire::parse_asset_index(asset_index)?;
        let records = wire::parse_active_symbols(active_symbols)?;

        let mut parameters = ParameterSet::new();
        let mut by_symbol: FxHashMap<String, Vec<ParameterId>> = FxHashMap::default();
        for entry in entries {
            if by_symbol.contains_key(&entry.symbol) {
                debug!("duplicate asset_index row for {} ignored", entry.symbol);
                continue;
            }
            let mut ids = Vec::with_capacity(entry.offerings.len());
            for o in &entry.offerings {
                let id = parameters.get_or_create(
                    &o.group,
                    &o.modality,
                    o.duration_min.as_deref(),
                    o.duration_max.as_deref(),
                )?;
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            ids.sort_by(|a, b| match (parameters.get(*a), parameters.get(*b)) {
                (Some(x), Some(y)) => x.cmp_key(y),
                _ => a.cmp(b),
            });
            by_symbol.insert(entry.symbol, ids);
        }

        let mut instruments = InstrumentSet::new();
        let mut skipped = Vec::new();
        for record in records {
            match by_symbol.get(&record.symbol) {
                Some(ids) => {
                    let ids = ids.clone();
                    instruments.get_or_create(record, ids);
                }
                None => {
                    warn!("{}", CatalogError::UnjoinableSymbol(record.symbol.clone()));
                    skipped.push(record.symbol);
                }
            }
        }

        Ok(Self {
            parameters,
            instruments,
            skipped,
            generation: 0,
        })
    }

    pub fn report(&self) -> PopulateReport {
        PopulateReport {
            generation: self.generation,
            parameters: self.parameters.len(),
            instruments: self.instruments.len(),
            skipped: self.skipped.clone(),
        }
    }

    /// Population counter; 0 means never populated.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn instruments(&self) -> &InstrumentSet {
        &self.instruments
    }

    /// Symbols dropped by the last population.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn instrument(&self, symbol: &str) -> Option<&ActiveInstrument> {
        self.instruments.by_symbol(symbol)
    }

    /// The parameters of one instrument, in catalog order.
    pub fn parameters_of<'a>(
        &'a self,
        instrument: &'a ActiveInstrument,
    ) -> impl Iterator<Item = &'a InstrumentParameter> + 'a {
        instrument
            .parameters()
            .iter()
            .filter_map(|&id| self.parameters.get(id))
    }

    fn flatten<'a>(
        &'a self,
        instruments: Vec<&'a ActiveInstrument>,
        mut pred: impl FnMut(&InstrumentParameter) -> bool,
    ) -> Vec<ContractView<'a>> {
        let mut out = Vec::new();
        for instrument in instruments {
            for parameter in self.parameters_of(instrument) {
                if pred(parameter) {
                    out.push(ContractView {
                        instrument,
                        parameter,
                    });
                }
            }
        }
        out
    }

    /// Every (instrument, parameter) pair of every tradeable instrument.
    pub fn available_contracts(&self) -> Vec<ContractView<'_>> {
        self.flatten(self.instruments.tradeable(), |_| true)
    }

    pub fn by_market_display_name(&self, name: &str) -> Vec<ContractView<'_>> {
        self.flatten(self.instruments.by_market(name), |_| true)
    }

    pub fn by_submarket_display_name(&self, name: &str) -> Vec<ContractView<'_>> {
        self.flatten(self.instruments.by_submarket(name), |_| true)
    }

    pub fn by_display_name(&self, name: &str) -> Vec<ContractView<'_>> {
        self.flatten(self.instruments.by_display_name(name), |_| true)
    }

    /// Pairs whose parameter envelope admits `value`.
    pub fn by_duration(&self, value: &DurationValue, fit_in_units: bool) -> Vec<ContractView<'_>> {
        self.flatten(self.instruments.all(), |p| {
            p.matches_duration(value, fit_in_units)
        })
    }

    /// Pairs whose modality name matches; exact when `restricted`.
    pub fn by_modality(&self, pattern: &str, restricted: bool) -> Vec<ContractView<'_>> {
        self.flatten(self.instruments.all(), |p| {
            text_matches(p.modality(), pattern, restricted)
        })
    }

    /// Pairs for exactly one symbol.
    pub fn contracts_for_symbol(&self, symbol: &str) -> Vec<ContractView<'_>> {
        self.flatten(self.instrument(symbol).into_iter().collect(), |_| true)
    }

    /// Pairs satisfying every predicate in `filter`.
    ///
    /// An empty filter matches nothing.
    pub fn find_matches(&self, filter: &ContractFilter) -> Vec<ContractView<'_>> {
        if filter.is_empty() {
            return Vec::new();
        }
        let instruments = self
            .instruments
            .all()
            .into_iter()
            .filter(|i| filter.matches_instrument(i))
            .collect();
        self.flatten(instruments, |p| filter.matches_parameter(p))
    }

    // ---- wizard steps ----

    fn group_status<'a>(
        instruments: impl IntoIterator<Item = &'a ActiveInstrument>,
        key: impl Fn(&'a ActiveInstrument) -> (&'a str, &'a str),
    ) -> Vec<MarketStatus> {
        let mut groups: BTreeMap<&str, MarketStatus> = BTreeMap::new();
        for i in instruments {
            let (code, display_name) = key(i);
            let entry = groups.entry(code).or_insert_with(|| MarketStatus {
                code: code.to_string(),
                display_name: display_name.to_string(),
                is_open: false,
            });
            entry.is_open |= i.is_tradeable();
        }
        let mut out: Vec<_> = groups.into_values().collect();
        out.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        out
    }

    /// Every market, open or not, sorted by display name.
    pub fn markets_with_status(&self) -> Vec<MarketStatus> {
        Self::group_status(self.instruments.iter(), |i| {
            (i.market(), i.market_display_name())
        })
    }

    /// Submarkets of one market code.
    pub fn submarkets_for(&self, market: &str) -> Vec<MarketStatus> {
        Self::group_status(
            self.instruments.iter().filter(|i| i.market() == market),
            |i| (i.submarket(), i.submarket_display_name()),
        )
    }

    /// Instruments of one market/submarket pair, sorted by symbol.
    pub fn symbols_for(&self, market: &str, submarket: &str) -> Vec<&ActiveInstrument> {
        self.instruments
            .all()
            .into_iter()
            .filter(|i| i.market() == market && i.submarket() == submarket)
            .collect()
    }

    /// Distinct modality groups offered on a symbol.
    pub fn modality_groups_for(&self, symbol: &str) -> Vec<&str> {
        let mut groups: Vec<&str> = self
            .instrument(symbol)
            .into_iter()
            .flat_map(|i| self.parameters_of(i))
            .map(InstrumentParameter::group)
            .collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// Distinct modality names within one group on a symbol.
    pub fn modality_names_for(&self, symbol: &str, group: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .instrument(symbol)
            .into_iter()
            .flat_map(|i| self.parameters_of(i))
            .filter(|p| p.group() == group)
            .map(InstrumentParameter::modality)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// A catalog shared between threads.
///
/// Readers take an immutable snapshot; [`populate`](Self::populate) builds
/// the next generation without holding the lock and swaps it in under the
/// write lock, so no reader ever sees a half-built catalog.
#[derive(Clone, Debug, Default)]
pub struct SharedCatalog {
    inner: Arc<RwLock<Arc<Catalog>>>,
}

impl SharedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current generation.
    pub fn snapshot(&self) -> Arc<Catalog> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn populate(
        &self,
        asset_index: &Value,
        active_symbols: &Value,
    ) -> Result<PopulateReport, CatalogError> {
        let mut next = Catalog::build(asset_index, active_symbols)?;
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        next.generation = guard.generation + 1;
        let report = next.report();
        *guard = Arc::new(next);
        drop(guard);
        info!("catalog populated: {report}");
        Ok(report)
    }
}
