//! Step-wise trade selection: market, submarket, symbol, modality group,
//! modality name.
//!
//! The flow only narrows the catalog; it performs no I/O. A console or GUI
//! front-end renders [`SelectionFlow::choices`] and feeds the user's answer
//! back through [`SelectionFlow::advance`].

use std::fmt;

use crate::catalog::Catalog;
use crate::error::SelectionError;
use crate::pattern::text_matches;

/// The resolved selection handed to order construction.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TradeSelection {
    pub symbol: String,
    pub market: String,
    pub submarket: String,
    pub display_name: String,
    pub modality_group: String,
    pub modality_name: String,
}

impl fmt::Display for TradeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {} / {}",
            self.display_name, self.symbol, self.modality_group, self.modality_name
        )
    }
}

/// Where the flow currently is. Each state carries the choices made so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionState {
    SelectMarket,
    SelectSubmarket {
        market: String,
    },
    SelectSymbol {
        market: String,
        submarket: String,
    },
    SelectModalityGroup {
        market: String,
        submarket: String,
        symbol: String,
    },
    SelectModalityName {
        market: String,
        submarket: String,
        symbol: String,
        group: String,
    },
    Confirmed(TradeSelection),
    Cancelled,
}

impl SelectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SelectionState::Confirmed(_) | SelectionState::Cancelled)
    }

    /// Short prompt for the pending step.
    pub fn prompt(&self) -> &'static str {
        match self {
            SelectionState::SelectMarket => "Market",
            SelectionState::SelectSubmarket { .. } => "Submarket",
            SelectionState::SelectSymbol { .. } => "Symbol",
            SelectionState::SelectModalityGroup { .. } => "Contract category",
            SelectionState::SelectModalityName { .. } => "Contract type",
            SelectionState::Confirmed(_) => "Confirmed",
            SelectionState::Cancelled => "Cancelled",
        }
    }
}

/// What the caller answers at a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionInput {
    /// Pick by code or by label, case-insensitively.
    Choose(String),
    Cancel,
}

/// One option offered at the current step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    /// Code fed back into the flow.
    pub value: String,
    pub label: String,
    /// False for closed markets and untradeable symbols. Still selectable.
    pub is_open: bool,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)?;
        if !self.is_open {
            f.write_str(" (closed)")?;
        }
        Ok(())
    }
}

/// Forward-only state machine over one catalog snapshot.
///
/// ```
/// use contractbook::{Catalog, SelectionFlow, SelectionInput, SelectionState};
/// use serde_json::json;
///
/// let catalog = Catalog::from_responses(
///     &json!({"asset_index": [["R_10", "Volatility 10", [["callput", "Rise/Fall", "1t", "10t"]]]]}),
///     &json!({"active_symbols": [{
///         "symbol": "R_10", "display_name": "Volatility 10",
///         "market": "synthetic_index", "market_display_name": "Derived",
///         "submarket": "random_index", "submarket_display_name": "Continuous Indices",
///         "exchange_is_open": 1, "is_trading_suspended": 0
///     }]}),
/// )
/// .unwrap();
///
/// let mut flow = SelectionFlow::new(&catalog);
/// for answer in ["Derived", "random_index", "R_10", "callput", "rise/fall"] {
///     flow.advance(SelectionInput::Choose(answer.into())).unwrap();
/// }
/// let SelectionState::Confirmed(selection) = flow.state() else { panic!() };
/// assert_eq!(selection.symbol, "R_10");
/// assert_eq!(selection.modality_name, "Rise/Fall");
/// ```
#[derive(Clone, Debug)]
pub struct SelectionFlow<'a> {
    catalog: &'a Catalog,
    state: SelectionState,
}

impl<'a> SelectionFlow<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            state: SelectionState::SelectMarket,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// The confirmed selection, once reached.
    pub fn selection(&self) -> Option<&TradeSelection> {
        match &self.state {
            SelectionState::Confirmed(s) => Some(s),
            _ => None,
        }
    }

    /// Options for the current step, derived from the catalog and the
    /// choices made so far. Empty once the flow is finished.
    pub fn choices(&self) -> Vec<Choice> {
        let catalog = self.catalog;
        match &self.state {
            SelectionState::SelectMarket => catalog
                .markets_with_status()
                .into_iter()
                .map(|m| Choice {
                    value: m.code,
                    label: m.display_name,
                    is_open: m.is_open,
                })
                .collect(),
            SelectionState::SelectSubmarket { market } => catalog
                .submarkets_for(market)
                .into_iter()
                .map(|m| Choice {
                    value: m.code,
                    label: m.display_name,
                    is_open: m.is_open,
                })
                .collect(),
            SelectionState::SelectSymbol { market, submarket } => catalog
                .symbols_for(market, submarket)
                .into_iter()
                .map(|i| Choice {
                    value: i.symbol().to_string(),
                    label: i.display_name().to_string(),
                    is_open: i.is_tradeable(),
                })
                .collect(),
            SelectionState::SelectModalityGroup { symbol, .. } => {
                let open = self.symbol_open(symbol);
                catalog
                    .modality_groups_for(symbol)
                    .into_iter()
                    .map(|g| Choice {
                        value: g.to_string(),
                        label: g.to_string(),
                        is_open: open,
                    })
                    .collect()
            }
            SelectionState::SelectModalityName { symbol, group, .. } => {
                let open = self.symbol_open(symbol);
                catalog
                    .modality_names_for(symbol, group)
                    .into_iter()
                    .map(|n| Choice {
                        value: n.to_string(),
                        label: n.to_string(),
                        is_open: open,
                    })
                    .collect()
            }
            SelectionState::Confirmed(_) | SelectionState::Cancelled => Vec::new(),
        }
    }

    fn symbol_open(&self, symbol: &str) -> bool {
        self.catalog
            .instrument(symbol)
            .is_some_and(|i| i.is_tradeable())
    }

    /// Apply one answer.
    ///
    /// An answer that is not among [`choices`](Self::choices) is rejected
    /// and the state is left unchanged, so the caller can simply prompt
    /// again. `Cancel` ends the flow from any non-terminal state.
    pub fn advance(&mut self, input: SelectionInput) -> Result<&SelectionState, SelectionError> {
        if self.state.is_terminal() {
            return Err(SelectionError::Finished);
        }
        let answer = match input {
            SelectionInput::Cancel => {
                self.state = SelectionState::Cancelled;
                return Ok(&self.state);
            }
            SelectionInput::Choose(answer) => answer,
        };

        let picked = self
            .choices()
            .into_iter()
            .find(|c| {
                c.value == answer
                    || text_matches(&c.value, answer.trim(), true)
                    || text_matches(&c.label, answer.trim(), true)
            })
            .ok_or_else(|| SelectionError::UnknownChoice(answer.clone()))?
            .value;

        let next = match std::mem::replace(&mut self.state, SelectionState::Cancelled) {
            SelectionState::SelectMarket => SelectionState::SelectSubmarket { market: picked },
            SelectionState::SelectSubmarket { market } => SelectionState::SelectSymbol {
                market,
                submarket: picked,
            },
            SelectionState::SelectSymbol { market, submarket } => {
                SelectionState::SelectModalityGroup {
                    market,
                    submarket,
                    symbol: picked,
                }
            }
            SelectionState::SelectModalityGroup {
                market,
                submarket,
                symbol,
            } => SelectionState::SelectModalityName {
                market,
                submarket,
                symbol,
                group: picked,
            },
            SelectionState::SelectModalityName {
                market,
                submarket,
                symbol,
                group,
            } => {
                let display_name = self
                    .catalog
                    .instrument(&symbol)
                    .map(|i| i.display_name().to_string())
                    .unwrap_or_default();
                SelectionState::Confirmed(TradeSelection {
                    symbol,
                    market,
                    submarket,
                    display_name,
                    modality_group: group,
                    modality_name: picked,
                })
            }
            terminal => terminal,
        };
        self.state = next;
        Ok(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn symbol(s: &str, name: &str, market: &str, md: &str, sub: &str, sd: &str, open: u8) -> Value {
        json!({
            "symbol": s, "display_name": name,
            "market": market, "market_display_name": md,
            "submarket": sub, "submarket_display_name": sd,
            "exchange_is_open": open, "is_trading_suspended": 0
        })
    }

    fn catalog() -> Catalog {
        Catalog::from_responses(
            &json!({"asset_index": [
                ["frxEURUSD", "EUR/USD", [
                    ["callput", "Rise/Fall", "5t", "1d"],
                    ["callput", "Higher/Lower", "15m", "1d"],
                    ["touchnotouch", "Touch/No Touch", "5t", "1d"]
                ]],
                ["OTC_DJI", "Wall Street 30", [["callput", "Rise/Fall", "1d", "365d"]]]
            ]}),
            &json!({"active_symbols": [
                symbol("frxEURUSD", "EUR/USD", "forex", "Forex", "major_pairs", "Major Pairs", 1),
                symbol("OTC_DJI", "Wall Street 30", "indices", "Stock Indices", "americas_OTC", "American indices", 0)
            ]}),
        )
        .unwrap()
    }

    fn choose(flow: &mut SelectionFlow<'_>, answer: &str) -> Result<SelectionState, SelectionError> {
        flow.advance(SelectionInput::Choose(answer.into())).cloned()
    }

    #[test]
    fn full_walk() {
        let c = catalog();
        let mut flow = SelectionFlow::new(&c);
        assert_eq!(flow.state().prompt(), "Market");

        choose(&mut flow, "forex").unwrap();
        choose(&mut flow, "Major Pairs").unwrap();
        choose(&mut flow, "frxEURUSD").unwrap();

        let groups: Vec<_> = flow.choices().into_iter().map(|c| c.value).collect();
        assert_eq!(groups, vec!["callput", "touchnotouch"]);
        choose(&mut flow, "callput").unwrap();

        let names: Vec<_> = flow.choices().into_iter().map(|c| c.value).collect();
        assert_eq!(names, vec!["Higher/Lower", "Rise/Fall"]);
        let state = choose(&mut flow, "Rise/Fall").unwrap();

        assert_eq!(
            state,
            SelectionState::Confirmed(TradeSelection {
                symbol: "frxEURUSD".into(),
                market: "forex".into(),
                submarket: "major_pairs".into(),
                display_name: "EUR/USD".into(),
                modality_group: "callput".into(),
                modality_name: "Rise/Fall".into(),
            })
        );
        assert!(flow.is_finished());
        assert!(flow.choices().is_empty());
        assert_eq!(flow.selection().unwrap().symbol, "frxEURUSD");
    }

    #[test]
    fn invalid_input_keeps_state() {
        let c = catalog();
        let mut flow = SelectionFlow::new(&c);
        choose(&mut flow, "forex").unwrap();
        let before = flow.state().clone();

        assert_eq!(
            choose(&mut flow, "crypto"),
            Err(SelectionError::UnknownChoice("crypto".into()))
        );
        assert_eq!(flow.state(), &before);
        // Partial names are not accepted.
        assert!(choose(&mut flow, "Major").is_err());
        assert_eq!(flow.state(), &before);
    }

    #[test]
    fn closed_markets_are_listed_and_flagged() {
        let c = catalog();
        let flow = SelectionFlow::new(&c);
        let choices = flow.choices();
        assert_eq!(choices.len(), 2);
        let indices = choices.iter().find(|c| c.value == "indices").unwrap();
        assert!(!indices.is_open);
        assert_eq!(indices.to_string(), "Stock Indices (closed)");
        let forex = choices.iter().find(|c| c.value == "forex").unwrap();
        assert_eq!(forex.to_string(), "Forex");
    }

    #[test]
    fn cancel_from_any_step() {
        let c = catalog();
        for steps in 0..5 {
            let mut flow = SelectionFlow::new(&c);
            let path = ["forex", "major_pairs", "frxEURUSD", "callput", "Rise/Fall"];
            for answer in &path[..steps] {
                choose(&mut flow, answer).unwrap();
            }
            assert_eq!(
                flow.advance(SelectionInput::Cancel).unwrap(),
                &SelectionState::Cancelled
            );
            assert!(flow.selection().is_none());
        }
    }

    #[test]
    fn finished_flow_rejects_input() {
        let c = catalog();
        let mut flow = SelectionFlow::new(&c);
        flow.advance(SelectionInput::Cancel).unwrap();
        assert_eq!(choose(&mut flow, "forex"), Err(SelectionError::Finished));
        assert_eq!(
            flow.advance(SelectionInput::Cancel),
            Err(SelectionError::Finished)
        );
    }

    #[test]
    fn choices_follow_prior_answers() {
        let c = catalog();
        let mut flow = SelectionFlow::new(&c);
        choose(&mut flow, "stock indices").unwrap();
        let subs = flow.choices();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].value, "americas_OTC");
        choose(&mut flow, "americas_otc").unwrap();
        let symbols = flow.choices();
        assert_eq!(symbols[0].value, "OTC_DJI");
        assert!(!symbols[0].is_open);
    }
}
