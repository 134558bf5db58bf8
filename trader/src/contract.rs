//! Modality → venue contract type mapping and order construction.

use std::fmt;

use contractbook::{Catalog, DurationValue, TradeSelection};
use contractbook_broker::ContractRequest;

use crate::config::OrderConfig;
use crate::error::{Error, Result};

/// Which barriers a contract type takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierKind {
    None,
    /// One price barrier, absolute or a signed offset such as `+0.5`.
    Single,
    /// High and low price barriers.
    Double,
    /// A last-digit prediction, 0 to 9.
    Digit,
}

/// One tradeable direction of a modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractType {
    pub code: &'static str,
    pub label: &'static str,
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.code)
    }
}

/// Contract types offered for a modality group, optionally narrowed to one
/// modality name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalityContracts {
    pub group: &'static str,
    /// `None` covers every modality of the group.
    pub modality: Option<&'static str>,
    pub barrier: BarrierKind,
    pub types: &'static [ContractType],
}

const fn ct(code: &'static str, label: &'static str) -> ContractType {
    ContractType { code, label }
}

/// Specific modality rows come before their group-wide fallback.
const TABLE: &[ModalityContracts] = &[
    ModalityContracts {
        group: "callput",
        modality: Some("Rise/Fall"),
        barrier: BarrierKind::None,
        types: &[ct("CALL", "Rise"), ct("PUT", "Fall")],
    },
    ModalityContracts {
        group: "callput",
        modality: Some("Higher/Lower"),
        barrier: BarrierKind::Single,
        types: &[ct("CALL", "Higher"), ct("PUT", "Lower")],
    },
    ModalityContracts {
        group: "callputequal",
        modality: None,
        barrier: BarrierKind::None,
        types: &[ct("CALLE", "Rise or equal"), ct("PUTE", "Fall or equal")],
    },
    ModalityContracts {
        group: "touchnotouch",
        modality: None,
        barrier: BarrierKind::Single,
        types: &[ct("ONETOUCH", "Touch"), ct("NOTOUCH", "No touch")],
    },
    ModalityContracts {
        group: "endsinout",
        modality: None,
        barrier: BarrierKind::Double,
        types: &[ct("EXPIRYRANGE", "Ends between"), ct("EXPIRYMISS", "Ends outside")],
    },
    ModalityContracts {
        group: "staysinout",
        modality: None,
        barrier: BarrierKind::Double,
        types: &[ct("RANGE", "Stays between"), ct("UPORDOWN", "Goes outside")],
    },
    ModalityContracts {
        group: "digits",
        modality: Some("Matches/Differs"),
        barrier: BarrierKind::Digit,
        types: &[ct("DIGITMATCH", "Matches"), ct("DIGITDIFF", "Differs")],
    },
    ModalityContracts {
        group: "digits",
        modality: Some("Even/Odd"),
        barrier: BarrierKind::None,
        types: &[ct("DIGITEVEN", "Even"), ct("DIGITODD", "Odd")],
    },
    ModalityContracts {
        group: "digits",
        modality: Some("Over/Under"),
        barrier: BarrierKind::Digit,
        types: &[ct("DIGITOVER", "Over"), ct("DIGITUNDER", "Under")],
    },
    ModalityContracts {
        group: "asian",
        modality: None,
        barrier: BarrierKind::None,
        types: &[ct("ASIANU", "Asian up"), ct("ASIAND", "Asian down")],
    },
    ModalityContracts {
        group: "highlowticks",
        modality: None,
        barrier: BarrierKind::None,
        types: &[ct("TICKHIGH", "High tick"), ct("TICKLOW", "Low tick")],
    },
    ModalityContracts {
        group: "runs",
        modality: None,
        barrier: BarrierKind::None,
        types: &[ct("RUNHIGH", "Only ups"), ct("RUNLOW", "Only downs")],
    },
];

/// Look up the contract types for a selected modality.
pub fn contracts_for(group: &str, modality: &str) -> Result<&'static ModalityContracts> {
    TABLE
        .iter()
        .find(|row| {
            row.group.eq_ignore_ascii_case(group)
                && row
                    .modality
                    .is_none_or(|m| m.eq_ignore_ascii_case(modality))
        })
        .ok_or_else(|| {
            Error::Config(format!(
                "no contract type is known for modality '{group} / {modality}'"
            ))
        })
}

/// Refuse a duration that fits none of the symbol's envelopes for the
/// selected modality. Envelopes without bounds accept any duration.
pub fn check_duration(
    catalog: &Catalog,
    selection: &TradeSelection,
    duration: &DurationValue,
) -> Result<()> {
    let instrument = catalog.instrument(&selection.symbol).ok_or_else(|| {
        Error::OrderRefused(format!("{} is not in the catalog", selection.symbol))
    })?;
    let envelopes: Vec<_> = catalog
        .parameters_of(instrument)
        .filter(|p| p.group() == selection.modality_group && p.modality() == selection.modality_name)
        .collect();
    if envelopes.is_empty() {
        return Err(Error::OrderRefused(format!(
            "{} does not offer {} / {}",
            selection.symbol, selection.modality_group, selection.modality_name
        )));
    }
    if envelopes
        .iter()
        .any(|p| !p.has_duration() || p.matches_duration(duration, false))
    {
        return Ok(());
    }
    let ranges: Vec<String> = envelopes
        .iter()
        .filter_map(|p| p.range().map(ToString::to_string))
        .collect();
    Err(Error::OrderRefused(format!(
        "duration {duration} is outside {} for {} / {} (allowed: {})",
        selection.symbol,
        selection.modality_group,
        selection.modality_name,
        ranges.join(", ")
    )))
}

/// Barrier answers for one order, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Barriers {
    pub barrier: Option<String>,
    pub barrier2: Option<String>,
}

fn parse_price_barrier(name: &str, value: &str) -> Result<()> {
    value
        .trim()
        .parse::<f64>()
        .map(|_| ())
        .map_err(|_| Error::OrderRefused(format!("{name} '{value}' is not a number")))
}

/// Check barriers against what the contract kind takes.
pub fn validate_barriers(kind: BarrierKind, barriers: &Barriers) -> Result<()> {
    let missing = |name: &str| Error::OrderRefused(format!("{name} is required"));
    match kind {
        BarrierKind::None => {
            if barriers.barrier.is_some() || barriers.barrier2.is_some() {
                return Err(Error::OrderRefused("this contract takes no barrier".into()));
            }
        }
        BarrierKind::Single => {
            let b = barriers.barrier.as_deref().ok_or_else(|| missing("barrier"))?;
            parse_price_barrier("barrier", b)?;
            if barriers.barrier2.is_some() {
                return Err(Error::OrderRefused("this contract takes one barrier".into()));
            }
        }
        BarrierKind::Double => {
            let high = barriers.barrier.as_deref().ok_or_else(|| missing("high barrier"))?;
            let low = barriers.barrier2.as_deref().ok_or_else(|| missing("low barrier"))?;
            parse_price_barrier("high barrier", high)?;
            parse_price_barrier("low barrier", low)?;
        }
        BarrierKind::Digit => {
            let d = barriers.barrier.as_deref().ok_or_else(|| missing("digit"))?;
            if !matches!(d.trim().parse::<u8>(), Ok(0..=9)) {
                return Err(Error::OrderRefused(format!("digit '{d}' must be 0-9")));
            }
        }
    }
    Ok(())
}

/// Assemble the purchase request for a confirmed selection.
pub fn build_request(
    selection: &TradeSelection,
    contract: &ContractType,
    kind: BarrierKind,
    duration: DurationValue,
    barriers: Barriers,
    order: &OrderConfig,
) -> Result<ContractRequest> {
    validate_barriers(kind, &barriers)?;
    Ok(ContractRequest {
        contract_type: contract.code.to_string(),
        symbol: selection.symbol.clone(),
        duration,
        amount: order.amount,
        basis: order.basis,
        currency: order.currency.clone(),
        barrier: barriers.barrier.map(|b| b.trim().to_string()),
        barrier2: barriers.barrier2.map(|b| b.trim().to_string()),
        max_price: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::from_responses(
            &json!({"asset_index": [
                ["R_10", "Volatility 10 Index", [
                    ["callput", "Rise/Fall", "1t", "365d"],
                    ["touchnotouch", "Touch/No Touch", "5t", "10t"],
                    ["touchnotouch", "Touch/No Touch", "2m", "1h"],
                    ["digits", "Even/Odd", "", ""]
                ]]
            ]}),
            &json!({"active_symbols": [{
                "symbol": "R_10", "display_name": "Volatility 10 Index",
                "market": "synthetic_index", "market_display_name": "Derived",
                "submarket": "random_index", "submarket_display_name": "Continuous Indices",
                "exchange_is_open": 1, "is_trading_suspended": 0
            }]}),
        )
        .unwrap()
    }

    fn selection(group: &str, modality: &str) -> TradeSelection {
        TradeSelection {
            symbol: "R_10".into(),
            market: "synthetic_index".into(),
            submarket: "random_index".into(),
            display_name: "Volatility 10 Index".into(),
            modality_group: group.into(),
            modality_name: modality.into(),
        }
    }

    fn d(token: &str) -> DurationValue {
        DurationValue::parse(token).unwrap()
    }

    // === Table ===

    #[test]
    fn specific_rows_win() {
        let row = contracts_for("callput", "Higher/Lower").unwrap();
        assert_eq!(row.barrier, BarrierKind::Single);
        let row = contracts_for("CALLPUT", "rise/fall").unwrap();
        assert_eq!(row.types[0].code, "CALL");
        assert_eq!(row.types[1].code, "PUT");
        assert_eq!(row.barrier, BarrierKind::None);
    }

    #[test]
    fn group_rows_cover_any_modality() {
        let row = contracts_for("touchnotouch", "Touch/No Touch").unwrap();
        assert_eq!(row.types[0].code, "ONETOUCH");
        assert_eq!(contracts_for("asian", "Asians").unwrap().types[1].code, "ASIAND");
        assert_eq!(
            contracts_for("endsinout", "Ends Between/Ends Outside").unwrap().barrier,
            BarrierKind::Double
        );
    }

    #[test]
    fn unknown_modality_names_it() {
        let err = contracts_for("lookback", "High-Close").unwrap_err();
        assert!(err.to_string().contains("lookback / High-Close"));
        assert!(contracts_for("callput", "Sideways").is_err());
    }

    // === Duration envelope ===

    #[test]
    fn duration_inside_envelope() {
        let c = catalog();
        assert!(check_duration(&c, &selection("callput", "Rise/Fall"), &d("5m")).is_ok());
        assert!(check_duration(&c, &selection("touchnotouch", "Touch/No Touch"), &d("30m")).is_ok());
    }

    #[test]
    fn duration_outside_every_envelope() {
        let c = catalog();
        let err = check_duration(&c, &selection("touchnotouch", "Touch/No Touch"), &d("2h")).unwrap_err();
        match err {
            Error::OrderRefused(msg) => {
                assert!(msg.contains("5t..10t"));
                assert!(msg.contains("2m..1h"));
            }
            other => panic!("expected refusal, got {other:?}"),
        }
    }

    #[test]
    fn unbounded_envelope_accepts_anything() {
        let c = catalog();
        assert!(check_duration(&c, &selection("digits", "Even/Odd"), &d("7t")).is_ok());
    }

    #[test]
    fn modality_not_offered() {
        let c = catalog();
        assert!(matches!(
            check_duration(&c, &selection("asian", "Asians"), &d("5t")),
            Err(Error::OrderRefused(_))
        ));
    }

    // === Barriers and request ===

    #[test]
    fn barrier_validation() {
        let none = Barriers::default();
        let one = Barriers {
            barrier: Some("+0.5".into()),
            barrier2: None,
        };
        let two = Barriers {
            barrier: Some("+1.2".into()),
            barrier2: Some("-1.2".into()),
        };
        assert!(validate_barriers(BarrierKind::None, &none).is_ok());
        assert!(validate_barriers(BarrierKind::None, &one).is_err());
        assert!(validate_barriers(BarrierKind::Single, &one).is_ok());
        assert!(validate_barriers(BarrierKind::Single, &none).is_err());
        assert!(validate_barriers(BarrierKind::Double, &two).is_ok());
        assert!(validate_barriers(BarrierKind::Double, &one).is_err());

        let digit = |s: &str| Barriers {
            barrier: Some(s.into()),
            barrier2: None,
        };
        assert!(validate_barriers(BarrierKind::Digit, &digit("7")).is_ok());
        assert!(validate_barriers(BarrierKind::Digit, &digit("10")).is_err());
        assert!(validate_barriers(BarrierKind::Digit, &digit("x")).is_err());
    }

    #[test]
    fn request_from_selection() {
        let row = contracts_for("touchnotouch", "Touch/No Touch").unwrap();
        let request = build_request(
            &selection("touchnotouch", "Touch/No Touch"),
            &row.types[1],
            row.barrier,
            d("5t"),
            Barriers {
                barrier: Some(" +0.25 ".into()),
                barrier2: None,
            },
            &OrderConfig::default(),
        )
        .unwrap();
        assert_eq!(request.contract_type, "NOTOUCH");
        assert_eq!(request.symbol, "R_10");
        assert_eq!(request.barrier.as_deref(), Some("+0.25"));
        assert_eq!(request.amount, 1.0);
        assert_eq!(request.currency, "USD");
        assert_eq!(request.to_string(), "NOTOUCH R_10 5t 1.00 USD (stake) barrier +0.25");
    }
}
