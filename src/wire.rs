//! Decoding of the two catalog responses.
//!
//! ```text
//! {"asset_index": [[symbol, display_name, [[group, modality, min, max], ...]], ...]}
//! {"active_symbols": [{"symbol": ..., "market": ..., "exchange_is_open": 1, ...}, ...]}
//! ```

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::CatalogError;
use crate::instrument::SymbolInfo;

/// Serde helper for venue flags: `0`/`1`, or a boolean.
///
/// Use with `#[serde(deserialize_with = "contractbook::wire::flag")]`.
pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

/// One symbol's row in the asset index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetIndexEntry {
    pub symbol: String,
    pub display_name: String,
    pub offerings: Vec<Offering>,
}

/// One `[group, modality, min, max]` tuple. Empty tokens are kept as `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Offering {
    pub group: String,
    pub modality: String,
    pub duration_min: Option<String>,
    pub duration_max: Option<String>,
}

fn non_empty_list<'a>(response: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    response
        .get(key)
        .and_then(Value::as_array)
        .filter(|list| !list.is_empty())
}

fn malformed(what: impl Into<String>) -> CatalogError {
    CatalogError::MalformedResponse(what.into())
}

fn string_at<'a>(row: &'a [Value], i: usize, what: &str) -> Result<&'a str, CatalogError> {
    row.get(i)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(format!("{what}: expected a string at position {i}")))
}

/// Duration slots may be missing, `null`, or `""` for unbounded modalities.
fn token_at(row: &[Value], i: usize, what: &str) -> Result<Option<String>, CatalogError> {
    match row.get(i) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(malformed(format!(
            "{what}: duration token at position {i} is {other}"
        ))),
    }
}

/// Decode an `asset_index` response.
///
/// A missing or empty list is [`CatalogError::MissingAssetIndex`]; a row of
/// the wrong shape is [`CatalogError::MalformedResponse`].
pub fn parse_asset_index(response: &Value) -> Result<Vec<AssetIndexEntry>, CatalogError> {
    let rows = non_empty_list(response, "asset_index").ok_or(CatalogError::MissingAssetIndex)?;

    rows.iter()
        .enumerate()
        .map(|(n, row)| -> Result<AssetIndexEntry, CatalogError> {
            let row = row
                .as_array()
                .ok_or_else(|| malformed(format!("asset_index[{n}] is not a list")))?;
            let symbol = string_at(row, 0, &format!("asset_index[{n}]"))?;
            let display_name = row.get(1).and_then(Value::as_str).unwrap_or_default();
            let tuples = match row.get(2) {
                None | Some(Value::Null) => &[][..],
                Some(Value::Array(tuples)) => tuples.as_slice(),
                Some(_) => {
                    return Err(malformed(format!("{symbol}: offerings are not a list")));
                }
            };

            let offerings = tuples
                .iter()
                .map(|tuple| -> Result<Offering, CatalogError> {
                    let what = format!("{symbol} offering");
                    let tuple = tuple
                        .as_array()
                        .ok_or_else(|| malformed(format!("{what} is not a list")))?;
                    Ok(Offering {
                        group: string_at(tuple, 0, &what)?.to_string(),
                        modality: string_at(tuple, 1, &what)?.to_string(),
                        duration_min: token_at(tuple, 2, &what)?,
                        duration_max: token_at(tuple, 3, &what)?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(AssetIndexEntry {
                symbol: symbol.to_string(),
                display_name: display_name.to_string(),
                offerings,
            })
        })
        .collect()
}

/// Decode an `active_symbols` response.
pub fn parse_active_symbols(response: &Value) -> Result<Vec<SymbolInfo>, CatalogError> {
    let rows =
        non_empty_list(response, "active_symbols").ok_or(CatalogError::MissingActiveSymbols)?;

    rows.iter()
        .enumerate()
        .map(|(n, row)| {
            SymbolInfo::deserialize(row)
                .map_err(|e| malformed(format!("active_symbols[{n}]: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Flagged {
        #[serde(default, deserialize_with = "flag")]
        on: bool,
    }

    #[test]
    fn flags_accept_ints_and_bools() {
        let on = |v: Value| serde_json::from_value::<Flagged>(v).unwrap().on;
        assert!(on(json!({"on": 1})));
        assert!(on(json!({"on": true})));
        assert!(!on(json!({"on": 0})));
        assert!(!on(json!({"on": false})));
        assert!(!on(json!({})));
        assert!(serde_json::from_value::<Flagged>(json!({"on": "yes"})).is_err());
    }

    #[test]
    fn asset_index_rows() {
        let response = json!({
            "msg_type": "asset_index",
            "asset_index": [
                ["frxEURUSD", "EUR/USD", [
                    ["callput", "Rise/Fall", "5t", "365d"],
                    ["digits", "Even/Odd", "", ""],
                    ["asian", "Asians"]
                ]]
            ]
        });
        let entries = parse_asset_index(&response).unwrap();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.symbol, "frxEURUSD");
        assert_eq!(e.display_name, "EUR/USD");
        assert_eq!(e.offerings.len(), 3);
        assert_eq!(e.offerings[0].duration_min.as_deref(), Some("5t"));
        assert_eq!(e.offerings[1].duration_max, None);
        assert_eq!(e.offerings[2].duration_min, None);
    }

    #[test]
    fn asset_index_missing_or_empty() {
        assert_eq!(
            parse_asset_index(&json!({})),
            Err(CatalogError::MissingAssetIndex)
        );
        assert_eq!(
            parse_asset_index(&json!({"asset_index": []})),
            Err(CatalogError::MissingAssetIndex)
        );
        assert_eq!(
            parse_asset_index(&json!({"asset_index": "nope"})),
            Err(CatalogError::MissingAssetIndex)
        );
    }

    #[test]
    fn asset_index_bad_rows() {
        for bad in [
            json!({"asset_index": [42]}),
            json!({"asset_index": [[7, "x", []]]}),
            json!({"asset_index": [["R_10", "x", "oops"]]}),
            json!({"asset_index": [["R_10", "x", [["callput"]]]]}),
            json!({"asset_index": [["R_10", "x", [["callput", "Rise/Fall", 5, "1d"]]]]}),
        ] {
            assert!(
                matches!(parse_asset_index(&bad), Err(CatalogError::MalformedResponse(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn active_symbols_rows() {
        let response = json!({
            "active_symbols": [{
                "symbol": "frxEURUSD",
                "display_name": "EUR/USD",
                "exchange_is_open": 1,
                "is_trading_suspended": 0,
                "market": "forex",
                "market_display_name": "Forex",
                "submarket": "major_pairs",
                "submarket_display_name": "Major Pairs",
                "pip": 0.00001
            }]
        });
        let rows = parse_active_symbols(&response).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].exchange_is_open);
        assert_eq!(rows[0].submarket_display_name, "Major Pairs");
    }

    #[test]
    fn active_symbols_missing_or_malformed() {
        assert_eq!(
            parse_active_symbols(&json!({"error": {"code": "x"}})),
            Err(CatalogError::MissingActiveSymbols)
        );
        assert!(matches!(
            parse_active_symbols(&json!({"active_symbols": [{"display_name": "no symbol"}]})),
            Err(CatalogError::MalformedResponse(_))
        ));
    }
}
