//! Catalog error types.

use crate::duration::{DurationUnit, DurationValue};

/// Errors raised while building or querying a catalog.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Token is not `<digits><unit>` with a positive magnitude.
    #[error("invalid duration format: {0:?}")]
    InvalidDurationFormat(String),

    /// Same-unit comparison attempted across units.
    #[error("cannot compare {left} with {right} without a cross-unit ordering")]
    IncompatibleDurationUnits {
        left: DurationUnit,
        right: DurationUnit,
    },

    /// Empty group or modality name.
    #[error("invalid parameter spec: {0}")]
    InvalidParameterSpec(String),

    /// Exactly one of min/max duration was given.
    #[error("duration range needs both min and max, or neither")]
    AsymmetricDurationRange,

    #[error("inverted duration range: min {min} is longer than max {max}")]
    InvertedDurationRange {
        min: DurationValue,
        max: DurationValue,
    },

    #[error("response has no usable \"asset_index\" list")]
    MissingAssetIndex,

    #[error("response has no usable \"active_symbols\" list")]
    MissingActiveSymbols,

    /// Active symbol with no asset-index entry. Reported per record, never
    /// returned from a populate call.
    #[error("active symbol {0} has no asset-index entry")]
    UnjoinableSymbol(String),

    /// A record inside an otherwise valid response has the wrong shape.
    #[error("malformed response record: {0}")]
    MalformedResponse(String),
}

/// Errors returned by [`SelectionFlow::advance`](crate::SelectionFlow::advance).
///
/// The flow stays in the state it was in when the error was produced.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("{0:?} is not one of the offered choices")]
    UnknownChoice(String),

    #[error("selection already finished")]
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            CatalogError::InvalidDurationFormat("5x".into()).to_string(),
            "invalid duration format: \"5x\""
        );
        assert_eq!(
            CatalogError::IncompatibleDurationUnits {
                left: DurationUnit::Minutes,
                right: DurationUnit::Hours,
            }
            .to_string(),
            "cannot compare minutes with hours without a cross-unit ordering"
        );
        assert_eq!(
            CatalogError::UnjoinableSymbol("R_10".into()).to_string(),
            "active symbol R_10 has no asset-index entry"
        );
    }

    #[test]
    fn is_error() {
        let err: Box<dyn std::error::Error> = Box::new(CatalogError::MissingAssetIndex);
        assert!(err.to_string().contains("asset_index"));
    }
}
