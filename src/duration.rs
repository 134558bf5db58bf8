//! Contract durations: `<digits><unit>` tokens such as `5t`, `15m`, `1d`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

/// Unit of a contract duration, in ascending order of length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DurationUnit {
    Ticks,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl DurationUnit {
    /// All units, shortest first.
    pub const ALL: [DurationUnit; 5] = [
        DurationUnit::Ticks,
        DurationUnit::Seconds,
        DurationUnit::Minutes,
        DurationUnit::Hours,
        DurationUnit::Days,
    ];

    /// Position of the unit in the ticks < seconds < minutes < hours < days order.
    pub fn rank(self) -> u8 {
        match self {
            DurationUnit::Ticks => 0,
            DurationUnit::Seconds => 1,
            DurationUnit::Minutes => 2,
            DurationUnit::Hours => 3,
            DurationUnit::Days => 4,
        }
    }

    /// The single-character suffix used on the wire (`t`, `s`, `m`, `h`, `d`).
    pub fn as_char(self) -> char {
        match self {
            DurationUnit::Ticks => 't',
            DurationUnit::Seconds => 's',
            DurationUnit::Minutes => 'm',
            DurationUnit::Hours => 'h',
            DurationUnit::Days => 'd',
        }
    }

    /// Parse a wire suffix. Only lowercase suffixes are recognised.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            't' => Some(DurationUnit::Ticks),
            's' => Some(DurationUnit::Seconds),
            'm' => Some(DurationUnit::Minutes),
            'h' => Some(DurationUnit::Hours),
            'd' => Some(DurationUnit::Days),
            _ => None,
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DurationUnit::Ticks => "ticks",
            DurationUnit::Seconds => "seconds",
            DurationUnit::Minutes => "minutes",
            DurationUnit::Hours => "hours",
            DurationUnit::Days => "days",
        };
        f.write_str(name)
    }
}

impl FromStr for DurationUnit {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                Self::from_char(c).ok_or_else(|| CatalogError::InvalidDurationFormat(s.to_string()))
            }
            _ => Err(CatalogError::InvalidDurationFormat(s.to_string())),
        }
    }
}

/// A positive magnitude paired with a unit.
///
/// Two values only have a natural magnitude ordering when they share a unit,
/// see [`DurationValue::compare_within_unit`]. For range checks that span
/// units use [`DurationValue::ordering_key`], which orders by unit first.
///
/// ```
/// use contractbook::{DurationUnit, DurationValue};
///
/// let d: DurationValue = "15m".parse().unwrap();
/// assert_eq!(d.magnitude(), 15);
/// assert_eq!(d.unit(), DurationUnit::Minutes);
/// assert_eq!(d.to_string(), "15m");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DurationValue {
    magnitude: u32,
    unit: DurationUnit,
}

impl DurationValue {
    /// Build a value from its parts. Fails on a zero magnitude.
    pub fn new(magnitude: u32, unit: DurationUnit) -> Result<Self, CatalogError> {
        if magnitude == 0 {
            return Err(CatalogError::InvalidDurationFormat(format!(
                "{magnitude}{}",
                unit.as_char()
            )));
        }
        Ok(Self { magnitude, unit })
    }

    /// Parse a `<digits><unit>` token.
    pub fn parse(token: &str) -> Result<Self, CatalogError> {
        let invalid = || CatalogError::InvalidDurationFormat(token.to_string());

        let unit_char = token.chars().next_back().ok_or_else(invalid)?;
        let unit = DurationUnit::from_char(unit_char).ok_or_else(invalid)?;
        let digits = &token[..token.len() - unit_char.len_utf8()];

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let magnitude: u32 = digits.parse().map_err(|_| invalid())?;
        if magnitude == 0 {
            return Err(invalid());
        }
        Ok(Self { magnitude, unit })
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    pub fn unit(&self) -> DurationUnit {
        self.unit
    }

    /// Render back to the wire token (`parse(t).to_token() == t` for canonical tokens).
    pub fn to_token(&self) -> String {
        self.to_string()
    }

    /// Order two values by magnitude. Fails if the units differ.
    pub fn compare_within_unit(&self, other: &DurationValue) -> Result<Ordering, CatalogError> {
        if self.unit != other.unit {
            return Err(CatalogError::IncompatibleDurationUnits {
                left: self.unit,
                right: other.unit,
            });
        }
        Ok(self.magnitude.cmp(&other.magnitude))
    }

    /// Total-order key `(unit_rank, magnitude)`. Never fails.
    ///
    /// Any day outranks any hour regardless of magnitude, so `45h` sorts
    /// before `1d`. This mirrors how the venue expresses its envelopes: a
    /// range is stated in the units it was configured in, without coercion.
    pub fn ordering_key(&self) -> (u8, u32) {
        (self.unit.rank(), self.magnitude)
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.as_char())
    }
}

impl FromStr for DurationValue {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Inclusive `[min, max]` duration envelope.
///
/// Construction enforces `min <= max` under [`DurationValue::ordering_key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DurationRange {
    min: DurationValue,
    max: DurationValue,
}

impl DurationRange {
    pub fn new(min: DurationValue, max: DurationValue) -> Result<Self, CatalogError> {
        if min.ordering_key() > max.ordering_key() {
            return Err(CatalogError::InvertedDurationRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> DurationValue {
        self.min
    }

    pub fn max(&self) -> DurationValue {
        self.max
    }

    /// Strict containment: both bounds are in the query's unit and the
    /// magnitude lies between them.
    pub fn fits_in_units(&self, value: &DurationValue) -> bool {
        self.min.unit == value.unit
            && self.max.unit == value.unit
            && self.min.magnitude <= value.magnitude
            && value.magnitude <= self.max.magnitude
    }

    /// Cross-unit containment under the `(unit_rank, magnitude)` order,
    /// inclusive at both bounds.
    pub fn contains(&self, value: &DurationValue) -> bool {
        let key = value.ordering_key();
        self.min.ordering_key() <= key && key <= self.max.ordering_key()
    }

    /// Dispatch between [`fits_in_units`](Self::fits_in_units) and
    /// [`contains`](Self::contains).
    pub fn matches(&self, value: &DurationValue, fit_in_units: bool) -> bool {
        if fit_in_units {
            self.fits_in_units(value)
        } else {
            self.contains(value)
        }
    }
}

impl fmt::Display for DurationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(token: &str) -> DurationValue {
        DurationValue::parse(token).unwrap()
    }

    #[test]
    fn parse_all_units() {
        for (token, unit) in [
            ("7t", DurationUnit::Ticks),
            ("30s", DurationUnit::Seconds),
            ("15m", DurationUnit::Minutes),
            ("2h", DurationUnit::Hours),
            ("365d", DurationUnit::Days),
        ] {
            let v = d(token);
            assert_eq!(v.unit(), unit);
            assert_eq!(v.to_token(), token);
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        for token in ["", "t", "5", "0m", "00d", "5x", "-5m", "5 m", "5M", "1.5h", "m5"] {
            assert!(
                matches!(
                    DurationValue::parse(token),
                    Err(CatalogError::InvalidDurationFormat(_))
                ),
                "{token:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!(DurationValue::parse("99999999999t").is_err());
    }

    #[test]
    fn leading_zeros_normalise() {
        assert_eq!(d("05m"), d("5m"));
        assert_eq!(d("05m").to_token(), "5m");
    }

    #[test]
    fn compare_same_unit() {
        assert_eq!(d("5m").compare_within_unit(&d("10m")).unwrap(), Ordering::Less);
        assert_eq!(d("10m").compare_within_unit(&d("10m")).unwrap(), Ordering::Equal);
    }

    #[test]
    fn compare_across_units_fails() {
        let err = d("5m").compare_within_unit(&d("5h")).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::IncompatibleDurationUnits {
                left: DurationUnit::Minutes,
                right: DurationUnit::Hours
            }
        ));
    }

    #[test]
    fn ordering_key_is_unit_major() {
        assert!(d("45h").ordering_key() < d("1d").ordering_key());
        assert!(d("59s").ordering_key() < d("1m").ordering_key());
        assert!(d("1000t").ordering_key() < d("1s").ordering_key());
    }

    #[test]
    fn new_rejects_zero() {
        assert!(DurationValue::new(0, DurationUnit::Ticks).is_err());
        assert_eq!(DurationValue::new(3, DurationUnit::Hours).unwrap(), d("3h"));
    }

    #[test]
    fn range_inverted() {
        let err = DurationRange::new(d("10d"), d("5t")).unwrap_err();
        assert!(matches!(err, CatalogError::InvertedDurationRange { .. }));
    }

    #[test]
    fn range_fit_in_units() {
        let r = DurationRange::new(d("5t"), d("20t")).unwrap();
        assert!(r.fits_in_units(&d("10t")));
        assert!(r.fits_in_units(&d("5t")));
        assert!(r.fits_in_units(&d("20t")));
        assert!(!r.fits_in_units(&d("25t")));
        assert!(!r.fits_in_units(&d("10s")));
    }

    #[test]
    fn range_cross_unit() {
        let r = DurationRange::new(d("30m"), d("2d")).unwrap();
        assert!(r.contains(&d("5h")));
        assert!(r.contains(&d("30m")));
        assert!(r.contains(&d("2d")));
        assert!(!r.contains(&d("29m")));
        assert!(!r.contains(&d("3d")));
        assert!(!r.fits_in_units(&d("5h")));
    }

    #[test]
    fn unit_from_str() {
        assert_eq!("h".parse::<DurationUnit>().unwrap(), DurationUnit::Hours);
        assert!("hours".parse::<DurationUnit>().is_err());
        assert!("".parse::<DurationUnit>().is_err());
    }
}
