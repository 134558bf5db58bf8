//! Instrument parameters: de-duplicated (group, modality, duration range) records.

use std::cmp::Ordering;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::duration::{DurationRange, DurationValue};
use crate::error::CatalogError;
use crate::pattern::text_matches;

/// Handle to a parameter inside one [`ParameterSet`].
///
/// Two handles are equal exactly when they refer to the same logical
/// parameter, which is what de-duplication guarantees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct ParameterId(pub u32);

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Structural identity of a parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ParameterKey {
    group: String,
    modality: String,
    range: Option<DurationRange>,
}

/// One tradable modality, optionally bounded by a duration envelope.
///
/// Created only through [`ParameterSet::get_or_create`]; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct InstrumentParameter {
    id: ParameterId,
    group: String,
    modality: String,
    range: Option<DurationRange>,
}

impl InstrumentParameter {
    pub fn id(&self) -> ParameterId {
        self.id
    }

    /// Modality group, e.g. `callput`.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Modality name, e.g. `Rise/Fall`.
    pub fn modality(&self) -> &str {
        &self.modality
    }

    pub fn range(&self) -> Option<&DurationRange> {
        self.range.as_ref()
    }

    pub fn duration_min(&self) -> Option<DurationValue> {
        self.range.map(|r| r.min())
    }

    pub fn duration_max(&self) -> Option<DurationValue> {
        self.range.map(|r| r.max())
    }

    pub fn has_duration(&self) -> bool {
        self.range.is_some()
    }

    /// Whether `value` fits this parameter's envelope. Parameters without a
    /// range never match a duration query.
    pub fn matches_duration(&self, value: &DurationValue, fit_in_units: bool) -> bool {
        self.range
            .is_some_and(|r| r.matches(value, fit_in_units))
    }

    /// Ordering used by every sorted query: group, modality, then range.
    pub(crate) fn cmp_key(&self, other: &Self) -> Ordering {
        let range_key = |p: &Self| {
            p.range
                .map(|r| (r.min().ordering_key(), r.max().ordering_key()))
        };
        self.group
            .cmp(&other.group)
            .then_with(|| self.modality.cmp(&other.modality))
            .then_with(|| range_key(self).cmp(&range_key(other)))
    }
}

impl fmt::Display for InstrumentParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>12}  {:<26}", self.group, self.modality)?;
        if let Some(range) = &self.range {
            write!(
                f,
                " {:>4} {:>5}",
                range.min().to_string(),
                range.max().to_string()
            )?;
        }
        Ok(())
    }
}

/// Owned, de-duplicated collection of parameters for one catalog generation.
#[derive(Clone, Debug, Default)]
pub struct ParameterSet {
    items: Vec<InstrumentParameter>,
    index: FxHashMap<ParameterKey, ParameterId>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every parameter. Ids handed out before the call become dangling.
    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    pub fn get(&self, id: ParameterId) -> Option<&InstrumentParameter> {
        self.items.get(id.0 as usize)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &InstrumentParameter> {
        self.items.iter()
    }

    /// Return the existing parameter with this exact content, or register a new one.
    ///
    /// Duration tokens are optional; an empty string counts as absent, which
    /// is how the venue marks unbounded modalities.
    ///
    /// ```
    /// use contractbook::ParameterSet;
    ///
    /// let mut set = ParameterSet::new();
    /// let a = set.get_or_create("callput", "Rise/Fall", Some("5t"), Some("1d")).unwrap();
    /// let b = set.get_or_create("callput", "Rise/Fall", Some("5t"), Some("1d")).unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn get_or_create(
        &mut self,
        group: &str,
        modality: &str,
        duration_min: Option<&str>,
        duration_max: Option<&str>,
    ) -> Result<ParameterId, CatalogError> {
        if group.trim().is_empty() {
            return Err(CatalogError::InvalidParameterSpec(
                "modality group must not be empty".into(),
            ));
        }
        if modality.trim().is_empty() {
            return Err(CatalogError::InvalidParameterSpec(format!(
                "modality name must not be empty (group {group})"
            )));
        }

        fn present(t: Option<&str>) -> Option<&str> {
            t.filter(|s| !s.is_empty())
        }
        let range = match (present(duration_min), present(duration_max)) {
            (None, None) => None,
            (Some(min), Some(max)) => Some(DurationRange::new(
                DurationValue::parse(min)?,
                DurationValue::parse(max)?,
            )?),
            _ => return Err(CatalogError::AsymmetricDurationRange),
        };

        let key = ParameterKey {
            group: group.to_string(),
            modality: modality.to_string(),
            range,
        };
        if let Some(&id) = self.index.get(&key) {
            return Ok(id);
        }

        let id = ParameterId(self.items.len() as u32);
        self.items.push(InstrumentParameter {
            id,
            group: key.group.clone(),
            modality: key.modality.clone(),
            range,
        });
        self.index.insert(key, id);
        Ok(id)
    }

    fn sorted<'a>(
        &'a self,
        mut pred: impl FnMut(&InstrumentParameter) -> bool,
    ) -> Vec<&'a InstrumentParameter> {
        let mut out: Vec<_> = self.items.iter().filter(|p| pred(p)).collect();
        out.sort_by(|a, b| a.cmp_key(b));
        out
    }

    /// All parameters, sorted.
    pub fn all(&self) -> Vec<&InstrumentParameter> {
        self.sorted(|_| true)
    }

    /// Parameters whose group matches. Substring match unless `restricted`.
    pub fn by_group(&self, pattern: &str, restricted: bool) -> Vec<&InstrumentParameter> {
        self.sorted(|p| text_matches(&p.group, pattern, restricted))
    }

    /// Parameters whose modality name matches. Substring match unless `restricted`.
    pub fn by_modality(&self, pattern: &str, restricted: bool) -> Vec<&InstrumentParameter> {
        self.sorted(|p| text_matches(&p.modality, pattern, restricted))
    }

    /// Parameters whose envelope admits `value`.
    pub fn by_duration(
        &self,
        value: &DurationValue,
        fit_in_units: bool,
    ) -> Vec<&InstrumentParameter> {
        self.sorted(|p| p.matches_duration(value, fit_in_units))
    }

    /// Loose search over group, modality and the rendered envelope.
    pub fn find(&self, pattern: &str) -> Vec<&InstrumentParameter> {
        self.sorted(|p| {
            text_matches(&p.group, pattern, false)
                || text_matches(&p.modality, pattern, false)
                || p.range
                    .is_some_and(|r| text_matches(&r.to_string(), pattern, false))
        })
    }

    /// Distinct group names, sorted.
    pub fn all_groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = self.items.iter().map(|p| p.group.as_str()).collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// Distinct modality names, sorted.
    pub fn all_modalities(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.items.iter().map(|p| p.modality.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
